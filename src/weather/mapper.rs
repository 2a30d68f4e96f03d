use super::types::*;
use crate::utils::{round_to_decimals, title_case};
use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Most days a forecast aggregate will report.
pub const MAX_DAILY_ENTRIES: usize = 7;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Unexpected upstream payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Upstream payload is missing {0}")]
    MissingField(&'static str),
    #[error("Invalid timestamp {0} with offset {1}s")]
    InvalidTimestamp(i64, i32),
}

fn decode<T: DeserializeOwned>(raw: &Value) -> Result<T, MappingError> {
    Ok(T::deserialize(raw)?)
}

/// Expresses a Unix timestamp in the given fixed UTC offset.
pub fn localize_timestamp(
    timestamp: i64,
    offset_secs: i32,
) -> Result<DateTime<FixedOffset>, MappingError> {
    let offset = FixedOffset::east_opt(offset_secs)
        .ok_or(MappingError::InvalidTimestamp(timestamp, offset_secs))?;
    let utc = DateTime::from_timestamp(timestamp, 0)
        .ok_or(MappingError::InvalidTimestamp(timestamp, offset_secs))?;
    Ok(utc.with_timezone(&offset))
}

pub fn to_local_iso(timestamp: i64, offset_secs: i32) -> Result<String, MappingError> {
    Ok(localize_timestamp(timestamp, offset_secs)?.to_rfc3339())
}

fn primary_condition<'a>(
    conditions: &'a [OwWeatherCondition],
    field: &'static str,
) -> Result<&'a OwWeatherCondition, MappingError> {
    conditions.first().ok_or(MappingError::MissingField(field))
}

fn metres_to_whole_km(metres: f64) -> u32 {
    (metres / 1000.0).floor().max(0.0) as u32
}

pub fn map_current_weather(raw: &Value, units: UnitsMode) -> Result<NormalizedWeather, MappingError> {
    let data: OwCurrentResponse = decode(raw)?;
    let condition = primary_condition(&data.weather, "weather[0]")?;

    let sunrise_iso = data
        .sys
        .sunrise
        .map(|ts| to_local_iso(ts, data.timezone))
        .transpose()?;
    let sunset_iso = data
        .sys
        .sunset
        .map(|ts| to_local_iso(ts, data.timezone))
        .transpose()?;

    Ok(NormalizedWeather {
        city: data.name,
        country: data.sys.country,
        lat: data.coord.lat,
        lon: data.coord.lon,
        local_time_iso: to_local_iso(data.dt, data.timezone)?,
        timezone_offset: data.timezone,
        temp: round_to_decimals(data.main.temp, 1),
        feels_like: round_to_decimals(data.main.feels_like, 1),
        temp_unit: units.temp_unit().to_string(),
        humidity: data.main.humidity,
        pressure: data.main.pressure,
        visibility_km: metres_to_whole_km(data.visibility),
        wind_speed: round_to_decimals(data.wind.speed, 1),
        wind_deg: data.wind.deg,
        wind_unit: units.wind_unit().to_string(),
        description: title_case(&condition.description),
        icon: condition.icon.clone(),
        sunrise_iso,
        sunset_iso,
    })
}

pub fn map_forecast(raw: &Value, units: UnitsMode) -> Result<NormalizedForecast, MappingError> {
    let data: OwForecastResponse = decode(raw)?;
    let offset = data.city.timezone;

    let mut points = Vec::with_capacity(data.list.len());
    let mut dates = Vec::with_capacity(data.list.len());
    for item in &data.list {
        let condition = primary_condition(&item.weather, "list[].weather[0]")?;
        let local = localize_timestamp(item.dt, offset)?;
        let temp = round_to_decimals(item.main.temp, 1);

        points.push(ForecastPoint {
            ts_iso: local.to_rfc3339(),
            temp,
            temp_min: item.main.temp_min.map_or(temp, |t| round_to_decimals(t, 1)),
            temp_max: item.main.temp_max.map_or(temp, |t| round_to_decimals(t, 1)),
            temp_unit: units.temp_unit().to_string(),
            humidity: item.main.humidity,
            wind_speed: round_to_decimals(item.wind.speed, 1),
            wind_unit: units.wind_unit().to_string(),
            description: title_case(&condition.description),
            icon: condition.icon.clone(),
        });
        dates.push(local.date_naive().format("%Y-%m-%d").to_string());
    }

    let daily = aggregate_daily(&points, &dates, units);

    Ok(NormalizedForecast {
        city: data.city.name,
        country: data.city.country,
        lat: data.city.coord.lat,
        lon: data.city.coord.lon,
        timezone_offset: offset,
        points,
        daily,
    })
}

/// Folds points into one entry per local calendar date, in the order dates
/// first appear. Icon and description come from the first point of the day.
fn aggregate_daily(points: &[ForecastPoint], dates: &[String], units: UnitsMode) -> Vec<DailyForecast> {
    let mut daily: Vec<DailyForecast> = Vec::new();

    for (point, date) in points.iter().zip(dates) {
        match daily.iter_mut().find(|day| &day.date == date) {
            Some(day) => {
                day.temp_min = day.temp_min.min(point.temp_min);
                day.temp_max = day.temp_max.max(point.temp_max);
            }
            None => daily.push(DailyForecast {
                date: date.clone(),
                temp_min: point.temp_min,
                temp_max: point.temp_max,
                temp_unit: units.temp_unit().to_string(),
                description: point.description.clone(),
                icon: point.icon.clone(),
            }),
        }
    }

    daily.truncate(MAX_DAILY_ENTRIES);
    daily
}

pub fn display_name(name: &str, state: &str, country: &str) -> String {
    if state.is_empty() {
        format!("{} {}", name, country)
    } else {
        format!("{}, {} {}", name, state, country)
    }
}

pub fn map_locations(raw: &Value) -> Result<Vec<NormalizedLocation>, MappingError> {
    let entries: Vec<OwGeocodeEntry> = decode(raw)?;

    Ok(entries
        .into_iter()
        .map(|entry| {
            let state = entry.state.unwrap_or_default();
            NormalizedLocation {
                display_name: display_name(&entry.name, &state, &entry.country),
                name: entry.name,
                country: entry.country,
                state,
                lat: entry.lat,
                lon: entry.lon,
            }
        })
        .collect())
}

pub fn aqi_description(aqi: u8) -> &'static str {
    match aqi {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}

pub fn map_air_quality(raw: &Value) -> Result<NormalizedAirQuality, MappingError> {
    let data: OwAirPollutionResponse = decode(raw)?;
    let reading = data
        .list
        .into_iter()
        .next()
        .ok_or(MappingError::MissingField("list[0]"))?;
    let c = reading.components;

    Ok(NormalizedAirQuality {
        aqi: reading.main.aqi,
        aqi_description: aqi_description(reading.main.aqi).to_string(),
        pm2_5: c.pm2_5,
        pm10: c.pm10,
        no2: c.no2,
        o3: c.o3,
        co: c.co,
        so2: c.so2,
    })
}
