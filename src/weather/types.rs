use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitsMode {
    #[default]
    Metric,
    Imperial,
}

impl UnitsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitsMode::Metric => "metric",
            UnitsMode::Imperial => "imperial",
        }
    }

    pub fn temp_unit(&self) -> &'static str {
        match self {
            UnitsMode::Metric => "°C",
            UnitsMode::Imperial => "°F",
        }
    }

    pub fn wind_unit(&self) -> &'static str {
        match self {
            UnitsMode::Metric => "m/s",
            UnitsMode::Imperial => "mph",
        }
    }
}

impl fmt::Display for UnitsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metric" => Ok(UnitsMode::Metric),
            "imperial" => Ok(UnitsMode::Imperial),
            other => Err(format!(
                "Invalid units: {}. Must be 'metric' or 'imperial'",
                other
            )),
        }
    }
}

// Normalized records returned to callers

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeather {
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub local_time_iso: String,
    pub timezone_offset: i32,
    pub temp: f64,
    pub feels_like: f64,
    pub temp_unit: String,
    pub humidity: f64,
    pub pressure: f64,
    pub visibility_km: u32,
    pub wind_speed: f64,
    pub wind_deg: f64,
    pub wind_unit: String,
    pub description: String,
    pub icon: String,
    pub sunrise_iso: Option<String>,
    pub sunset_iso: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub ts_iso: String,
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub temp_unit: String,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_unit: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub temp_unit: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedForecast {
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub timezone_offset: i32,
    pub points: Vec<ForecastPoint>,
    pub daily: Vec<DailyForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLocation {
    pub name: String,
    pub country: String,
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAirQuality {
    pub aqi: u8,
    pub aqi_description: String,
    pub pm2_5: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    pub co: f64,
    pub so2: f64,
}

// OpenWeatherMap payloads. Fields without `default` are required.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwWeatherCondition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwCurrentMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    #[serde(default)]
    pub pressure: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwWind {
    pub speed: f64,
    #[serde(default)]
    pub deg: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwCurrentSys {
    pub country: String,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwCurrentResponse {
    pub name: String,
    pub dt: i64,
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub coord: OwCoord,
    pub main: OwCurrentMain,
    pub wind: OwWind,
    pub weather: Vec<OwWeatherCondition>,
    pub sys: OwCurrentSys,
    #[serde(default)]
    pub visibility: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwForecastMain {
    pub temp: f64,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    #[serde(default)]
    pub humidity: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwForecastWind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwForecastItem {
    pub dt: i64,
    pub main: OwForecastMain,
    pub weather: Vec<OwWeatherCondition>,
    #[serde(default)]
    pub wind: OwForecastWind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwForecastCity {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub coord: OwCoord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwForecastResponse {
    pub city: OwForecastCity,
    pub list: Vec<OwForecastItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwGeocodeEntry {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwAirMain {
    pub aqi: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OwAirComponents {
    pub pm2_5: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    pub co: f64,
    pub so2: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwAirItem {
    pub main: OwAirMain,
    #[serde(default)]
    pub components: OwAirComponents,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwAirPollutionResponse {
    pub list: Vec<OwAirItem>,
}
