use serde::{Deserialize, Serialize};

use crate::error::{WeatherError, WeatherResult};

/// A point on the globe, in decimal degrees.
///
/// No range validation happens here; out-of-range values go to the provider as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial, Units::Standard]
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => "K",
        }
    }

    pub fn speed_suffix(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric | Units::Standard => "m/s",
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" => Ok(Units::Standard),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial, standard."
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider records
//
// Everything the provider may omit is an `Option`. The only shape checks are
// the non-empty `weather` / `list` arrays, enforced in `from_json`.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// One weather-condition descriptor (`weather[]` in the provider JSON).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: Option<u32>,
    /// Short text, e.g. "Rain".
    pub main: Option<String>,
    /// Long text, e.g. "light rain".
    pub description: Option<String>,
    /// Icon code, e.g. "10d".
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Temperatures {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<u32>,
    pub humidity: Option<u32>,
    pub sea_level: Option<u32>,
    pub grnd_level: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: Option<f64>,
    pub deg: Option<u16>,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    pub all: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentSys {
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// Response of the `weather` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherReport {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub coord: Option<GeoPoint>,
    pub base: Option<String>,
    pub cod: Option<u16>,
    pub dt: Option<i64>,
    /// Shift from UTC in seconds.
    pub timezone: Option<i32>,
    pub visibility: Option<u32>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub main: Temperatures,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    #[serde(default)]
    pub sys: CurrentSys,
}

impl CurrentWeatherReport {
    /// Parse and validate a `weather` body.
    pub fn from_json(body: &str) -> WeatherResult<Self> {
        let report: Self = serde_json::from_str(body)
            .map_err(|e| WeatherError::decode("current weather", e))?;

        if report.weather.is_empty() {
            return Err(WeatherError::decode(
                "current weather",
                "no weather condition in response",
            ));
        }

        Ok(report)
    }

    /// Primary condition; the provider lists the most relevant one first.
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn country(&self) -> Option<&str> {
        self.sys.country.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rain {
    /// Volume over the last three hours, in mm.
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSys {
    /// Part of day: "d" or "n".
    pub pod: Option<String>,
}

/// One 3-hour step of the forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub dt: Option<i64>,
    pub dt_txt: Option<String>,
    #[serde(default)]
    pub main: Temperatures,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub clouds: Clouds,
    #[serde(default)]
    pub wind: Wind,
    pub visibility: Option<u32>,
    /// Probability of precipitation, 0.0 to 1.0.
    pub pop: Option<f64>,
    pub rain: Option<Rain>,
    #[serde(default)]
    pub sys: ForecastSys,
}

impl ForecastEntry {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn rain_volume(&self) -> Option<f64> {
        self.rain.as_ref().and_then(|r| r.three_hours)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub country: Option<String>,
    pub coord: Option<GeoPoint>,
    pub population: Option<u64>,
    pub timezone: Option<i32>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// Response of the `forecast` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    #[serde(default)]
    pub city: City,
    pub cnt: Option<u32>,
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

impl ForecastReport {
    /// Parse and validate a `forecast` body.
    pub fn from_json(body: &str) -> WeatherResult<Self> {
        let report: Self =
            serde_json::from_str(body).map_err(|e| WeatherError::decode("forecast", e))?;

        if report.list.is_empty() {
            return Err(WeatherError::decode("forecast", "forecast list is empty"));
        }

        Ok(report)
    }
}
