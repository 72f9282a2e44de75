use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A city lookup, optionally pinned to an ISO 3166 country code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoQuery {
    pub city: String,
    pub country: Option<String>,
}

impl GeoQuery {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into(), country: None }
    }

    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = country
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty());
        self
    }

    /// The `q` parameter sent to the geocoder, e.g. `Paris` or `Paris,FR`.
    pub fn as_param(&self) -> String {
        match &self.country {
            Some(country) => format!("{},{}", self.city, country),
            None => self.city.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCandidate {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub coordinates: Coordinates,
}

impl GeoCandidate {
    /// `Springfield, Illinois, US` style label.
    pub fn label(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: i64,
    pub temp_min: i64,
    pub temp_max: i64,
    pub condition: String,
    pub wind_speed_mps: f64,
    /// Shift from UTC in seconds at the observed location.
    pub utc_offset_secs: i32,
}

/// A single 3-hour forecast entry, timestamped in UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub timestamp: NaiveDateTime,
    pub temp: f64,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub weekday: String,
    pub date: chrono::NaiveDate,
    pub temp: i64,
    pub condition: String,
}

/// Everything the city page shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherView {
    pub city_name: String,
    pub current_date: String,
    pub current_temp: i64,
    pub current_weather: String,
    pub min_temp: i64,
    pub max_temp: i64,
    pub wind_speed: f64,
    pub five_day_forecast: Vec<ForecastDay>,
    pub location: GeoCandidate,
    pub alternatives: Vec<GeoCandidate>,
}
