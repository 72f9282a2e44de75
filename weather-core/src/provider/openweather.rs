use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::fmt;

use crate::{
    WeatherError,
    config::UpstreamConfig,
    model::{Coordinates, CurrentConditions, ForecastSample, GeoCandidate, GeoQuery},
};

use super::WeatherProvider;

const SERVICE: &str = "openweather";
const GEOCODE_PATH: &str = "/geo/1.0/direct";
const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const GEOCODE_LIMIT: &str = "3";
const DT_TXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, upstream: &UpstreamConfig) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(upstream.timeout())
            .build()
            .map_err(|e| WeatherError::from_transport(SERVICE, e))?;

        Ok(Self {
            api_key,
            base_url: upstream.openweather_base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| WeatherError::from_transport(SERVICE, e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::from_transport(SERVICE, e))?;

        if !status.is_success() {
            tracing::warn!(%status, path, "OpenWeather request failed");
            return Err(WeatherError::UpstreamUnavailable {
                service: SERVICE,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        tracing::debug!(path, bytes = body.len(), "OpenWeather response received");

        serde_json::from_str(&body).map_err(|e| WeatherError::UpstreamData {
            service: SERVICE,
            detail: format!("{path}: {e}"),
        })
    }

    async fn get_at<T: DeserializeOwned>(
        &self,
        path: &str,
        at: Coordinates,
    ) -> Result<T, WeatherError> {
        let lat = at.lat.to_string();
        let lon = at.lon.to_string();
        self.get_json(
            path,
            &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", "metric")],
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

impl From<OwGeoEntry> for GeoCandidate {
    fn from(entry: OwGeoEntry) -> Self {
        GeoCandidate {
            name: entry.name,
            country: entry.country,
            state: entry.state,
            coordinates: Coordinates { lat: entry.lat, lon: entry.lon },
        }
    }
}

impl From<OwCurrentResponse> for CurrentConditions {
    fn from(parsed: OwCurrentResponse) -> Self {
        CurrentConditions {
            temp: parsed.main.temp.round() as i64,
            temp_min: parsed.main.temp_min.round() as i64,
            temp_max: parsed.main.temp_max.round() as i64,
            condition: primary_condition(&parsed.weather),
            wind_speed_mps: parsed.wind.speed,
            utc_offset_secs: parsed.timezone,
        }
    }
}

impl TryFrom<OwForecastEntry> for ForecastSample {
    type Error = WeatherError;

    fn try_from(entry: OwForecastEntry) -> Result<Self, Self::Error> {
        let timestamp = NaiveDateTime::parse_from_str(&entry.dt_txt, DT_TXT_FORMAT).map_err(|e| {
            WeatherError::UpstreamData {
                service: SERVICE,
                detail: format!("bad forecast timestamp '{}': {e}", entry.dt_txt),
            }
        })?;

        Ok(ForecastSample {
            timestamp,
            temp: entry.main.temp,
            condition: primary_condition(&entry.weather),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode(&self, query: &GeoQuery) -> Result<Vec<GeoCandidate>, WeatherError> {
        let q = query.as_param();
        let entries: Vec<OwGeoEntry> = self
            .get_json(GEOCODE_PATH, &[("q", q.as_str()), ("limit", GEOCODE_LIMIT)])
            .await?;

        Ok(entries.into_iter().map(GeoCandidate::from).collect())
    }

    async fn current(&self, at: Coordinates) -> Result<CurrentConditions, WeatherError> {
        let parsed: OwCurrentResponse = self.get_at(CURRENT_PATH, at).await?;
        Ok(parsed.into())
    }

    async fn forecast(&self, at: Coordinates) -> Result<Vec<ForecastSample>, WeatherError> {
        let parsed: OwForecastResponse = self.get_at(FORECAST_PATH, at).await?;
        parsed.list.into_iter().map(ForecastSample::try_from).collect()
    }
}

fn primary_condition(weather: &[OwWeather]) -> String {
    weather
        .first()
        .map(|w| w.main.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
