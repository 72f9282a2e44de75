use crate::{
    Config, WeatherError,
    model::{Coordinates, CurrentConditions, ForecastSample, GeoCandidate, GeoQuery},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod openweather;

/// Upstream services that need credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    OpenAi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenAi => "openai",
        }
    }

    /// Environment variable that overrides the stored API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OWM_API_KEY",
            ProviderId::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenAi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "openai" => Ok(ProviderId::OpenAi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, openai."
            )),
        }
    }
}

/// Geocoding, current conditions and the 3-hour forecast series.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// All candidate matches, best first. An empty list means no match.
    async fn geocode(&self, query: &GeoQuery) -> Result<Vec<GeoCandidate>, WeatherError>;

    async fn current(&self, at: Coordinates) -> Result<CurrentConditions, WeatherError>;

    async fn forecast(&self, at: Coordinates) -> Result<Vec<ForecastSample>, WeatherError>;
}

/// Construct the weather provider from config.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>, WeatherError> {
    let api_key = config
        .provider_api_key(ProviderId::OpenWeather)
        .ok_or(WeatherError::MissingCredentials(ProviderId::OpenWeather))?;

    let provider = OpenWeatherProvider::new(api_key.to_owned(), &config.upstream)?;
    Ok(Box::new(provider))
}
