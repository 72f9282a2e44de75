//! Core library for `city-weather`.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Query resolution (pass-through or language-model assisted)
//! - The OpenWeather provider behind the [`WeatherProvider`] trait
//! - Forecast aggregation into a display-ready [`WeatherView`]
//!
//! It is used by the `city-weather` web server and CLI.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod resolver;

pub use aggregator::ForecastAggregator;
pub use config::{Config, ProviderConfig};
pub use error::WeatherError;
pub use model::{ForecastDay, GeoCandidate, GeoQuery, WeatherView};
pub use provider::{ProviderId, WeatherProvider};
pub use resolver::{CityResolver, Resolution, ResolverKind};
