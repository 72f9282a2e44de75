use std::sync::Arc;

use city_weather_core::{
    CityResolver, Config, ForecastAggregator, resolver::resolver_from_config,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<dyn CityResolver>,
    pub aggregator: Arc<ForecastAggregator>,
}

impl AppState {
    pub fn new(resolver: Arc<dyn CityResolver>, aggregator: ForecastAggregator) -> Self {
        Self { resolver, aggregator: Arc::new(aggregator) }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let resolver = resolver_from_config(config)?;
        let aggregator = ForecastAggregator::from_config(config)?;
        Ok(Self::new(Arc::from(resolver), aggregator))
    }
}
