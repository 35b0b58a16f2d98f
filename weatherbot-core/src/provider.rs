use crate::{
    Config, WeatherError, WeatherResult, provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Source of current weather for a city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Looks up current conditions for `city`.
    ///
    /// A blank `city` is replaced by the provider's configured default city.
    async fn fetch(&self, city: &str) -> Result<WeatherResult, WeatherError>;
}

/// Construct the OpenWeather provider from config.
///
/// A missing API key is not an error here; lookups report
/// [`WeatherError::NotConfigured`] instead.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let client = OpenWeatherClient::new(&config.weather)?;

    if !config.is_weather_configured() {
        tracing::warn!("WEATHER_API_KEY is not set, weather replies will be unavailable");
    }

    Ok(Arc::new(client))
}
