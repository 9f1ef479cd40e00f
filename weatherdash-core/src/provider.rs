use crate::{
    Config, FetchError,
    model::{ForecastSeries, Locator, UnitSystem, WeatherSnapshot},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Provider steps are 3 hours apart, so every 8th reading is ~24h later.
pub const FORECAST_STRIDE: usize = 8;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for `locator`, converted by the provider into `units`.
    async fn current(
        &self,
        locator: &Locator,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, FetchError>;

    /// Multi-day forecast for `locator`, already downsampled to one point per day.
    async fn forecast(
        &self,
        locator: &Locator,
        units: UnitSystem,
    ) -> Result<ForecastSeries, FetchError>;
}

/// Keep indices 0, 8, 16, ... of a 3-hourly series.
///
/// Positional, not calendar-aware: a series starting mid-day yields mid-day points.
pub fn downsample_daily<T>(readings: Vec<T>) -> Vec<T> {
    readings.into_iter().step_by(FORECAST_STRIDE).collect()
}

/// Construct the OpenWeather client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `weatherdash configure` or set WEATHERDASH_API_KEY."
        )
    })?;

    let client = OpenWeatherClient::new(api_key.to_owned())?.with_base_url(&config.base_url);

    Ok(client)
}
