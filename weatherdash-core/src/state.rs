//! Dashboard state and its transitions.
//!
//! Every fetch cycle gets a generation number when it starts. Results carry that number
//! back, and anything from an older generation is dropped, so a slow response can never
//! overwrite the result of a newer search.

use serde::{Deserialize, Serialize};

use crate::model::{ForecastSeries, Locator, UnitSystem, WeatherSnapshot};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardState {
    /// Generation of the most recently started fetch cycle.
    pub generation: u64,
    /// Place of the displayed snapshot; unit toggles refetch it.
    pub locator: Option<Locator>,
    pub units: UnitSystem,
    pub snapshot: Option<WeatherSnapshot>,
    pub forecast: ForecastSeries,
    /// Weather request outstanding.
    pub loading: bool,
    /// Forecast request outstanding.
    pub forecast_loading: bool,
    /// User-visible error of the last cycle.
    pub error: Option<String>,
    /// Developer-facing reason the forecast is missing.
    pub forecast_error: Option<String>,
    /// Non-fatal notice, e.g. the geolocation fallback.
    pub advisory: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    FetchStarted,
    WeatherLoaded { generation: u64, snapshot: WeatherSnapshot },
    WeatherFailed { generation: u64, message: String },
    ForecastLoaded { generation: u64, series: ForecastSeries },
    ForecastFailed { generation: u64, reason: String },
    UnitsToggled,
    AdvisorySet(Option<String>),
}

impl DashboardState {
    pub fn new(units: UnitSystem) -> Self {
        Self { units, forecast: ForecastSeries::empty(units), ..Default::default() }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Either request of the current cycle is still outstanding.
    pub fn is_busy(&self) -> bool {
        self.loading || self.forecast_loading
    }

    /// Apply `event`, returning the next state. Results of stale generations are ignored.
    pub fn reduce(&self, event: Event) -> Self {
        let mut next = self.clone();

        match event {
            Event::FetchStarted => {
                next.generation = self.generation + 1;
                next.loading = true;
                next.forecast_loading = false;
                next.error = None;
            }
            Event::WeatherLoaded { generation, snapshot } => {
                if !self.is_current(generation) {
                    return next;
                }
                // The provider's place name, even for coordinate lookups, is what later
                // fetches reuse. A failed search never replaces it.
                next.locator = Some(Locator::named(snapshot.location_name.clone()));
                next.forecast = ForecastSeries::empty(snapshot.units);
                next.snapshot = Some(snapshot);
                next.loading = false;
                next.forecast_loading = true;
                next.forecast_error = None;
            }
            Event::WeatherFailed { generation, message } => {
                if !self.is_current(generation) {
                    return next;
                }
                next.loading = false;
                next.forecast_loading = false;
                next.error = Some(message);
            }
            Event::ForecastLoaded { generation, series } => {
                if !self.is_current(generation) {
                    return next;
                }
                next.forecast = series;
                next.forecast_loading = false;
            }
            Event::ForecastFailed { generation, reason } => {
                if !self.is_current(generation) {
                    return next;
                }
                next.forecast_loading = false;
                next.forecast_error = Some(reason);
            }
            Event::UnitsToggled => {
                next.units = self.units.toggled();
            }
            Event::AdvisorySet(advisory) => {
                next.advisory = advisory;
            }
        }

        next
    }
}
