use parking_lot::Mutex;

use crate::{
    location::LocationResolver,
    model::{Locator, UnitSystem},
    provider::WeatherProvider,
    state::{DashboardState, Event},
};

/// Drives fetch cycles and owns the dashboard state.
///
/// Methods take `&self` so several cycles may be in flight at once; only the newest one
/// is allowed to change what is displayed.
#[derive(Debug)]
pub struct Dashboard {
    provider: Box<dyn WeatherProvider>,
    resolver: LocationResolver,
    state: Mutex<DashboardState>,
}

impl Dashboard {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        resolver: LocationResolver,
        units: UnitSystem,
    ) -> Self {
        Self { provider, resolver, state: Mutex::new(DashboardState::new(units)) }
    }

    pub fn state(&self) -> DashboardState {
        self.state.lock().clone()
    }

    fn dispatch(&self, event: Event) -> DashboardState {
        let mut state = self.state.lock();
        *state = state.reduce(event);
        state.clone()
    }

    /// Startup: locate the device, or fall back to the default city.
    pub async fn start(&self) -> DashboardState {
        self.use_my_location().await
    }

    pub async fn use_my_location(&self) -> DashboardState {
        let resolution = self.resolver.resolve().await;
        self.dispatch(Event::AdvisorySet(resolution.advisory));
        self.fetch(resolution.locator).await
    }

    /// Blank input is ignored.
    pub async fn search(&self, city: &str) -> DashboardState {
        let city = city.trim();
        if city.is_empty() {
            return self.state();
        }

        self.dispatch(Event::AdvisorySet(None));
        self.fetch(Locator::named(city)).await
    }

    /// Flip the unit system and, if something is displayed, fetch that place again in the
    /// new units. A search that failed since then does not change what is refetched.
    pub async fn toggle_units(&self) -> DashboardState {
        let state = self.dispatch(Event::UnitsToggled);
        tracing::info!(units = %state.units, "Unit system toggled");

        match (&state.snapshot, state.locator) {
            (Some(_), Some(locator)) => self.fetch(locator).await,
            _ => self.state(),
        }
    }

    /// One cycle: current conditions, then the forecast for the same locator.
    pub async fn fetch(&self, locator: Locator) -> DashboardState {
        let started = self.dispatch(Event::FetchStarted);
        let generation = started.generation;
        let units = started.units;

        tracing::debug!(%locator, %units, generation, "Fetch cycle started");

        let snapshot = match self.provider.current(&locator, units).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(
                    %locator,
                    error = %err,
                    status = ?err.status(),
                    generation,
                    "Weather fetch failed"
                );
                return self.dispatch(Event::WeatherFailed {
                    generation,
                    message: err.user_message(),
                });
            }
        };

        tracing::info!(
            city = %snapshot.location_name,
            temp = snapshot.temperature,
            generation,
            "Weather data fetched"
        );

        let state = self.dispatch(Event::WeatherLoaded { generation, snapshot });
        if !state.is_current(generation) {
            tracing::debug!(generation, current = state.generation, "Discarding superseded cycle");
            return state;
        }

        match self.provider.forecast(&locator, units).await {
            Ok(series) => {
                tracing::debug!(points = series.len(), generation, "Forecast fetched");
                self.dispatch(Event::ForecastLoaded { generation, series })
            }
            Err(err) => {
                tracing::warn!(
                    %locator,
                    error = %err,
                    status = ?err.status(),
                    generation,
                    "Error fetching forecast"
                );
                self.dispatch(Event::ForecastFailed { generation, reason: err.to_string() })
            }
        }
    }
}
