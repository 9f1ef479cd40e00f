//! Core library for the `weatherdash` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client and the provider seam used by tests
//! - Location resolution with a default-city fallback
//! - Dashboard state, its reducer, and the fetch cycle that drives it
//! - Pure presentation helpers (units, times, backgrounds)
//!
//! It is used by `weatherdash-cli`, but any other front end can drive a [`Dashboard`] the same way.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod location;
pub mod model;
pub mod present;
pub mod provider;
pub mod state;

pub use config::{Config, GeolocationConfig};
pub use dashboard::Dashboard;
pub use error::{FetchError, GeolocationError};
pub use location::{Geolocator, LocationResolver, Resolution};
pub use model::{ForecastPoint, ForecastSeries, Locator, Timestamp, UnitSystem, WeatherSnapshot};
pub use provider::{WeatherProvider, openweather::OpenWeatherClient, provider_from_config};
pub use state::{DashboardState, Event};
