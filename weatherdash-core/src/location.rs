//! Device position lookup with fallback to a default city.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::{
    fmt::Debug,
    time::{Duration, Instant},
};

use crate::{config::GeolocationConfig, error::GeolocationError, model::Locator};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Position> for Locator {
    fn from(p: Position) -> Self {
        Locator::coordinates(p.latitude, p.longitude)
    }
}

/// Bounds applied to a single position read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(10), maximum_age: Duration::from_secs(60) }
    }
}

impl From<&GeolocationConfig> for GeolocationOptions {
    fn from(cfg: &GeolocationConfig) -> Self {
        Self { timeout: cfg.timeout(), maximum_age: cfg.maximum_age() }
    }
}

/// A source of the device's position.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Position, GeolocationError>;
}

/// Position known up front (CLI flags or config).
#[derive(Debug, Clone, Copy)]
pub struct StaticGeolocator(pub Position);

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn current_position(&self) -> Result<Position, GeolocationError> {
        Ok(self.0)
    }
}

/// No geolocation capability at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocator;

#[async_trait]
impl Geolocator for NoGeolocator {
    async fn current_position(&self) -> Result<Position, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

/// Approximates the position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

impl IpGeolocator {
    pub fn new(url: impl Into<String>) -> Result<Self, GeolocationError> {
        // The resolver enforces the overall bound; this only guards a stuck connection.
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GeolocationError::PositionUnavailable(e.to_string()))?;

        Ok(Self { url: url.into(), http })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(&self) -> Result<Position, GeolocationError> {
        let response = self.http.get(&self.url).send().await.map_err(|e| {
            tracing::debug!("IP lookup request failed: {}", e);
            GeolocationError::PositionUnavailable(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(GeolocationError::PositionUnavailable(format!(
                "IP lookup returned status {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response.json().await.map_err(|e| {
            GeolocationError::PositionUnavailable(format!("IP lookup parse error: {e}"))
        })?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(latitude), Some(longitude)) => Ok(Position { latitude, longitude }),
            _ => Err(GeolocationError::PositionUnavailable(
                body.message.unwrap_or_else(|| "IP lookup returned no position".to_string()),
            )),
        }
    }
}

/// What the resolver decided to fetch, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub locator: Locator,
    /// Set when the position could not be read and the default city is used.
    pub advisory: Option<String>,
}

#[derive(Debug)]
pub struct LocationResolver {
    geolocator: Box<dyn Geolocator>,
    options: GeolocationOptions,
    fallback_city: String,
    cached: Mutex<Option<(Position, Instant)>>,
}

impl LocationResolver {
    pub fn new(
        geolocator: Box<dyn Geolocator>,
        options: GeolocationOptions,
        fallback_city: impl Into<String>,
    ) -> Self {
        Self { geolocator, options, fallback_city: fallback_city.into(), cached: Mutex::new(None) }
    }

    pub fn fallback_city(&self) -> &str {
        &self.fallback_city
    }

    /// One bounded read, reusing a cached position younger than `maximum_age`.
    pub async fn read_position(&self) -> Result<Position, GeolocationError> {
        if let Some((position, captured_at)) = *self.cached.lock() {
            if captured_at.elapsed() <= self.options.maximum_age {
                tracing::debug!(?position, "Reusing cached position");
                return Ok(position);
            }
        }

        let position =
            tokio::time::timeout(self.options.timeout, self.geolocator.current_position())
                .await
                .map_err(|_| GeolocationError::Timeout)??;

        *self.cached.lock() = Some((position, Instant::now()));
        Ok(position)
    }

    /// Prefer the device position; fall back to the default city on any failure.
    pub async fn resolve(&self) -> Resolution {
        match self.read_position().await {
            Ok(position) => {
                tracing::info!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "Resolved device position"
                );
                Resolution { locator: position.into(), advisory: None }
            }
            Err(err) => {
                tracing::warn!(error = %err, fallback = %self.fallback_city, "Geolocation failed");
                Resolution {
                    locator: Locator::named(self.fallback_city.clone()),
                    advisory: Some(err.advisory(&self.fallback_city)),
                }
            }
        }
    }
}

/// Pick the geolocation capability the configuration describes.
pub fn geolocator_from_config(cfg: &GeolocationConfig) -> Box<dyn Geolocator> {
    if let Some((latitude, longitude)) = cfg.fixed_position() {
        return Box::new(StaticGeolocator(Position { latitude, longitude }));
    }

    if cfg.ip_lookup {
        match IpGeolocator::new(cfg.ip_lookup_url.clone()) {
            Ok(ip) => return Box::new(ip),
            Err(e) => tracing::warn!("Failed to create IP geolocator: {}", e),
        }
    }

    Box::new(NoGeolocator)
}
