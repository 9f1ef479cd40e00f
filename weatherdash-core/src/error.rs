use thiserror::Error;

/// Failure of a single provider request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or no response arrived.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("Error {status}: {reason}")]
    Upstream { status: u16, reason: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Wraps a transport error. The URL is stripped because its query carries the API key.
    pub fn network(err: reqwest::Error) -> Self {
        FetchError::Network(err.without_url())
    }

    /// HTTP status of an upstream failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Upstream { status, .. } => Some(*status),
            FetchError::Network(err) => err.status().map(|s| s.as_u16()),
            FetchError::MalformedResponse(_) => None,
        }
    }

    /// Message shown to the user when a weather fetch fails.
    pub fn user_message(&self) -> String {
        format!("Failed to fetch weather data due to {self}. Please try again.")
    }
}

/// Why the device position could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location request timed out")]
    Timeout,
    #[error("location unavailable: {0}")]
    PositionUnavailable(String),
    #[error("geolocation is not supported")]
    Unsupported,
}

impl GeolocationError {
    /// Advisory shown when falling back to the default city.
    pub fn advisory(&self, fallback: &str) -> String {
        let reason = match self {
            GeolocationError::PermissionDenied => "Location access was denied",
            GeolocationError::Timeout => "Finding your location took too long",
            GeolocationError::PositionUnavailable(_) => "Your location could not be determined",
            GeolocationError::Unsupported => "Geolocation is not available",
        };
        format!("{reason}. Showing weather for {fallback} instead.")
    }
}
