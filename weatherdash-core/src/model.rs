use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Raw epoch values at or above this magnitude are read as milliseconds.
///
/// 1e11 seconds is the year 5138, 1e11 milliseconds is March 1973.
pub const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Display and request unit system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Value sent as the provider's `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Metric => UnitSystem::Imperial,
            UnitSystem::Imperial => UnitSystem::Metric,
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn wind_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial]
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(UnitSystem::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported unit systems: metric, imperial."
            )),
        }
    }
}

/// What a fetch cycle asks the provider about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Locator {
    Named(String),
    Coordinates { latitude: f64, longitude: f64 },
}

impl Locator {
    pub fn named(name: impl Into<String>) -> Self {
        Locator::Named(name.into())
    }

    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        Locator::Coordinates { latitude, longitude }
    }

    /// Provider query parameters identifying this locator.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Locator::Named(name) => vec![("q", name.clone())],
            Locator::Coordinates { latitude, longitude } => {
                vec![("lat", latitude.to_string()), ("lon", longitude.to_string())]
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Named(name) => f.write_str(name),
            Locator::Coordinates { latitude, longitude } => {
                write!(f, "{latitude:.4}, {longitude:.4}")
            }
        }
    }
}

/// Epoch timestamp that knows its own unit.
///
/// Equality and ordering compare the instant, not the representation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Timestamp {
    Seconds(i64),
    Millis(i64),
}

impl Timestamp {
    /// Classify an untyped epoch number by magnitude.
    pub fn from_raw(raw: i64) -> Self {
        if raw.unsigned_abs() >= MILLIS_THRESHOLD.unsigned_abs() {
            Timestamp::Millis(raw)
        } else {
            Timestamp::Seconds(raw)
        }
    }

    pub fn now() -> Self {
        Timestamp::Millis(Utc::now().timestamp_millis())
    }

    pub fn as_millis(&self) -> i64 {
        match *self {
            Timestamp::Seconds(s) => s.saturating_mul(1000),
            Timestamp::Millis(ms) => ms,
        }
    }

    /// `None` when the value is outside chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.as_millis())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::Millis(value.timestamp_millis())
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.as_millis() == other.as_millis()
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_millis().cmp(&other.as_millis())
    }
}

/// Current conditions for one location, as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Primary condition label, e.g. "Clouds".
    pub condition: String,
    pub icon: String,
    pub description: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub sunrise: Timestamp,
    pub sunset: Timestamp,
    /// Shift in seconds from UTC at the location.
    pub utc_offset_secs: i32,
    /// Unit system the provider converted the values into.
    pub units: UnitSystem,
}

impl WeatherSnapshot {
    /// Wall-clock offset at the location; `None` if the provider sent an impossible value.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: Timestamp,
    pub temperature: f64,
    pub feels_like: f64,
    pub condition: String,
    pub icon: String,
    pub description: String,
}

/// Downsampled forecast, one point per ~24h.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub units: UnitSystem,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn empty(units: UnitSystem) -> Self {
        Self { units, points: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn snapshot_with_offset(utc_offset_secs: i32) -> WeatherSnapshot {
        WeatherSnapshot {
            location_name: "San Francisco".to_string(),
            country: "US".to_string(),
            latitude: 37.77,
            longitude: -122.42,
            condition: "Clear".to_string(),
            icon: "01d".to_string(),
            description: "clear sky".to_string(),
            temperature: 15.0,
            feels_like: 14.0,
            humidity_pct: 60,
            wind_speed: 2.0,
            sunrise: Timestamp::Seconds(1_700_000_000),
            sunset: Timestamp::Seconds(1_700_040_000),
            utc_offset_secs,
            units: UnitSystem::Metric,
        }
    }

    #[test]
    fn utc_offset_shifts_local_clock() {
        let offset = snapshot_with_offset(-28_800).utc_offset().unwrap();
        assert_eq!(offset, FixedOffset::west_opt(8 * 3600).unwrap());

        let local = offset.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(local.format("%H:%M").to_string(), "14:13");
    }

    #[test]
    fn out_of_range_utc_offset_is_none() {
        assert!(snapshot_with_offset(90_000).utc_offset().is_none());
    }

    #[test]
    fn unit_system_as_str_roundtrip() {
        for units in UnitSystem::all() {
            let parsed = UnitSystem::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn unknown_unit_system_error() {
        let err = UnitSystem::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn toggling_twice_is_identity() {
        assert_eq!(UnitSystem::Metric.toggled(), UnitSystem::Imperial);
        assert_eq!(UnitSystem::Metric.toggled().toggled(), UnitSystem::Metric);
    }

    #[test]
    fn named_locator_queries_by_name() {
        let pairs = Locator::named("New York").query_pairs();
        assert_eq!(pairs, vec![("q", "New York".to_string())]);
    }

    #[test]
    fn coordinate_locator_queries_lat_lon() {
        let pairs = Locator::coordinates(51.5, -0.12).query_pairs();
        assert_eq!(pairs, vec![("lat", "51.5".to_string()), ("lon", "-0.12".to_string())]);
    }

    #[test]
    fn raw_seconds_and_millis_resolve_to_same_instant() {
        let secs = Timestamp::from_raw(1_700_000_000);
        let millis = Timestamp::from_raw(1_700_000_000_000);

        assert!(matches!(secs, Timestamp::Seconds(1_700_000_000)));
        assert!(matches!(millis, Timestamp::Millis(1_700_000_000_000)));
        assert_eq!(secs, millis);
        assert_eq!(secs.to_datetime(), millis.to_datetime());
        assert_eq!(secs.to_datetime().map(|d| d.year()), Some(2023));
    }

    #[test]
    fn timestamps_compare_across_units() {
        assert!(Timestamp::Seconds(10) < Timestamp::Millis(10_001));
        assert_eq!(Timestamp::Seconds(10), Timestamp::Millis(10_000));
    }
}
