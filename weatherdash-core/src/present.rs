//! Pure transforms from fetched weather into display values.

use chrono::TimeZone;
use serde::Serialize;
use std::fmt::Display;

use crate::model::{ForecastSeries, Timestamp, UnitSystem, WeatherSnapshot};

/// `"18°C"`; rounds half away from zero.
pub fn format_temperature(value: f64, units: UnitSystem) -> String {
    format!("{}{}", value.round() as i64, units.temperature_suffix())
}

/// The provider already converted the speed; only the label depends on `units`.
pub fn format_wind(speed: f64, units: UnitSystem) -> String {
    format!("{speed} {}", units.wind_suffix())
}

pub fn format_humidity(pct: u8) -> String {
    format!("{pct}%")
}

/// Wall-clock `HH:MM` in `tz`. Empty when the timestamp is out of range.
pub fn format_clock<Tz>(ts: Timestamp, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.to_datetime()
        .map(|dt| dt.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_default()
}

/// `"Tue, Nov 14"` in `tz`.
pub fn format_date<Tz>(ts: Timestamp, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.to_datetime()
        .map(|dt| dt.with_timezone(tz).format("%a, %b %-d").to_string())
        .unwrap_or_default()
}

/// `"Tue"` in `tz`.
pub fn format_weekday<Tz>(ts: Timestamp, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.to_datetime()
        .map(|dt| dt.with_timezone(tz).format("%a").to_string())
        .unwrap_or_default()
}

pub fn icon_url(icon_base_url: &str, icon: &str) -> String {
    format!("{}/{icon}@2x.png", icon_base_url.trim_end_matches('/'))
}

/// Strictly between sunrise and sunset.
pub fn is_daytime(now: Timestamp, sunrise: Timestamp, sunset: Timestamp) -> bool {
    sunrise < now && now < sunset
}

/// Condition families that have their own backgrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Clear,
    Clouds,
    Rain,
    Thunderstorm,
    Snow,
    Mist,
}

impl ConditionKind {
    /// Keyword match on the provider's condition label.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        // Thunderstorm labels can mention rain, so it is checked first.
        const KEYWORDS: &[(&str, ConditionKind)] = &[
            ("thunder", ConditionKind::Thunderstorm),
            ("snow", ConditionKind::Snow),
            ("sleet", ConditionKind::Snow),
            ("rain", ConditionKind::Rain),
            ("drizzle", ConditionKind::Rain),
            ("mist", ConditionKind::Mist),
            ("fog", ConditionKind::Mist),
            ("haze", ConditionKind::Mist),
            ("smoke", ConditionKind::Mist),
            ("cloud", ConditionKind::Clouds),
            ("clear", ConditionKind::Clear),
        ];

        KEYWORDS
            .iter()
            .find(|(keyword, _)| label.contains(keyword))
            .map(|(_, kind)| *kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gradient {
    pub name: &'static str,
    pub stops: &'static [&'static str],
}

impl Gradient {
    pub fn css(&self) -> String {
        format!("linear-gradient(to bottom, {})", self.stops.join(", "))
    }
}

pub const SUNNY_DAY: Gradient =
    Gradient { name: "sunny-day", stops: &["#47BFDF", "#4A91FF", "#FFD86F"] };
pub const CLEAR_NIGHT: Gradient =
    Gradient { name: "clear-night", stops: &["#0F2027", "#203A43", "#2C5364"] };
pub const CLOUDY_DAY: Gradient = Gradient { name: "cloudy-day", stops: &["#8E9EAB", "#C5D1DB"] };
pub const CLOUDY_NIGHT: Gradient =
    Gradient { name: "cloudy-night", stops: &["#232526", "#414345"] };
pub const RAINY_DAY: Gradient =
    Gradient { name: "rainy-day", stops: &["#4B6CB7", "#7A8BA6", "#A1B5C8"] };
pub const RAINY_NIGHT: Gradient = Gradient { name: "rainy-night", stops: &["#141E30", "#243B55"] };
pub const STORMY_DAY: Gradient = Gradient { name: "stormy-day", stops: &["#373B44", "#4286F4"] };
pub const STORMY_NIGHT: Gradient =
    Gradient { name: "stormy-night", stops: &["#0F0C29", "#302B63", "#24243E"] };
pub const SNOWY_DAY: Gradient =
    Gradient { name: "snowy-day", stops: &["#E6DADA", "#C9D6FF", "#FFFFFF"] };
pub const SNOWY_NIGHT: Gradient = Gradient { name: "snowy-night", stops: &["#3E5151", "#DECBA4"] };
pub const MISTY_DAY: Gradient = Gradient { name: "misty-day", stops: &["#BDC3C7", "#DDE3E8"] };
pub const MISTY_NIGHT: Gradient = Gradient { name: "misty-night", stops: &["#4B5563", "#6B7280"] };
pub const HOT: Gradient = Gradient { name: "hot", stops: &["#F83600", "#F9D423"] };
pub const COLD: Gradient = Gradient { name: "cold", stops: &["#83A4D4", "#B6FBFF"] };
pub const MODERATE: Gradient = Gradient { name: "moderate", stops: &["#56CCF2", "#2F80ED"] };

/// Background per (condition, is_daytime).
pub const GRADIENT_TABLE: &[(ConditionKind, bool, Gradient)] = &[
    (ConditionKind::Clear, true, SUNNY_DAY),
    (ConditionKind::Clear, false, CLEAR_NIGHT),
    (ConditionKind::Clouds, true, CLOUDY_DAY),
    (ConditionKind::Clouds, false, CLOUDY_NIGHT),
    (ConditionKind::Rain, true, RAINY_DAY),
    (ConditionKind::Rain, false, RAINY_NIGHT),
    (ConditionKind::Thunderstorm, true, STORMY_DAY),
    (ConditionKind::Thunderstorm, false, STORMY_NIGHT),
    (ConditionKind::Snow, true, SNOWY_DAY),
    (ConditionKind::Snow, false, SNOWY_NIGHT),
    (ConditionKind::Mist, true, MISTY_DAY),
    (ConditionKind::Mist, false, MISTY_NIGHT),
];

pub const HOT_ABOVE_CELSIUS: f64 = 30.0;
pub const COLD_BELOW_CELSIUS: f64 = 5.0;

fn to_celsius(value: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => (value - 32.0) * 5.0 / 9.0,
    }
}

/// Temperature band used when the condition label matches no known keyword.
pub fn temperature_gradient(temperature: f64, units: UnitSystem) -> Gradient {
    let celsius = to_celsius(temperature, units);
    if celsius > HOT_ABOVE_CELSIUS {
        HOT
    } else if celsius < COLD_BELOW_CELSIUS {
        COLD
    } else {
        MODERATE
    }
}

pub fn select_gradient(
    condition: &str,
    daytime: bool,
    temperature: f64,
    units: UnitSystem,
) -> Gradient {
    ConditionKind::from_label(condition)
        .and_then(|kind| {
            GRADIENT_TABLE
                .iter()
                .find(|(k, day, _)| *k == kind && *day == daytime)
                .map(|(_, _, gradient)| *gradient)
        })
        .unwrap_or_else(|| temperature_gradient(temperature, units))
}

/// Background for `snapshot` at instant `now`.
pub fn snapshot_gradient(snapshot: &WeatherSnapshot, now: Timestamp) -> Gradient {
    let daytime = is_daytime(now, snapshot.sunrise, snapshot.sunset);
    select_gradient(&snapshot.condition, daytime, snapshot.temperature, snapshot.units)
}

/// Label of the control that switches to the other unit system.
pub fn toggle_label(units: UnitSystem) -> String {
    format!("Switch to {}", units.toggled().temperature_suffix())
}

/// Everything the current-conditions panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub title: String,
    pub date: String,
    pub temperature: String,
    pub feels_like: String,
    pub description: String,
    pub wind: String,
    pub humidity: String,
    pub sunrise: String,
    pub sunset: String,
    pub icon_url: String,
    pub gradient: Gradient,
    pub toggle_label: String,
}

impl CurrentView {
    pub fn derive<Tz>(
        snapshot: &WeatherSnapshot,
        now: Timestamp,
        tz: &Tz,
        icon_base_url: &str,
    ) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let units = snapshot.units;
        let title = if snapshot.country.is_empty() {
            snapshot.location_name.clone()
        } else {
            format!("{}, {}", snapshot.location_name, snapshot.country)
        };

        Self {
            title,
            date: format_date(now, tz),
            temperature: format_temperature(snapshot.temperature, units),
            feels_like: format_temperature(snapshot.feels_like, units),
            description: snapshot.description.clone(),
            wind: format_wind(snapshot.wind_speed, units),
            humidity: format_humidity(snapshot.humidity_pct),
            sunrise: format_clock(snapshot.sunrise, tz),
            sunset: format_clock(snapshot.sunset, tz),
            icon_url: icon_url(icon_base_url, &snapshot.icon),
            gradient: snapshot_gradient(snapshot, now),
            toggle_label: toggle_label(units),
        }
    }
}

/// One day of the forecast strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastCard {
    pub date: String,
    pub icon_url: String,
    pub temperature: String,
    pub condition: String,
}

pub fn forecast_cards<Tz>(
    series: &ForecastSeries,
    tz: &Tz,
    icon_base_url: &str,
) -> Vec<ForecastCard>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    series
        .points
        .iter()
        .map(|p| ForecastCard {
            date: format_date(p.time, tz),
            icon_url: icon_url(icon_base_url, &p.icon),
            temperature: format_temperature(p.temperature, series.units),
            condition: p.condition.clone(),
        })
        .collect()
}

/// One x-axis entry of the temperature trend chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub temperature: i64,
    pub feels_like: i64,
}

/// Temperature vs. feels-like per forecast day, plus the axis unit label.
pub fn chart_points<Tz>(series: &ForecastSeries, tz: &Tz) -> (Vec<ChartPoint>, &'static str)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let points = series
        .points
        .iter()
        .map(|p| ChartPoint {
            label: format_weekday(p.time, tz),
            temperature: round_or_zero(p.temperature),
            feels_like: round_or_zero(p.feels_like),
        })
        .collect();

    (points, series.units.temperature_suffix())
}

fn round_or_zero(value: f64) -> i64 {
    if value.is_finite() { value.round() as i64 } else { 0 }
}
