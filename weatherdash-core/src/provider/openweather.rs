use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::FetchError,
    model::{ForecastPoint, ForecastSeries, Locator, Timestamp, UnitSystem, WeatherSnapshot},
};

use super::{WeatherProvider, downsample_daily};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(FetchError::network)?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// GET `{base}/{endpoint}` and return the body of a 2xx response.
    async fn get_body(
        &self,
        endpoint: &str,
        locator: &Locator,
        units: UnitSystem,
    ) -> Result<String, FetchError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let mut query = locator.query_pairs();
        query.push(("units", units.as_str().to_string()));
        query.push(("appid", self.api_key.clone()));

        tracing::debug!(%locator, %units, endpoint, "Requesting OpenWeather data");

        let res = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(FetchError::network)?;

        let status = res.status();
        let body = res.text().await.map_err(FetchError::network)?;

        if !status.is_success() {
            tracing::debug!(
                status = %status,
                body = %truncate_body(&body),
                endpoint,
                "OpenWeather request failed"
            );
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    coord: OwCoord,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

impl OwCurrentResponse {
    fn into_snapshot(self, units: UnitSystem) -> Result<WeatherSnapshot, FetchError> {
        let weather = self.weather.into_iter().next().ok_or_else(|| {
            FetchError::MalformedResponse("no weather conditions in response".to_string())
        })?;

        Ok(WeatherSnapshot {
            location_name: self.name,
            country: self.sys.country,
            latitude: self.coord.lat,
            longitude: self.coord.lon,
            condition: weather.main,
            icon: weather.icon,
            description: weather.description,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity_pct: self.main.humidity,
            wind_speed: self.wind.speed,
            sunrise: Timestamp::Seconds(self.sys.sunrise),
            sunset: Timestamp::Seconds(self.sys.sunset),
            utc_offset_secs: self.timezone,
            units,
        })
    }
}

impl OwForecastEntry {
    fn into_point(self) -> Result<ForecastPoint, FetchError> {
        let weather = self.weather.into_iter().next().ok_or_else(|| {
            FetchError::MalformedResponse(format!("forecast entry {} has no conditions", self.dt))
        })?;

        Ok(ForecastPoint {
            time: Timestamp::Seconds(self.dt),
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            condition: weather.main,
            icon: weather.icon,
            description: weather.description,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(
        &self,
        locator: &Locator,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, FetchError> {
        let body = self.get_body("weather", locator, units).await?;

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(format!("current weather JSON: {e}")))?;

        parsed.into_snapshot(units)
    }

    async fn forecast(
        &self,
        locator: &Locator,
        units: UnitSystem,
    ) -> Result<ForecastSeries, FetchError> {
        let body = self.get_body("forecast", locator, units).await?;

        let parsed: OwForecastResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(format!("forecast JSON: {e}")))?;

        let points = downsample_daily(parsed.list)
            .into_iter()
            .map(OwForecastEntry::into_point)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ForecastSeries { units, points })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
