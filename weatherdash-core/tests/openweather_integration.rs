//! Integration tests for OpenWeatherClient using wiremock.

use weatherdash_core::{
    FetchError, Locator, OpenWeatherClient, Timestamp, UnitSystem, WeatherProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn current_body(name: &str, temp: f64) -> serde_json::Value {
    serde_json::json!({
        "coord": {"lon": -0.1257, "lat": 51.5085},
        "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
        "main": {"temp": temp, "feels_like": temp - 1.0, "humidity": 81, "pressure": 1012},
        "wind": {"speed": 4.63, "deg": 240},
        "sys": {"country": "GB", "sunrise": 1700033000, "sunset": 1700065000},
        "timezone": 0,
        "name": name,
        "cod": 200
    })
}

fn forecast_body(entries: usize) -> serde_json::Value {
    let list: Vec<serde_json::Value> = (0..entries)
        .map(|i| {
            serde_json::json!({
                "dt": 1_700_000_000 + (i as i64) * 10_800,
                "main": {"temp": i as f64, "feels_like": i as f64 - 0.5, "humidity": 70},
                "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
                "dt_txt": "2023-11-14 21:00:00"
            })
        })
        .collect();

    serde_json::json!({
        "cod": "200",
        "cnt": entries,
        "list": list,
        "city": {"name": "London", "country": "GB"}
    })
}

fn client(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::new("TEST_KEY".to_string())
        .unwrap()
        .with_base_url(&server.uri())
}

#[tokio::test]
async fn test_current_by_name_sends_query_units_and_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "London"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("London", 11.7)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let snapshot = client(&mock_server)
        .current(&Locator::named("London"), UnitSystem::Metric)
        .await
        .unwrap();

    assert_eq!(snapshot.location_name, "London");
    assert_eq!(snapshot.country, "GB");
    assert_eq!(snapshot.condition, "Clouds");
    assert_eq!(snapshot.description, "broken clouds");
    assert_eq!(snapshot.humidity_pct, 81);
    assert_eq!(snapshot.wind_speed, 4.63);
    assert_eq!(snapshot.sunset, Timestamp::Seconds(1_700_065_000));
    assert_eq!(snapshot.units, UnitSystem::Metric);
}

#[tokio::test]
async fn test_current_by_coordinates_sends_lat_lon() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("London", 53.1)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let snapshot = client(&mock_server)
        .current(&Locator::coordinates(51.5, -0.12), UnitSystem::Imperial)
        .await
        .unwrap();

    assert_eq!(snapshot.location_name, "London");
    assert_eq!(snapshot.units, UnitSystem::Imperial);
}

#[tokio::test]
async fn test_current_not_found_is_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .current(&Locator::named("Atlantis"), UnitSystem::Metric)
        .await
        .unwrap_err();

    match err {
        FetchError::Upstream { status, reason } => {
            assert_eq!(status, 404);
            assert_eq!(reason, "Not Found");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_current_invalid_json_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "X"})))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .current(&Locator::named("X"), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    drop(mock_server);

    let err = OpenWeatherClient::new("KEY".to_string())
        .unwrap()
        .with_base_url(&uri)
        .current(&Locator::named("London"), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Network(_)));
}

#[tokio::test]
async fn test_network_error_does_not_leak_api_key() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    drop(mock_server);

    let client = OpenWeatherClient::new("SECRET_KEY_123".to_string())
        .unwrap()
        .with_base_url(&uri);

    let current = client
        .current(&Locator::named("London"), UnitSystem::Metric)
        .await
        .unwrap_err();
    let forecast = client
        .forecast(&Locator::named("London"), UnitSystem::Metric)
        .await
        .unwrap_err();

    for err in [current, forecast] {
        assert!(matches!(err, FetchError::Network(_)));
        assert!(!err.user_message().contains("SECRET_KEY_123"));
        assert!(!err.to_string().contains("appid"));
        assert!(!format!("{err:?}").contains("SECRET_KEY_123"));
    }
}

#[tokio::test]
async fn test_forecast_is_downsampled_to_every_eighth_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(40)))
        .mount(&mock_server)
        .await;

    let series = client(&mock_server)
        .forecast(&Locator::named("London"), UnitSystem::Metric)
        .await
        .unwrap();

    assert_eq!(series.len(), 5);
    let temps: Vec<f64> = series.points.iter().map(|p| p.temperature).collect();
    assert_eq!(temps, vec![0.0, 8.0, 16.0, 24.0, 32.0]);
    assert_eq!(series.points[1].time, Timestamp::Seconds(1_700_000_000 + 8 * 10_800));
    assert_eq!(series.points[0].condition, "Rain");
}

#[tokio::test]
async fn test_forecast_partial_day_rounds_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(17)))
        .mount(&mock_server)
        .await;

    let series = client(&mock_server)
        .forecast(&Locator::named("London"), UnitSystem::Metric)
        .await
        .unwrap();

    assert_eq!(series.len(), 3);
}

#[tokio::test]
async fn test_forecast_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .forecast(&Locator::named("London"), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
}
