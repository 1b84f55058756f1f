//! Integration tests for WeatherAggregator using wiremock.
//!
//! Each provider is a mock server that answers with a record derived from
//! the `at` query parameter, the way the real providers echo the date back.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use wxmerge_core::{Config, NaiveZone};
use wxmerge_weather::{WeatherAggregator, WeatherError};

/// Answers with a temperature equal to the day of month of `at`.
struct TemperatureEcho;

impl Respond for TemperatureEcho {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let date = at_param(request);
        ResponseTemplate::new(200).set_body_json(json!({
            "temp": day_of_month(&date) + 0.5,
            "date": date,
        }))
    }
}

/// Answers with wind components derived from the day of month of `at`.
struct SpeedEcho;

impl Respond for SpeedEcho {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let date = at_param(request);
        let day = day_of_month(&date);
        ResponseTemplate::new(200).set_body_json(json!({
            "north": -day,
            "west": day * 2.0,
            "date": date,
        }))
    }
}

fn at_param(request: &Request) -> String {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == "at")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

fn day_of_month(date: &str) -> f64 {
    date[8..10].parse().unwrap()
}

struct Providers {
    temperature: MockServer,
    speed: MockServer,
}

impl Providers {
    async fn start() -> Self {
        Self {
            temperature: MockServer::start().await,
            speed: MockServer::start().await,
        }
    }

    async fn echo(self) -> Self {
        Mock::given(method("GET"))
            .respond_with(TemperatureEcho)
            .mount(&self.temperature)
            .await;
        Mock::given(method("GET"))
            .respond_with(SpeedEcho)
            .mount(&self.speed)
            .await;
        self
    }

    fn aggregator(&self) -> WeatherAggregator {
        let mut config = Config::default();
        config.providers.temperature_api_url = format!("{}/", self.temperature.uri());
        config.providers.windspeed_api_url = format!("{}/", self.speed.uri());
        config.dates.naive_zone = NaiveZone::Utc;
        WeatherAggregator::new(Arc::new(config)).unwrap()
    }
}

#[tokio::test]
async fn test_temperatures_are_ordered_by_date() {
    let providers = Providers::start().await.echo().await;
    let aggregator = providers.aggregator();

    let records = aggregator
        .fetch_temperatures("1999-12-03", "1999-12-05T22:22Z")
        .await
        .unwrap();

    let dates: Vec<&str> = records.iter().map(|r| r["date"].as_str().unwrap()).collect();
    assert_eq!(
        dates,
        vec![
            "1999-12-03T00:00:00+00:00",
            "1999-12-04T00:00:00+00:00",
            "1999-12-05T00:00:00+00:00",
        ]
    );
    assert_eq!(records[1]["temp"], json!(4.5));
}

#[tokio::test]
async fn test_speeds_are_ordered_by_date() {
    let providers = Providers::start().await.echo().await;
    let aggregator = providers.aggregator();

    let records = aggregator
        .fetch_speeds("2018-08-01T00:00:00Z", "2018-08-04T00:00:00Z")
        .await
        .unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["north"], json!(-1.0));
    assert_eq!(records[3]["west"], json!(8.0));
}

#[tokio::test]
async fn test_weather_matches_facets_index_by_index() {
    let providers = Providers::start().await.echo().await;
    let aggregator = providers.aggregator();
    let (start, end) = ("2018-08-01T00:00:00Z", "2018-08-07T00:00:00Z");

    let weather = aggregator.fetch_weather(start, end).await.unwrap();
    let temperatures = aggregator.fetch_temperatures(start, end).await.unwrap();
    let speeds = aggregator.fetch_speeds(start, end).await.unwrap();

    assert_eq!(weather.len(), 7);
    assert_eq!(weather.len(), temperatures.len());
    assert_eq!(weather.len(), speeds.len());

    for i in 0..weather.len() {
        assert_eq!(weather[i]["temp"], temperatures[i]["temp"]);
        assert_eq!(weather[i]["north"], speeds[i]["north"]);
        assert_eq!(weather[i]["west"], speeds[i]["west"]);
        assert_eq!(weather[i]["date"], temperatures[i]["date"]);
        assert_eq!(weather[i]["date"], speeds[i]["date"]);
    }
}

#[tokio::test]
async fn test_validation_failure_sends_no_requests() {
    let providers = Providers::start().await;
    Mock::given(method("GET"))
        .respond_with(TemperatureEcho)
        .expect(0)
        .mount(&providers.temperature)
        .await;
    Mock::given(method("GET"))
        .respond_with(SpeedEcho)
        .expect(0)
        .mount(&providers.speed)
        .await;
    let aggregator = providers.aggregator();

    let err = aggregator
        .fetch_weather("1999-12-03", "1990-12-05T22:22Z")
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Start date needs to be greater than or equal end date."
    );
}

#[tokio::test]
async fn test_upstream_rejection_stops_remaining_calls() {
    let providers = Providers::start().await;

    Mock::given(method("GET"))
        .and(query_param("at", "2018-08-02T00:00:00+00:00"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "no sample found for date 2018-08-02T00:00:00+00:00"
        })))
        .with_priority(1)
        .expect(1)
        .mount(&providers.temperature)
        .await;
    Mock::given(method("GET"))
        .and(query_param("at", "2018-08-03T00:00:00+00:00"))
        .respond_with(TemperatureEcho)
        .with_priority(1)
        .expect(0)
        .mount(&providers.temperature)
        .await;
    Mock::given(method("GET"))
        .respond_with(TemperatureEcho)
        .expect(1)
        .mount(&providers.temperature)
        .await;

    let aggregator = providers.aggregator();
    let err = aggregator
        .fetch_temperatures("2018-08-01T00:00:00Z", "2018-08-03T00:00:00Z")
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::UpstreamRejected(_)));
    assert_eq!(
        err.to_string(),
        "no sample found for date 2018-08-02T00:00:00+00:00"
    );
}

#[tokio::test]
async fn test_weather_fails_when_speed_provider_is_down() {
    let providers = Providers::start().await;
    Mock::given(method("GET"))
        .respond_with(TemperatureEcho)
        .mount(&providers.temperature)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&providers.speed)
        .await;

    let aggregator = providers.aggregator();
    let err = aggregator
        .fetch_weather("2018-08-01T00:00:00Z", "2018-08-03T00:00:00Z")
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::UpstreamUnavailable(_)));
    assert!(err.to_string().starts_with("Service unavailable"));
}

#[tokio::test]
async fn test_weather_rejection_stops_remaining_calls_on_both_providers() {
    let providers = Providers::start().await;

    for (server, message) in [
        (&providers.temperature, "no temperature sample"),
        (&providers.speed, "no wind sample"),
    ] {
        Mock::given(method("GET"))
            .and(query_param("at", "2018-08-02T00:00:00+00:00"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": message })))
            .with_priority(1)
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("at", "2018-08-03T00:00:00+00:00"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .with_priority(1)
            .expect(0)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .respond_with(TemperatureEcho)
        .expect(1)
        .mount(&providers.temperature)
        .await;
    Mock::given(method("GET"))
        .respond_with(SpeedEcho)
        .expect(1)
        .mount(&providers.speed)
        .await;

    let aggregator = providers.aggregator();
    let err = aggregator
        .fetch_weather("2018-08-01T00:00:00Z", "2018-08-03T00:00:00Z")
        .await
        .unwrap_err();

    // Both sides failed for the same day; the temperature error is reported.
    assert!(matches!(err, WeatherError::UpstreamRejected(_)));
    assert_eq!(err.to_string(), "no temperature sample");

    providers.temperature.verify().await;
    providers.speed.verify().await;
}

#[tokio::test]
async fn test_weather_accepts_week_and_ordinal_dates() {
    let providers = Providers::start().await.echo().await;
    let aggregator = providers.aggregator();

    let weather = aggregator.fetch_weather("2018-W31-3", "2018-215").await.unwrap();

    let dates: Vec<&str> = weather.iter().map(|r| r["date"].as_str().unwrap()).collect();
    assert_eq!(
        dates,
        vec![
            "2018-08-01T00:00:00+00:00",
            "2018-08-02T00:00:00+00:00",
            "2018-08-03T00:00:00+00:00",
        ]
    );
}
