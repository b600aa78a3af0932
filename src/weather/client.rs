//! Weather API client
//!
//! Thin async client over the upstream JSON API. Every call is a single GET
//! with the static key attached; the parsed body is returned unchanged.

use serde_json::Value;

use crate::config::ServerConfig;
use crate::error::{Result, WeatherApiError};
use crate::weather::types::{Endpoint, ForecastDays, HistoryDate};

/// Weather API client
#[derive(Debug, Clone)]
pub struct WeatherClient {
    /// HTTP client with the request timeout applied
    http_client: reqwest::Client,

    /// Server configuration (credential and base URL)
    config: ServerConfig,
}

impl WeatherClient {
    /// Create a new weather client
    pub fn new(config: ServerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Current conditions for a location
    pub async fn current(&self, q: &str) -> Result<Value> {
        self.request(Endpoint::Current, vec![("q", q.to_string())])
            .await
    }

    /// Forecast for a location
    pub async fn forecast(&self, q: &str, days: ForecastDays) -> Result<Value> {
        self.request(
            Endpoint::Forecast,
            vec![("q", q.to_string()), ("days", days.get().to_string())],
        )
        .await
    }

    /// Historical weather for a location and date
    pub async fn history(&self, q: &str, dt: HistoryDate) -> Result<Value> {
        self.request(
            Endpoint::History,
            vec![("q", q.to_string()), ("dt", dt.to_string())],
        )
        .await
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!(
            "{}/{}.json",
            self.config.weather_base_url.trim_end_matches('/'),
            endpoint
        )
    }

    async fn request(&self, endpoint: Endpoint, params: Vec<(&str, String)>) -> Result<Value> {
        let key = self.config.api_key()?;

        let mut query = vec![("key", key.to_string())];
        query.extend(params);

        let url = self.endpoint_url(endpoint);
        tracing::debug!(%endpoint, "Sending weather API request");

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherApiError::UpstreamHttp {
                status: status.as_u16(),
            }
            .into());
        }

        let data: Value = response.json().await.map_err(classify_body_error)?;

        if let Some(error) = data.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(WeatherApiError::UpstreamLogical { message }.into());
        }

        Ok(data)
    }
}

/// Map a failed send to the error taxonomy
fn classify_send_error(err: reqwest::Error) -> WeatherApiError {
    if err.is_builder() {
        WeatherApiError::Unexpected {
            message: err.to_string(),
        }
    } else {
        WeatherApiError::Network {
            message: err.to_string(),
        }
    }
}

/// Map a failed body read. Transport failures are network errors, bad JSON is not.
fn classify_body_error(err: reqwest::Error) -> WeatherApiError {
    if err.is_decode() {
        WeatherApiError::Unexpected {
            message: err.to_string(),
        }
    } else if err.is_timeout() || err.is_connect() || err.is_body() || err.is_request() {
        WeatherApiError::Network {
            message: err.to_string(),
        }
    } else {
        WeatherApiError::Unexpected {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};

    use crate::error::{ErrorKind, WeatherMcpError};

    #[derive(Clone, Default)]
    struct Upstream {
        hits: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
    }

    async fn handler(
        State(upstream): State<Upstream>,
        axum::extract::Path(file): axum::extract::Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        upstream
            .hits
            .lock()
            .unwrap()
            .push((file.clone(), params.clone()));

        match params.get("q").map(String::as_str) {
            Some("nowhere") => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "error": {"code": 1006, "message": "No matching location found."}
                })),
            ),
            Some("forbidden") => (StatusCode::FORBIDDEN, Json(serde_json::json!({}))),
            _ => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "location": {"name": params.get("q")},
                    "endpoint": file,
                })),
            ),
        }
    }

    async fn spawn_upstream() -> (String, Upstream) {
        let upstream = Upstream::default();
        let app = Router::new()
            .route("/:file", get(handler))
            .with_state(upstream.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), upstream)
    }

    fn config(base_url: &str, key: Option<&str>) -> ServerConfig {
        ServerConfig {
            weather_api_key: key.map(str::to_string),
            weather_base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(5),
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_current_returns_body_unchanged() {
        let (base, upstream) = spawn_upstream().await;
        let client = WeatherClient::new(config(&base, Some("secret"))).unwrap();

        let data = client.current("London").await.unwrap();
        assert_eq!(data["location"]["name"], "London");
        assert_eq!(data["endpoint"], "current.json");

        let hits = upstream.hits.lock().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1.get("key").unwrap(), "secret");
    }

    #[tokio::test]
    async fn test_forecast_and_history_params() {
        let (base, upstream) = spawn_upstream().await;
        let client = WeatherClient::new(config(&base, Some("secret"))).unwrap();

        client
            .forecast("30.3,-97.7", ForecastDays::new(14).unwrap())
            .await
            .unwrap();
        client
            .history("Paris", HistoryDate::parse("2025-10-28").unwrap())
            .await
            .unwrap();

        let hits = upstream.hits.lock().unwrap();
        assert_eq!(hits[0].0, "forecast.json");
        assert_eq!(hits[0].1.get("days").unwrap(), "14");
        assert_eq!(hits[0].1.get("q").unwrap(), "30.3,-97.7");
        assert_eq!(hits[1].0, "history.json");
        assert_eq!(hits[1].1.get("dt").unwrap(), "2025-10-28");
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let (base, upstream) = spawn_upstream().await;

        for key in [None, Some(""), Some("YOUR_API_TOKEN")] {
            let client = WeatherClient::new(config(&base, key)).unwrap();
            let err = client.current("London").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        }

        assert!(upstream.hits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_in_body_is_logical_error() {
        let (base, _upstream) = spawn_upstream().await;
        let client = WeatherClient::new(config(&base, Some("secret"))).unwrap();

        let err = client.current("nowhere").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamLogicalError);
        assert!(err.to_string().contains("No matching location found."));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (base, _upstream) = spawn_upstream().await;
        let client = WeatherClient::new(config(&base, Some("secret"))).unwrap();

        let err = client.current("forbidden").await.unwrap_err();
        assert!(matches!(
            err,
            WeatherMcpError::Weather(WeatherApiError::UpstreamHttp { status: 403 })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            WeatherClient::new(config(&format!("http://{}", addr), Some("secret"))).unwrap();
        let err = client.current("London").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    /// Serve one canned HTTP response per connection, optionally stalling afterwards
    async fn spawn_raw(response: &'static str, stall: bool) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    if stall {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                    }
                });
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_stalled_body_is_network_error() {
        let base = spawn_raw(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"loc",
            true,
        )
        .await;
        let client = WeatherClient::new(ServerConfig {
            request_timeout: Duration::from_millis(500),
            ..config(&base, Some("secret"))
        })
        .unwrap();

        let err = client.current("London").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert!(err.to_string().starts_with("Network Error"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_unexpected_error() {
        let base = spawn_raw(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 8\r\nConnection: close\r\n\r\nnot json",
            false,
        )
        .await;
        let client = WeatherClient::new(config(&base, Some("secret"))).unwrap();

        let err = client.current("London").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedError);
    }
}
