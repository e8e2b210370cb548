//! HTTP client for the EV Tracker REST API.
//!
//! One HTTP request per operation, no retries, no caching. Status codes map
//! onto the [`Error`] taxonomy in a single place so every operation fails
//! the same way.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::Error;
use crate::models::{AggregateState, ChargingSession, EnergySource, RateTier, SessionLog, Vehicle};

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.evtracker.cz/api/v1";

const ENDPOINT_CARS: &str = "/cars";
const ENDPOINT_CARS_DEFAULT: &str = "/cars/default";
const ENDPOINT_SESSIONS: &str = "/sessions";
const ENDPOINT_SESSIONS_SIMPLE: &str = "/sessions/simple";
const ENDPOINT_STATE: &str = "/homeassistant/state";

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// EV Tracker client configuration.
#[derive(Debug, Clone)]
pub struct EvTrackerConfig {
    /// API key from the EV Tracker account settings
    pub api_key: String,
    /// Base URL of the API; trailing slashes are trimmed at construction
    pub base_url: String,
    /// Request timeout for the owned transport
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl EvTrackerConfig {
    /// Configuration for the production API with the given key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("evtracker-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Async client for the EV Tracker REST API.
///
/// The client holds the API key and an HTTP connection pool. The pool is
/// either built and owned here ([`EvTrackerClient::new`]) or supplied by the
/// caller ([`EvTrackerClient::with_http_client`]); in both cases it is
/// released when the last clone of the owning handle is dropped, whether or
/// not an operation failed in between. Concurrent calls on one instance are
/// as safe as concurrent use of the shared pool; no additional ordering is
/// imposed across calls.
#[derive(Clone)]
pub struct EvTrackerClient {
    http: Client,
    config: EvTrackerConfig,
}

impl EvTrackerClient {
    /// Create a client that builds and owns its HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`] when the transport cannot be constructed.
    pub fn new(config: EvTrackerConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Init(e.to_string()))?;
        Ok(Self::with_http_client(http, config))
    }

    /// Create a client on top of a caller-supplied transport.
    ///
    /// The caller keeps ownership of the connection pool; pool-level
    /// settings such as `config.timeout` are governed by whatever the
    /// supplied client was built with.
    #[must_use]
    pub fn with_http_client(http: Client, mut config: EvTrackerConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { http, config }
    }

    /// Base URL the client sends requests to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetch all cars registered to the account.
    ///
    /// An account without cars yields an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// [`Error::Authentication`] on 401/403, [`Error::RateLimit`] on 429,
    /// [`Error::Connection`] on transport failure, [`Error::Api`] or
    /// [`Error::Payload`] otherwise.
    pub async fn get_vehicles(&self) -> Result<Vec<Vehicle>, Error> {
        let vehicles: Option<Vec<Vehicle>> =
            self.send(self.request(Method::GET, ENDPOINT_CARS)).await?;
        Ok(vehicles.unwrap_or_default())
    }

    /// Fetch the account's default car.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Api`] when no default car is configured
    /// server-side; otherwise the same failure modes as
    /// [`EvTrackerClient::get_vehicles`].
    pub async fn get_default_vehicle(&self) -> Result<Vehicle, Error> {
        self.send(self.request(Method::GET, ENDPOINT_CARS_DEFAULT))
            .await?
            .ok_or_else(|| Error::Api {
                status: StatusCode::OK.as_u16(),
                message: "no default car is configured".to_string(),
            })
    }

    /// Fetch the aggregate statistics snapshot.
    ///
    /// An empty `data` object yields the all-zero snapshot.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`EvTrackerClient::get_vehicles`].
    pub async fn get_aggregate_state(&self) -> Result<AggregateState, Error> {
        let state: Option<AggregateState> =
            self.send(self.request(Method::GET, ENDPOINT_STATE)).await?;
        Ok(state.unwrap_or_default())
    }

    /// Log a charging session with full control over every field.
    ///
    /// The draft is validated locally first; a validation failure never
    /// reaches the network.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] on an invalid draft; otherwise the same
    /// failure modes as [`EvTrackerClient::get_vehicles`].
    pub async fn log_session(&self, session: &SessionLog) -> Result<ChargingSession, Error> {
        session.validate()?;
        let payload = session.to_payload();
        tracing::debug!(?payload, "logging session");

        self.send(
            self.request(Method::POST, ENDPOINT_SESSIONS)
                .json(&payload),
        )
        .await?
        .ok_or_else(|| Error::Payload("session response has no data".to_string()))
    }

    /// Log a charging session with defaults for unspecified fields.
    ///
    /// The energy amount, source and rate tier are forced into the draft;
    /// the end time defaults to now when unset. When no vehicle is given the
    /// account's default car is applied by the simple-logging endpoint, so
    /// the operation still performs exactly one HTTP request.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`EvTrackerClient::log_session`].
    pub async fn log_session_simple(
        &self,
        energy_kwh: f64,
        source: EnergySource,
        rate_tier: RateTier,
        overrides: SessionLog,
    ) -> Result<ChargingSession, Error> {
        let mut session = overrides;
        session.energy_kwh = Some(energy_kwh);
        session.energy_source = Some(source);
        session.rate_tier = Some(rate_tier);
        if session.end_time.is_none() {
            session.end_time = Some(chrono::Utc::now());
        }

        session.validate()?;
        let payload = session.to_payload();
        tracing::debug!(?payload, "logging simple session");

        self.send(
            self.request(Method::POST, ENDPOINT_SESSIONS_SIMPLE)
                .json(&payload),
        )
        .await?
        .ok_or_else(|| Error::Payload("session response has no data".to_string()))
    }

    /// Check whether the configured API key is accepted by the server.
    ///
    /// Performs one lightweight authenticated call. Returns `false` when the
    /// server rejects the key or the call fails with a generic API error;
    /// transport and rate-limit failures propagate unchanged so callers can
    /// tell an unreachable service from a bad key.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] and [`Error::RateLimit`] propagate.
    pub async fn validate_api_key(&self) -> Result<bool, Error> {
        match self.get_vehicles().await {
            Ok(_) => Ok(true),
            Err(Error::Authentication(_)) => Ok(false),
            Err(Error::Api { status, message }) => {
                tracing::warn!(status, %message, "API key validation error");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{endpoint}", self.config.base_url);
        tracing::debug!(%method, %url, "API request");
        self.http
            .request(method, url)
            .header("x-api-key", &self.config.api_key)
            .header("Accept", "application/json")
            .header("User-Agent", &self.config.user_agent)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, Error> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "connection error");
            Error::Connection(e.to_string())
        })?;

        let response = check_status(response).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::Payload(e.to_string()))?;
        Ok(envelope.data)
    }
}

/// Standard response envelope: every success body wraps its result in `data`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Option::default")]
    data: Option<T>,
}

/// Map a non-success status onto the error taxonomy; pass 2xx through.
async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();
    tracing::debug!(status = status.as_u16(), "API response");

    match status {
        StatusCode::UNAUTHORIZED => Err(Error::Authentication("invalid API key".to_string())),
        StatusCode::FORBIDDEN => Err(Error::Authentication(
            "API key lacks permissions or PRO subscription required".to_string(),
        )),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            Err(Error::RateLimit { retry_after_secs })
        }
        s if s.is_server_error() => {
            let message = response.text().await.unwrap_or_default();
            Err(Error::Api {
                status: s.as_u16(),
                message,
            })
        }
        s if s.is_client_error() => {
            let message = extract_error_message(response).await;
            Err(Error::Api {
                status: s.as_u16(),
                message,
            })
        }
        _ => Ok(response),
    }
}

/// Pull the `error.message` field out of a 4xx body, falling back to the
/// raw body text.
async fn extract_error_message(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("error")?
                .get("message")?
                .as_str()
                .map(ToString::to_string)
        })
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = EvTrackerConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("evtracker-client/"));
    }

    #[test]
    fn client_creation() {
        let client = EvTrackerClient::new(EvTrackerConfig::new("test-key"));
        assert!(client.is_ok());
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let mut config = EvTrackerConfig::new("test-key");
        config.base_url = "https://custom.api.com/".to_string();

        let client = EvTrackerClient::new(config).unwrap();
        assert_eq!(client.base_url(), "https://custom.api.com");
    }

    #[test]
    fn envelope_tolerates_missing_data_field() {
        let envelope: Envelope<Vec<Vehicle>> =
            serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(envelope.data.is_none());
    }
}
