/*
[INPUT]:  HTTP configuration (base URL, timeouts, station context)
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
[UPDATE]: 2026-06-18 Decode API error envelope and map 409 in send_json
*/

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::{FloorError, Result};

/// Default base URL for the floor task service
const DEFAULT_BASE_URL: &str = "https://floor.example.internal";

const STATION_HEADER: &str = "x-floor-station";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Identity attached to every request: which station and which operator the
/// work is being executed for. Issuing the token is the auth service's job;
/// the adapter only forwards it.
#[derive(Debug, Clone)]
pub struct StationContext {
    pub station_id: String,
    pub operator_id: String,
    pub auth_token: String,
}

/// Error envelope the service uses for 4xx/5xx bodies.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    message: String,
}

/// Main HTTP client for the floor task service
#[derive(Debug)]
pub struct FloorClient {
    http_client: Client,
    base_url: Url,
    context: Option<StationContext>,
    timeout: Duration,
}

impl FloorClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config_and_base_url(ClientConfig::default(), DEFAULT_BASE_URL)
    }

    /// Create a new client with custom configuration and base URL
    /// (tests inject wiremock URIs here)
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
            context: None,
            timeout: config.timeout,
        })
    }

    /// Set the station context for authenticated requests
    pub fn set_context(&mut self, context: StationContext) {
        self.context = Some(context);
    }

    /// Get the station context if set
    pub fn context(&self) -> Option<&StationContext> {
        self.context.as_ref()
    }

    /// Build a request builder for a service endpoint, attaching the station
    /// headers when a context is set
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        let mut builder = self.http_client.request(method, url);

        if let Some(context) = &self.context {
            builder = builder
                .bearer_auth(&context.auth_token)
                .header(STATION_HEADER, &context.station_id);
        }

        Ok(builder)
    }

    /// Send a request and decode the JSON body, mapping the service's error
    /// envelope onto the adapter taxonomy.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        if status == StatusCode::CONFLICT {
            return Err(FloorError::AllocationConflict {
                message: error_message(&body, status),
            });
        }

        if status.is_client_error() || status.is_server_error() {
            let decoded: std::result::Result<ApiErrorBody, _> = serde_json::from_str(&body);
            return Err(match decoded {
                Ok(envelope) => FloorError::Api {
                    code: envelope.code.unwrap_or(status.as_u16() as i32),
                    message: envelope.message,
                },
                Err(_) => FloorError::Api {
                    code: status.as_u16() as i32,
                    message: body,
                },
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request where only the status matters (fire-and-forget calls).
    pub(crate) async fn send_unit(&self, builder: RequestBuilder) -> Result<()> {
        let response = builder
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(FloorError::Api {
                code: status.as_u16() as i32,
                message: error_message(&body, status),
            });
        }

        Ok(())
    }

    fn map_transport_error(&self, err: reqwest::Error) -> FloorError {
        if err.is_timeout() {
            FloorError::Timeout {
                duration: self.timeout.as_secs(),
            }
        } else {
            FloorError::Http(err)
        }
    }
}

fn error_message(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(envelope) if !envelope.message.is_empty() => envelope.message,
        _ if !body.is_empty() => body.to_string(),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = FloorClient::new().expect("default client");
        assert!(client.context().is_none());
    }

    #[test]
    fn test_context_roundtrip() {
        let mut client = FloorClient::new().expect("default client");
        client.set_context(StationContext {
            station_id: "st-07".to_string(),
            operator_id: "op-12".to_string(),
            auth_token: "token".to_string(),
        });

        let stored = client.context().expect("context should be set");
        assert_eq!(stored.station_id, "st-07");
        assert_eq!(stored.operator_id, "op-12");
    }

    #[test]
    fn test_error_message_prefers_envelope() {
        let body = r#"{"code": 422, "message": "too many units"}"#;
        assert_eq!(
            error_message(body, StatusCode::UNPROCESSABLE_ENTITY),
            "too many units"
        );
        assert_eq!(error_message("plain text", StatusCode::BAD_GATEWAY), "plain text");
    }
}
