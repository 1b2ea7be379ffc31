//! reqwest-backed transport for the provider's REST surface.
//!
//! Every request carries the project `apikey` header. Calls made on behalf of a
//! user (sign-out, current-user lookup, password update) send that user's
//! token as the bearer; all other calls send the anon key as the bearer, which
//! is what the provider's gateway expects for unauthenticated traffic.

use super::{ProviderConfig, ProviderRequest, ProviderResponse, Transport, TransportError};
use crate::APP_USER_AGENT;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, instrument};

/// Maximum number of characters of a non-JSON error body kept in responses.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    config: ProviderConfig,
}

impl HttpTransport {
    /// Build a transport with the configured timeout.
    ///
    /// # Errors
    /// Returns `TransportError::Config` if the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|err| TransportError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(endpoint = %request.endpoint))]
    async fn call(&self, request: ProviderRequest) -> Result<ProviderResponse, TransportError> {
        let endpoint = request.endpoint;
        let url = self.config.endpoint_url(endpoint.path());
        let anon_key = self.config.anon_key.expose_secret();

        let mut builder = self
            .client
            .request(endpoint.method(), &url)
            .header("apikey", anon_key)
            .query(endpoint.fixed_query())
            .query(&request.query);

        builder = match &request.bearer {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder.bearer_auth(anon_key),
        };

        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        let response = builder.send().await.map_err(map_request_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_request_error)?;

        debug!("provider answered {}", status);

        Ok(ProviderResponse::new(status, decode_body(text)))
    }
}

/// Map reqwest failures into transport errors with timeout detection.
fn map_request_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_builder() {
        TransportError::Config(format!("Failed to build request: {err}"))
    } else {
        TransportError::Network(err.to_string())
    }
}

/// Decode a response body as JSON, keeping a trimmed copy of non-JSON text.
fn decode_body(text: String) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    serde_json::from_str(trimmed)
        .unwrap_or_else(|_| Value::String(trimmed.chars().take(MAX_ERROR_CHARS).collect()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::Endpoint;
    use secrecy::SecretString;
    use serde_json::json;
    use std::{net::TcpListener, time::Duration};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn transport(uri: &str) -> HttpTransport {
        let config = ProviderConfig::new(uri, SecretString::from("anon-key".to_string())).unwrap();
        HttpTransport::new(config).unwrap()
    }

    #[test]
    fn decode_body_handles_empty_json_and_text() {
        assert_eq!(decode_body(String::new()), Value::Null);
        assert_eq!(decode_body("  \n".to_string()), Value::Null);
        assert_eq!(decode_body("{\"a\":1}".to_string()), json!({ "a": 1 }));
        assert_eq!(
            decode_body("Bad Gateway".to_string()),
            Value::String("Bad Gateway".to_string())
        );
        let long = "x".repeat(500);
        assert_eq!(
            decode_body(long).as_str().map(str::len),
            Some(MAX_ERROR_CHARS)
        );
    }

    #[tokio::test]
    async fn sign_in_sends_grant_type_and_apikey() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(body_json(json!({ "email": "ana@example.com", "password": "secret1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let response = transport(&server.uri())
            .call(
                ProviderRequest::new(Endpoint::SignIn)
                    .with_payload(json!({ "email": "ana@example.com", "password": "secret1" })),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn user_lookup_uses_bearer_credential() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer recovery-token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let response = transport(&server.uri())
            .call(
                ProviderRequest::new(Endpoint::User)
                    .with_bearer(SecretString::from("recovery-token".to_string())),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(response.body, Value::String("unauthorized".to_string()));
    }

    #[tokio::test]
    async fn recover_passes_redirect_query() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/recover"))
            .and(query_param("redirect_to", "https://learn.example.com/login.html"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let response = transport(&server.uri())
            .call(
                ProviderRequest::new(Endpoint::Recover)
                    .with_payload(json!({ "email": "ana@example.com" }))
                    .with_query("redirect_to", "https://learn.example.com/login.html"),
            )
            .await
            .unwrap();

        assert!(response.is_success());
    }

    #[tokio::test]
    async fn slow_provider_maps_to_timeout() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let config = ProviderConfig::new(&server.uri(), SecretString::from("anon".to_string()))
            .unwrap()
            .with_timeout(Duration::from_millis(200));
        let transport = HttpTransport::new(config).unwrap();

        let result = transport
            .call(ProviderRequest::new(Endpoint::SignOut))
            .await;

        assert!(matches!(result, Err(TransportError::Timeout(_))));
    }

    #[tokio::test]
    async fn closed_port_maps_to_network_error() {
        let listener = match TcpListener::bind("127.0.0.1:0") {
            Ok(listener) => listener,
            Err(_) => {
                eprintln!("Skipping test: cannot bind localhost");
                return;
            }
        };
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = transport(&format!("http://{addr}"))
            .call(ProviderRequest::new(Endpoint::User))
            .await;

        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
