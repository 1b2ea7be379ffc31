//! Identity provider transport.
//!
//! The controller never builds HTTP requests itself. It describes a call as an
//! [`Endpoint`] plus an optional JSON payload and bearer credential, and the
//! [`Transport`] answers with the status code and decoded body. Provider
//! semantics (what a 401 means for a given endpoint) stay in the controller;
//! the transport only reports transport failures as errors.
//!
//! Security boundary: payloads carry passwords and bearer values carry session
//! or recovery tokens. Neither may be logged; `ProviderRequest` redacts both in
//! its `Debug` output.

pub mod config;
pub mod http;
pub mod oauth;

pub use self::config::ProviderConfig;
pub use self::http::HttpTransport;
pub use self::oauth::OAuthProvider;

use async_trait::async_trait;
use reqwest::Method;
use secrecy::SecretString;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Provider operations the controller is allowed to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    SignIn,
    Refresh,
    SignUp,
    SignOut,
    Recover,
    User,
    UpdateUser,
}

impl Endpoint {
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::User => Method::GET,
            Self::UpdateUser => Method::PUT,
            Self::SignIn | Self::Refresh | Self::SignUp | Self::SignOut | Self::Recover => {
                Method::POST
            }
        }
    }

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::SignIn | Self::Refresh => "/auth/v1/token",
            Self::SignUp => "/auth/v1/signup",
            Self::SignOut => "/auth/v1/logout",
            Self::Recover => "/auth/v1/recover",
            Self::User | Self::UpdateUser => "/auth/v1/user",
        }
    }

    /// Query parameters that are part of the endpoint itself.
    #[must_use]
    pub const fn fixed_query(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::SignIn => &[("grant_type", "password")],
            Self::Refresh => &[("grant_type", "refresh_token")],
            _ => &[],
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// A single call against the provider.
#[derive(Clone)]
pub struct ProviderRequest {
    pub endpoint: Endpoint,
    pub payload: Option<Value>,
    pub bearer: Option<SecretString>,
    pub query: Vec<(&'static str, String)>,
}

impl ProviderRequest {
    #[must_use]
    pub const fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            payload: None,
            bearer: None,
            query: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_bearer(mut self, bearer: SecretString) -> Self {
        self.bearer = Some(bearer);
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }
}

impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload_keys: Option<Vec<&String>> = self
            .payload
            .as_ref()
            .and_then(Value::as_object)
            .map(|object| object.keys().collect());

        f.debug_struct("ProviderRequest")
            .field("endpoint", &self.endpoint)
            .field("payload_keys", &payload_keys)
            .field("bearer", &self.bearer.as_ref().map(|_| "***"))
            .field("query", &self.query)
            .finish()
    }
}

/// Status code and decoded body of a provider answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: Value,
}

impl ProviderResponse {
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unable to reach the identity provider: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
}

/// The seam between the controller and the identity provider.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one provider call.
    ///
    /// # Errors
    /// Returns a `TransportError` only when no HTTP answer was obtained; non-2xx
    /// answers are returned as `Ok` with their status.
    async fn call(&self, request: ProviderRequest) -> Result<ProviderResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoints_map_to_provider_routes() {
        assert_eq!(Endpoint::SignIn.method(), Method::POST);
        assert_eq!(Endpoint::SignIn.path(), "/auth/v1/token");
        assert_eq!(Endpoint::SignIn.fixed_query(), &[("grant_type", "password")]);
        assert_eq!(
            Endpoint::Refresh.fixed_query(),
            &[("grant_type", "refresh_token")]
        );
        assert_eq!(Endpoint::User.method(), Method::GET);
        assert_eq!(Endpoint::UpdateUser.method(), Method::PUT);
        assert_eq!(Endpoint::UpdateUser.path(), Endpoint::User.path());
        assert!(Endpoint::Recover.fixed_query().is_empty());
    }

    #[test]
    fn request_debug_redacts_secrets() {
        let request = ProviderRequest::new(Endpoint::SignIn)
            .with_payload(json!({ "email": "ana@example.com", "password": "hunter22" }))
            .with_bearer(SecretString::from("session-token".to_string()));

        let rendered = format!("{request:?}");
        assert!(!rendered.contains("hunter22"));
        assert!(!rendered.contains("ana@example.com"));
        assert!(!rendered.contains("session-token"));
        assert!(rendered.contains("password"));
    }

    #[test]
    fn response_success_range() {
        assert!(ProviderResponse::new(200, Value::Null).is_success());
        assert!(ProviderResponse::new(204, Value::Null).is_success());
        assert!(!ProviderResponse::new(301, Value::Null).is_success());
        assert!(!ProviderResponse::new(401, Value::Null).is_success());
    }
}
