//! Provider endpoint configuration. The project URL and the public (anon) API
//! key identify the provider project; the key is public in browser builds but
//! is still kept in a `SecretString` so it never shows up in logs.

use super::TransportError;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

/// Default request timeout applied to every provider call.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub base_url: Url,
    pub anon_key: SecretString,
    pub redirect_url: Option<String>,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Build a config from the project URL and anon key.
    ///
    /// # Errors
    /// Returns `TransportError::Config` if the URL is not an absolute http(s)
    /// URL or the key is empty.
    pub fn new(base_url: &str, anon_key: SecretString) -> Result<Self, TransportError> {
        let trimmed = base_url.trim();
        let base_url = Url::parse(trimmed)
            .map_err(|err| TransportError::Config(format!("invalid provider URL: {err}")))?;

        match base_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(TransportError::Config(format!(
                    "unsupported provider URL scheme: {scheme}"
                )))
            }
        }

        if anon_key.expose_secret().trim().is_empty() {
            return Err(TransportError::Config(
                "provider anon key is empty".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            anon_key,
            redirect_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        })
    }

    #[must_use]
    pub fn with_redirect_url(mut self, redirect_url: Option<&str>) -> Self {
        self.redirect_url = redirect_url.and_then(normalize_value);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join an endpoint path onto the project URL, keeping any path prefix the
    /// project URL carries (self-hosted deployments often sit behind one).
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim();

        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    }
}

/// Trim a configured value and treat blanks as absent.
#[must_use]
pub fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
