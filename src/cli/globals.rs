use crate::auth::SessionAuthController;
use crate::provider::{HttpTransport, ProviderConfig};
use secrecy::SecretString;
use std::time::Duration;

/// Provider settings shared by every subcommand.
#[derive(Clone)]
pub struct GlobalArgs {
    pub provider_url: String,
    pub anon_key: SecretString,
    pub redirect_url: Option<String>,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(provider_url: String, anon_key: SecretString) -> Self {
        Self {
            provider_url,
            anon_key,
            redirect_url: None,
            timeout: Duration::from_secs(crate::provider::config::DEFAULT_TIMEOUT_SECONDS),
        }
    }

    /// # Errors
    /// Returns an error if the provider URL or key is invalid.
    pub fn provider_config(&self) -> anyhow::Result<ProviderConfig> {
        Ok(ProviderConfig::new(&self.provider_url, self.anon_key.clone())?
            .with_redirect_url(self.redirect_url.as_deref())
            .with_timeout(self.timeout))
    }

    /// Build a controller talking to the configured provider.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn controller(
        &self,
        refresh_seed: Option<SecretString>,
    ) -> anyhow::Result<SessionAuthController<HttpTransport>> {
        let config = self.provider_config()?;
        let redirect_url = config.redirect_url.clone();
        let transport = HttpTransport::new(config)?;

        Ok(SessionAuthController::new(transport)
            .with_redirect_url(redirect_url)
            .with_refresh_seed(refresh_seed))
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("provider_url", &self.provider_url)
            .field("anon_key", &"***")
            .field("redirect_url", &self.redirect_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args() -> GlobalArgs {
        GlobalArgs::new(
            "https://project.example.com".to_string(),
            SecretString::from("anon-secret".to_string()),
        )
    }

    #[test]
    fn test_global_args_debug_masks_key() {
        let debug = format!("{:?}", args());
        assert!(debug.contains("project.example.com"));
        assert!(!debug.contains("anon-secret"));
    }

    #[test]
    fn test_controller_uses_redirect_and_timeout() {
        let mut args = args();
        args.redirect_url = Some(" https://learn.example.com/login.html ".to_string());
        args.timeout = Duration::from_secs(3);

        let config = args.provider_config().unwrap();
        assert_eq!(
            config.redirect_url.as_deref(),
            Some("https://learn.example.com/login.html")
        );
        assert_eq!(config.timeout, Duration::from_secs(3));

        let controller = args.controller(None).unwrap();
        assert!(controller.current_session().is_none());
    }

    #[test]
    fn test_invalid_provider_url() {
        let mut args = args();
        args.provider_url = "ftp://project.example.com".to_string();
        assert!(args.controller(None).is_err());
    }
}
