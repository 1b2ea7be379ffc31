//! Third-party sign-in. The provider runs the whole OAuth dance; the client
//! only needs the authorize URL to send the user to. The redirect lands back
//! on the site with the token grant in the URL fragment, which
//! `SessionAuthController::complete_oauth_redirect` turns into a session.

use super::{ProviderConfig, TransportError};
use std::{fmt, str::FromStr};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            other => Err(format!("unsupported OAuth provider: {other}")),
        }
    }
}

/// Build the provider's authorize URL for `provider`.
///
/// `redirect_to` falls back to the configured redirect URL when omitted.
///
/// # Errors
/// Returns `TransportError::Config` if the resulting URL cannot be parsed.
pub fn authorize_url(
    config: &ProviderConfig,
    provider: OAuthProvider,
    redirect_to: Option<&str>,
) -> Result<Url, TransportError> {
    let mut url = Url::parse(&config.endpoint_url("/auth/v1/authorize"))
        .map_err(|err| TransportError::Config(format!("invalid authorize URL: {err}")))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("provider", provider.as_str());
        if let Some(redirect) = redirect_to.or(config.redirect_url.as_deref()) {
            query.append_pair("redirect_to", redirect);
        }
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> ProviderConfig {
        ProviderConfig::new(
            "https://project.example.com",
            SecretString::from("anon".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!("google".parse::<OAuthProvider>(), Ok(OAuthProvider::Google));
        assert_eq!(" GitHub ".parse::<OAuthProvider>(), Ok(OAuthProvider::Github));
        assert!("facebook".parse::<OAuthProvider>().is_err());
    }

    #[test]
    fn authorize_url_encodes_redirect() {
        let url = authorize_url(
            &config(),
            OAuthProvider::Google,
            Some("https://learn.example.com/course.html"),
        )
        .unwrap();

        assert_eq!(url.path(), "/auth/v1/authorize");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("provider".to_string(), "google".to_string()),
                (
                    "redirect_to".to_string(),
                    "https://learn.example.com/course.html".to_string()
                ),
            ]
        );
    }

    #[test]
    fn authorize_url_uses_configured_redirect() {
        let config = config().with_redirect_url(Some("https://learn.example.com/"));
        let url = authorize_url(&config, OAuthProvider::Github, None).unwrap();
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "redirect_to" && v == "https://learn.example.com/"));
    }

    #[test]
    fn authorize_url_without_redirect() {
        let url = authorize_url(&config(), OAuthProvider::Github, None).unwrap();
        assert_eq!(url.query(), Some("provider=github"));
    }
}
