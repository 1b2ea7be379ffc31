//! Sessions handed back after third-party sign-in.
//!
//! The provider finishes the OAuth exchange and redirects to the site with the
//! token grant in the fragment:
//! `#access_token=...&expires_in=3600&refresh_token=...&token_type=bearer`.
//! The fragment carries no user, so the controller resolves the access token
//! against the current-user endpoint before building a `Session`.

use super::{
    link::{find_param, LinkParts},
    session::Session,
};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::fmt;

#[derive(Clone, Default)]
pub struct SessionRedirect {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    /// Error reported by the provider instead of a token grant.
    pub error: Option<String>,
}

impl SessionRedirect {
    #[must_use]
    pub fn parse(redirect_url: &str) -> Self {
        let parts = LinkParts::split(redirect_url);
        let lookup = |name: &str| parts.fragment_then_query().find_map(|q| find_param(q, name));

        let error = lookup("error_description")
            .or_else(|| lookup("error_code"))
            .or_else(|| lookup("error"))
            .map(|text| text.replace('+', " "));

        Self {
            access_token: lookup("access_token").map(SecretString::from),
            refresh_token: lookup("refresh_token").map(SecretString::from),
            expires_in: lookup("expires_in").and_then(|value| value.parse().ok()),
            expires_at: lookup("expires_at").and_then(|value| value.parse().ok()),
            error,
        }
    }

    #[must_use]
    pub const fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    /// Combine the grant with the user the access token belongs to.
    #[must_use]
    pub fn into_session(self, user: &Value, now: DateTime<Utc>) -> Option<Session> {
        let access_token = self.access_token?;
        let body = json!({
            "access_token": access_token.expose_secret(),
            "refresh_token": self.refresh_token.as_ref().map(|token| token.expose_secret()),
            "expires_in": self.expires_in,
            "expires_at": self.expires_at,
            "user": user,
        });
        Session::from_token_response(&body, now)
    }
}

impl fmt::Debug for SessionRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRedirect")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("error", &self.error)
            .finish()
    }
}
