//! Session and identity snapshots. A `Session` is the only value that proves a
//! signed-in user; an `Identity` is what a recovery credential resolves to and
//! carries no token at all. Token fields are skipped when serializing so
//! snapshots can be handed to display layers as-is.

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifetime assumed when the provider omits both `expires_at` and `expires_in`.
const DEFAULT_SESSION_SECONDS: i64 = 3600;

#[derive(Clone, Debug, Serialize)]
pub struct Session {
    user_id: String,
    email: String,
    #[serde(skip_serializing)]
    access_token: SecretString,
    #[serde(skip_serializing)]
    refresh_token: Option<SecretString>,
    expires_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        access_token: SecretString,
        refresh_token: Option<SecretString>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Build a session from a token-grant response body.
    /// Returns `None` when the body lacks an access token or a user id.
    #[must_use]
    pub fn from_token_response(body: &Value, now: DateTime<Utc>) -> Option<Self> {
        let payload: TokenPayload = serde_json::from_value(body.clone()).ok()?;
        if payload.access_token.trim().is_empty() || payload.user.id.trim().is_empty() {
            return None;
        }

        let expires_at = payload
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                TimeDelta::try_seconds(payload.expires_in.unwrap_or(DEFAULT_SESSION_SECONDS))
                    .and_then(|lifetime| now.checked_add_signed(lifetime))
            })?;

        Some(Self {
            user_id: payload.user.id,
            email: payload.user.email.unwrap_or_default(),
            access_token: SecretString::from(payload.access_token),
            refresh_token: payload
                .refresh_token
                .filter(|token| !token.trim().is_empty())
                .map(SecretString::from),
            expires_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    #[must_use]
    pub const fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// The account a recovery credential belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename(deserialize = "id"))]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
}

impl Identity {
    #[must_use]
    pub fn from_user_response(body: &Value) -> Option<Self> {
        serde_json::from_value::<Self>(body.clone())
            .ok()
            .filter(|identity| !identity.user_id.trim().is_empty())
    }
}

/// Email allowlist deciding who may open the admin dashboard.
#[derive(Clone, Debug, Default)]
pub struct AdminPolicy {
    emails: Vec<String>,
}

impl AdminPolicy {
    #[must_use]
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|email| email.as_ref().trim().to_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn allows(&self, session: &Session) -> bool {
        let email = session.email().trim().to_lowercase();
        !email.is_empty() && self.emails.iter().any(|admin| *admin == email)
    }
}

#[derive(Deserialize)]
struct TokenPayload {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserPayload,
}

#[derive(Deserialize)]
struct UserPayload {
    id: String,
    email: Option<String>,
}
