//! Password recovery links and the recovery state machine.
//!
//! Recovery links have changed shape over provider releases. The credential is
//! looked up in this order, first match wins:
//!
//! 1. query parameter `access_token`
//! 2. query parameter `token`
//! 3. the `#` fragment parsed as its own query string, parameter `access_token`
//!
//! Hash-routed pages put a path in front of the fragment query
//! (`#/reset?access_token=...`); a route prefix up to the `?` is ignored. Blank
//! values are skipped and tokens are returned unaltered. A fragment carrying `error`/`error_code` means the
//! provider already refused the link (typically `otp_expired`).
//!
//! Flow Overview:
//! `Idle -> LinkRequested -> CredentialExtracted -> CredentialValidated -> PasswordUpdated -> Idle`.
//! The controller owns the transitions; this module only holds the data.

use super::{
    link::{find_param, LinkParts},
    session::Identity,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;
use ulid::Ulid;

/// Single-purpose bearer token taken from a recovery link.
#[derive(Clone)]
pub struct RecoveryCredential(SecretString);

impl RecoveryCredential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.0
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for RecoveryCredential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for RecoveryCredential {}

impl fmt::Debug for RecoveryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecoveryCredential(***)")
    }
}

/// What a pasted recovery link contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryLink {
    pub credential: Option<RecoveryCredential>,
    /// Error reported by the provider inside the link itself.
    pub error: Option<String>,
}

impl RecoveryLink {
    #[must_use]
    pub fn parse(raw_link_text: &str) -> Self {
        let parts = LinkParts::split(raw_link_text);
        let query = parts.query;

        let credential = query
            .and_then(|q| find_param(q, "access_token"))
            .or_else(|| query.and_then(|q| find_param(q, "token")))
            .or_else(|| parts.fragment.and_then(|q| find_param(q, "access_token")))
            .map(RecoveryCredential::new);

        let error = parts.fragment_then_query().find_map(|q| {
            find_param(q, "error_code")
                .or_else(|| find_param(q, "error_description"))
                .or_else(|| find_param(q, "error"))
        });

        Self { credential, error }
    }
}

/// Pull the recovery credential out of a pasted link. Pure; no network.
#[must_use]
pub fn extract_recovery_credential(raw_link_text: &str) -> Option<RecoveryCredential> {
    RecoveryLink::parse(raw_link_text).credential
}

/// Stage of the recovery flow, rendered by the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStage {
    Idle,
    LinkRequested,
    CredentialExtracted,
    CredentialValidated,
    PasswordUpdated,
}

/// One pass through the recovery flow, from pasted link to password update.
#[derive(Debug, Clone)]
pub struct RecoveryAttempt {
    pub id: Ulid,
    pub raw_link_text: SecretString,
    pub extracted_credential: Option<RecoveryCredential>,
    pub validated: bool,
    pub identity: Option<Identity>,
}

impl RecoveryAttempt {
    #[must_use]
    pub fn new(raw_link_text: &str, credential: Option<RecoveryCredential>) -> Self {
        Self {
            id: Ulid::new(),
            raw_link_text: SecretString::from(raw_link_text.to_string()),
            extracted_credential: credential,
            validated: false,
            identity: None,
        }
    }

    #[must_use]
    pub fn holds(&self, credential: &RecoveryCredential) -> bool {
        self.extracted_credential.as_ref() == Some(credential)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) enum RecoveryFlow {
    #[default]
    Idle,
    LinkRequested,
    InProgress(RecoveryAttempt),
    PasswordUpdated,
}

impl RecoveryFlow {
    pub(crate) const fn stage(&self) -> RecoveryStage {
        match self {
            Self::Idle => RecoveryStage::Idle,
            Self::LinkRequested => RecoveryStage::LinkRequested,
            Self::InProgress(attempt) if attempt.validated => RecoveryStage::CredentialValidated,
            Self::InProgress(_) => RecoveryStage::CredentialExtracted,
            Self::PasswordUpdated => RecoveryStage::PasswordUpdated,
        }
    }
}
