//! # Classgate (course platform session client)
//!
//! `classgate` owns the client-visible authentication state of the course
//! platform. Credential storage, password hashing and token issuance belong to
//! the hosted identity provider; this crate mediates every call to it and keeps
//! the resulting session in one place.
//!
//! ## Sessions
//!
//! A [`auth::SessionAuthController`] holds at most one active [`auth::Session`].
//! Consumers never write it; they subscribe to read-only snapshots.
//!
//! ## Password recovery
//!
//! Recovery runs as an explicit state machine
//! (`Idle -> LinkRequested -> CredentialExtracted -> CredentialValidated -> PasswordUpdated`).
//! The recovery credential is a single-purpose bearer token and is never
//! promoted to a session: after a reset the user signs in again.

pub mod auth;
pub mod cli;
pub mod provider;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
