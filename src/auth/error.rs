use crate::provider::TransportError;
use thiserror::Error;

/// Result of every controller operation.
pub type AuthResult<T> = Result<T, AuthError>;

/// Local validation failures, detected before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputViolation {
    #[error("email address is malformed")]
    MalformedEmail,
    #[error("password is empty")]
    EmptyPassword,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("link does not contain a recovery token")]
    MissingRecoveryToken,
    #[error("redirect does not contain a session token")]
    MissingSessionToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(InputViolation),
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("email address has not been confirmed")]
    EmailUnconfirmed,
    #[error("email address is already registered")]
    AlreadyRegistered,
    #[error("recovery link is invalid or has expired")]
    InvalidOrExpired,
    #[error("identity provider is unreachable: {0}")]
    Unreachable(String),
    #[error("identity provider error: {0}")]
    Unknown(String),
    #[error("another authentication request is already in progress")]
    Busy,
    #[error("operation out of order: {0}")]
    InvalidState(&'static str),
}

impl AuthError {
    /// Stable reason code for display layers and logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailUnconfirmed => "email_unconfirmed",
            Self::AlreadyRegistered => "already_registered",
            Self::InvalidOrExpired => "invalid_or_expired",
            Self::Unreachable(_) => "unreachable",
            Self::Unknown(_) => "unknown",
            Self::Busy => "busy",
            Self::InvalidState(_) => "invalid_state",
        }
    }
}

impl From<InputViolation> for AuthError {
    fn from(violation: InputViolation) -> Self {
        Self::InvalidInput(violation)
    }
}

impl From<TransportError> for AuthError {
    fn from(err: TransportError) -> Self {
        Self::Unreachable(err.to_string())
    }
}
