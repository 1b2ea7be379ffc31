//! Provider error translation. Newer provider releases answer with a machine
//! readable `error_code`; older ones (and some self-hosted gateways) only send
//! a human message. Codes are looked up first, then the message is matched
//! against known phrases, and anything left is `unknown` with the message kept.

use super::error::AuthError;
use crate::provider::ProviderResponse;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mapped {
    InvalidCredentials,
    EmailUnconfirmed,
    AlreadyRegistered,
    InvalidOrExpired,
}

impl From<Mapped> for AuthError {
    fn from(mapped: Mapped) -> Self {
        match mapped {
            Mapped::InvalidCredentials => Self::InvalidCredentials,
            Mapped::EmailUnconfirmed => Self::EmailUnconfirmed,
            Mapped::AlreadyRegistered => Self::AlreadyRegistered,
            Mapped::InvalidOrExpired => Self::InvalidOrExpired,
        }
    }
}

const ERROR_CODES: &[(&str, Mapped)] = &[
    ("invalid_credentials", Mapped::InvalidCredentials),
    ("email_not_confirmed", Mapped::EmailUnconfirmed),
    ("user_already_exists", Mapped::AlreadyRegistered),
    ("email_exists", Mapped::AlreadyRegistered),
    ("otp_expired", Mapped::InvalidOrExpired),
    ("bad_jwt", Mapped::InvalidOrExpired),
    ("session_not_found", Mapped::InvalidOrExpired),
    ("session_expired", Mapped::InvalidOrExpired),
    ("refresh_token_not_found", Mapped::InvalidOrExpired),
    ("refresh_token_already_used", Mapped::InvalidOrExpired),
];

// Lowercased phrases, matched as substrings of the provider message.
const ERROR_PHRASES: &[(&str, Mapped)] = &[
    ("invalid login credentials", Mapped::InvalidCredentials),
    ("email not confirmed", Mapped::EmailUnconfirmed),
    ("already registered", Mapped::AlreadyRegistered),
    ("already been registered", Mapped::AlreadyRegistered),
    ("token has expired", Mapped::InvalidOrExpired),
    ("invalid refresh token", Mapped::InvalidOrExpired),
];

/// Map a non-success provider answer onto the error taxonomy.
#[must_use]
pub fn map_provider_error(response: &ProviderResponse) -> AuthError {
    if let Some(code) = error_code(&response.body) {
        if let Some((_, mapped)) = ERROR_CODES.iter().find(|(known, _)| *known == code) {
            return (*mapped).into();
        }
    }

    let message = error_message(&response.body);

    if let Some(message) = &message {
        let lowered = message.to_lowercase();
        if let Some((_, mapped)) = ERROR_PHRASES
            .iter()
            .find(|(phrase, _)| lowered.contains(phrase))
        {
            return (*mapped).into();
        }
    }

    // Gateway answers mean the provider itself was not reached.
    if matches!(response.status, 502..=504) {
        return AuthError::Unreachable(
            message.unwrap_or_else(|| format!("provider gateway returned {}", response.status)),
        );
    }

    AuthError::Unknown(message.unwrap_or_else(|| failed_status(response)))
}

/// `map_provider_error` narrowed to what a password sign-in can report:
/// anything outside `invalid_credentials | email_unconfirmed | unreachable`
/// is `unknown` with the provider message kept.
#[must_use]
pub fn map_sign_in_error(response: &ProviderResponse) -> AuthError {
    match map_provider_error(response) {
        err @ (AuthError::InvalidCredentials
        | AuthError::EmailUnconfirmed
        | AuthError::Unreachable(_)
        | AuthError::Unknown(_)) => err,
        _ => AuthError::Unknown(
            error_message(&response.body).unwrap_or_else(|| failed_status(response)),
        ),
    }
}

fn failed_status(response: &ProviderResponse) -> String {
    format!("request failed ({})", response.status)
}

fn error_code(body: &Value) -> Option<&str> {
    body.get("error_code")
        .and_then(Value::as_str)
        .or_else(|| body.get("code").and_then(Value::as_str))
}

fn error_message(body: &Value) -> Option<String> {
    if let Some(text) = body.as_str() {
        return Some(text.to_string()).filter(|text| !text.trim().is_empty());
    }

    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: Value) -> ProviderResponse {
        ProviderResponse::new(status, body)
    }

    #[test]
    fn known_codes_win_over_messages() {
        let err = map_provider_error(&response(
            400,
            json!({ "code": 400, "error_code": "email_not_confirmed", "msg": "Invalid login credentials" }),
        ));
        assert_eq!(err, AuthError::EmailUnconfirmed);

        let err = map_provider_error(&response(
            422,
            json!({ "error_code": "user_already_exists", "msg": "User already registered" }),
        ));
        assert_eq!(err, AuthError::AlreadyRegistered);

        let err = map_provider_error(&response(403, json!({ "error_code": "otp_expired" })));
        assert_eq!(err, AuthError::InvalidOrExpired);
    }

    #[test]
    fn falls_back_to_message_phrases() {
        let err = map_provider_error(&response(
            400,
            json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" }),
        ));
        assert_eq!(err, AuthError::InvalidCredentials);

        let err = map_provider_error(&response(
            400,
            json!({ "error": "invalid_grant", "error_description": "Email not confirmed" }),
        ));
        assert_eq!(err, AuthError::EmailUnconfirmed);

        let err = map_provider_error(&response(400, json!({ "msg": "User already registered" })));
        assert_eq!(err, AuthError::AlreadyRegistered);
    }

    #[test]
    fn unmapped_errors_keep_message() {
        let err = map_provider_error(&response(
            429,
            json!({ "error_code": "over_email_send_rate_limit", "msg": "Email rate limit exceeded" }),
        ));
        assert_eq!(err, AuthError::Unknown("Email rate limit exceeded".to_string()));

        let err = map_provider_error(&response(500, Value::Null));
        assert_eq!(err, AuthError::Unknown("request failed (500)".to_string()));
    }

    #[test]
    fn gateway_errors_are_unreachable() {
        let err = map_provider_error(&response(503, Value::String("Service Unavailable".into())));
        assert_eq!(err, AuthError::Unreachable("Service Unavailable".to_string()));

        let err = map_provider_error(&response(502, Value::Null));
        assert_eq!(err.reason(), "unreachable");
    }

    #[test]
    fn sign_in_errors_stay_within_sign_in_reasons() {
        let err = map_sign_in_error(&response(
            400,
            json!({ "error_code": "bad_jwt", "msg": "invalid JWT" }),
        ));
        assert_eq!(err, AuthError::Unknown("invalid JWT".to_string()));

        let err = map_sign_in_error(&response(400, json!({ "msg": "Token has expired" })));
        assert_eq!(err, AuthError::Unknown("Token has expired".to_string()));

        let err = map_sign_in_error(&response(422, json!({ "error_code": "email_exists" })));
        assert_eq!(err, AuthError::Unknown("request failed (422)".to_string()));

        let err = map_sign_in_error(&response(
            400,
            json!({ "error_code": "invalid_credentials", "msg": "Invalid login credentials" }),
        ));
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn numeric_code_is_ignored() {
        assert_eq!(error_code(&json!({ "code": 400 })), None);
        assert_eq!(
            error_code(&json!({ "code": "bad_jwt" })),
            Some("bad_jwt")
        );
    }
}
