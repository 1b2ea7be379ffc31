//! Password recovery against a mocked identity provider.
//!
//! Flow Overview:
//! 1. Request a recovery link for an email address.
//! 2. Paste the link; the credential is taken from the URL fragment.
//! 3. Validate the credential by looking up the user it belongs to.
//! 4. Set the new password with the credential as bearer.
//! 5. The flow ends signed out.

#![allow(clippy::unwrap_used)]

use classgate::auth::{AuthError, RecoveryStage, SessionAuthController};
use classgate::provider::{HttpTransport, ProviderConfig};
use secrecy::SecretString;
use serde_json::json;
use std::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REDIRECT: &str = "https://learn.example.com/login.html";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn controller(uri: &str) -> SessionAuthController<HttpTransport> {
    let config = ProviderConfig::new(uri, SecretString::from("anon-key".to_string()))
        .unwrap()
        .with_redirect_url(Some(REDIRECT));
    let redirect = config.redirect_url.clone();
    SessionAuthController::new(HttpTransport::new(config).unwrap()).with_redirect_url(redirect)
}

#[tokio::test]
async fn full_recovery_flow_ends_signed_out() {
    if !can_bind_localhost() {
        eprintln!("Skipping integration test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/recover"))
        .and(query_param("redirect_to", REDIRECT))
        .and(header("apikey", "anon-key"))
        .and(body_json(json!({ "email": "ana@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer recovery-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "6a1f0c3e-user",
            "email": "ana@example.com",
            "aud": "authenticated"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer recovery-jwt"))
        .and(body_json(json!({ "password": "new-password" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "6a1f0c3e-user",
            "email": "ana@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller(&server.uri());

    // 1.
    controller.request_password_reset("ana@example.com").await.unwrap();
    assert_eq!(controller.recovery_stage(), RecoveryStage::LinkRequested);

    // 2.
    let credential = controller
        .begin_recovery(&format!(
            "{REDIRECT}#access_token=recovery-jwt&expires_in=3600&refresh_token=r&token_type=bearer&type=recovery"
        ))
        .unwrap();
    assert_eq!(controller.recovery_stage(), RecoveryStage::CredentialExtracted);

    // 3.
    let identity = controller
        .validate_recovery_credential(&credential)
        .await
        .unwrap();
    assert_eq!(identity.user_id, "6a1f0c3e-user");
    assert_eq!(controller.recovery_stage(), RecoveryStage::CredentialValidated);

    // 4.
    controller
        .update_password_with_recovery(&credential, "new-password")
        .await
        .unwrap();

    // 5.
    assert_eq!(controller.recovery_stage(), RecoveryStage::PasswordUpdated);
    assert!(controller.current_session().is_none());
}

#[tokio::test]
async fn expired_credential_is_rejected_and_flow_resets() {
    if !can_bind_localhost() {
        eprintln!("Skipping integration test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": 403,
            "error_code": "bad_jwt",
            "msg": "invalid JWT: unable to parse or verify signature, token has invalid claims: token is expired"
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let controller = controller(&server.uri());
    let credential = controller
        .begin_recovery("https://learn.example.com/login.html?token=expired-jwt")
        .unwrap();

    let err = controller
        .validate_recovery_credential(&credential)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidOrExpired);
    assert_eq!(controller.recovery_stage(), RecoveryStage::Idle);

    let err = controller
        .update_password_with_recovery(&credential, "new-password")
        .await
        .unwrap_err();
    assert_eq!(err.reason(), "invalid_state");
}

#[tokio::test]
async fn link_without_credential_never_calls_the_provider() {
    if !can_bind_localhost() {
        eprintln!("Skipping integration test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let controller = controller(&server.uri());
    let err = controller
        .begin_recovery("https://learn.example.com/login.html?foo=1")
        .unwrap_err();

    assert_eq!(err.reason(), "invalid_input");
    assert_eq!(controller.recovery_stage(), RecoveryStage::Idle);
}
