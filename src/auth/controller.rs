//! The session and recovery controller.
//!
//! One controller exists per process (or page). It is the only writer of the
//! active `Session`; everybody else reads snapshots through `subscribe` or
//! `current_session`. Operations take `&self` and a busy flag rejects a second
//! provider call while one is in flight, so session writes never interleave.
//! Local validation always runs before the busy check and before any network
//! call.
//!
//! Sign-out is the exception to the busy rule: it clears the local session
//! first and only the remote revoke waits on the flag. Every sign-out bumps a
//! generation counter, and a session obtained by a call that started before
//! the bump is never published.

use super::{
    error::{AuthError, AuthResult, InputViolation},
    mapping::{map_provider_error, map_sign_in_error},
    recovery::{RecoveryAttempt, RecoveryCredential, RecoveryFlow, RecoveryLink, RecoveryStage},
    redirect::SessionRedirect,
    session::{Identity, Session},
    validation::{check_email, check_password_length},
};
use crate::provider::{Endpoint, ProviderRequest, ProviderResponse, Transport};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Mutex, MutexGuard, PoisonError,
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Outcome of a successful sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The provider sent a confirmation email; no session exists yet.
    ConfirmationPending { email: String },
}

pub struct SessionAuthController<T> {
    transport: T,
    session: watch::Sender<Option<Session>>,
    seed: Mutex<Option<SecretString>>,
    recovery: Mutex<RecoveryFlow>,
    busy: AtomicBool,
    generation: AtomicU64,
    redirect_url: Option<String>,
}

/// Clears the busy flag when the guarded operation ends, including on early return.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> AuthResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| AuthError::Busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Transport> SessionAuthController<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            transport,
            session,
            seed: Mutex::new(None),
            recovery: Mutex::new(RecoveryFlow::Idle),
            busy: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            redirect_url: None,
        }
    }

    /// Refresh token of a previously stored session, used by `bootstrap`.
    #[must_use]
    pub fn with_refresh_seed(self, seed: Option<SecretString>) -> Self {
        *lock(&self.seed) = seed.filter(|token| !token.expose_secret().trim().is_empty());
        self
    }

    /// Where confirmation and recovery emails should send the user back to.
    #[must_use]
    pub fn with_redirect_url(mut self, redirect_url: Option<String>) -> Self {
        self.redirect_url = redirect_url;
        self
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Read-only feed of session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    /// Snapshot of the active session. An expired session is dropped here.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        let snapshot = self.session.borrow().clone();
        match snapshot {
            Some(session) if session.is_expired(Utc::now()) => {
                debug!("session expired, clearing");
                self.session.send_replace(None);
                None
            }
            other => other,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current_session().is_some()
    }

    #[must_use]
    pub fn recovery_stage(&self) -> RecoveryStage {
        lock(&self.recovery).stage()
    }

    /// Abandon any recovery attempt in progress.
    pub fn reset_recovery(&self) {
        *lock(&self.recovery) = RecoveryFlow::Idle;
    }

    /// Ask the provider for the stored session, if any.
    ///
    /// # Errors
    /// `unreachable` on transport failure, `busy`, or a mapped provider error.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> AuthResult<Option<Session>> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let generation = self.generation();

        let seed = lock(&self.seed).clone();
        let Some(refresh_token) = seed else {
            debug!("no stored session");
            self.set_session(None);
            return Ok(None);
        };

        let result = self.exchange_refresh_token(&refresh_token, generation).await;
        if !matches!(result, Ok(Some(_))) {
            self.set_session(None);
        }
        result
    }

    /// Exchange the active session's refresh token for a new session.
    ///
    /// # Errors
    /// `unreachable` on transport failure, `busy`, or a mapped provider error.
    #[instrument(skip(self))]
    pub async fn refresh_session(&self) -> AuthResult<Option<Session>> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let generation = self.generation();

        let refresh_token = self
            .session
            .borrow()
            .as_ref()
            .and_then(|session| session.refresh_token().cloned());
        let Some(refresh_token) = refresh_token else {
            debug!("no refresh token available");
            return Ok(None);
        };

        let result = self.exchange_refresh_token(&refresh_token, generation).await;
        if matches!(result, Ok(None)) {
            self.set_session(None);
        }
        result
    }

    /// # Errors
    /// `invalid_input` before any network call, then `busy`,
    /// `invalid_credentials`, `email_unconfirmed`, `unreachable` or `unknown`.
    /// `invalid_state` when `sign_out` ran while the request was in flight.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        check_email(email)?;
        if password.is_empty() {
            return Err(InputViolation::EmptyPassword.into());
        }

        let _guard = BusyGuard::acquire(&self.busy)?;
        let generation = self.generation();

        let request = ProviderRequest::new(Endpoint::SignIn)
            .with_payload(json!({ "email": email.trim(), "password": password }));
        let response = self.transport.call(request).await?;

        if !response.is_success() {
            let err = map_sign_in_error(&response);
            info!("sign-in rejected: {}", err.reason());
            return Err(err);
        }

        let session = parse_session(&response)?;
        if !self.publish(generation, &session) {
            return Err(signed_out_during_call());
        }
        info!("signed in");

        Ok(session)
    }

    /// Finish a third-party sign-in from the URL the provider redirected to.
    ///
    /// The access token in the fragment is resolved against the current-user
    /// endpoint; only then is the session stored.
    ///
    /// # Errors
    /// `invalid_input` when the redirect holds no token, `unknown` when it
    /// carries a provider error, then `busy`, `unreachable`,
    /// `invalid_or_expired` when the token is refused, or `invalid_state` when
    /// `sign_out` ran while the request was in flight.
    #[instrument(skip_all)]
    pub async fn complete_oauth_redirect(&self, redirect_url: &str) -> AuthResult<Session> {
        let redirect = SessionRedirect::parse(redirect_url);
        let Some(access_token) = redirect.access_token().cloned() else {
            if let Some(reason) = redirect.error {
                info!("third-party sign-in refused: {}", reason);
                return Err(AuthError::Unknown(reason));
            }
            return Err(InputViolation::MissingSessionToken.into());
        };

        let _guard = BusyGuard::acquire(&self.busy)?;
        let generation = self.generation();

        let request = ProviderRequest::new(Endpoint::User).with_bearer(access_token);
        let response = self.transport.call(request).await?;

        if matches!(response.status, 401 | 403) {
            debug!("redirect token rejected with {}", response.status);
            return Err(AuthError::InvalidOrExpired);
        }
        if !response.is_success() {
            return Err(map_provider_error(&response));
        }

        let session = redirect
            .into_session(&response.body, Utc::now())
            .ok_or_else(|| AuthError::Unknown(describe_malformed(&response.body)))?;
        if !self.publish(generation, &session) {
            return Err(signed_out_during_call());
        }
        info!("signed in through third-party provider");

        Ok(session)
    }

    /// Register a new account. The provider confirms the email out of band, so
    /// no session is established here.
    ///
    /// # Errors
    /// `invalid_input` before any network call, then `busy`,
    /// `already_registered`, `unreachable` or `unknown`.
    #[instrument(skip_all)]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
        display_name: Option<&str>,
    ) -> AuthResult<SignUpOutcome> {
        check_email(email)?;
        check_password_length(password)?;
        if password != confirm_password {
            return Err(InputViolation::PasswordMismatch.into());
        }

        let _guard = BusyGuard::acquire(&self.busy)?;

        let email = email.trim();
        let mut payload = json!({ "email": email, "password": password });
        if let Some(name) = display_name.map(str::trim).filter(|name| !name.is_empty()) {
            payload["data"] = json!({ "full_name": name });
        }

        let response = self
            .transport
            .call(self.with_redirect(ProviderRequest::new(Endpoint::SignUp).with_payload(payload)))
            .await?;

        if !response.is_success() {
            let err = map_provider_error(&response);
            info!("sign-up rejected: {}", err.reason());
            return Err(err);
        }

        info!("sign-up accepted, confirmation pending");
        Ok(SignUpOutcome::ConfirmationPending {
            email: email.to_string(),
        })
    }

    /// Drop the local session and ask the provider to revoke it.
    ///
    /// The local session and stored seed are gone when this returns, whatever
    /// the provider answered and whatever else is in flight. A session that an
    /// in-flight call obtains afterwards is discarded. An `Err` only reports
    /// that the remote revoke failed, or was skipped with `busy` because
    /// another call held the flag.
    ///
    /// # Errors
    /// `busy`, `unreachable`, or a mapped provider error from the revoke call.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> AuthResult<()> {
        let mut previous = None;
        self.session.send_modify(|current| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            *lock(&self.seed) = None;
            previous = current.take();
        });

        let Some(session) = previous else {
            debug!("sign-out without an active session");
            return Ok(());
        };
        info!("signed out locally");

        let Ok(_guard) = BusyGuard::acquire(&self.busy) else {
            warn!("remote sign-out skipped: another request is in flight");
            return Err(AuthError::Busy);
        };

        let request =
            ProviderRequest::new(Endpoint::SignOut).with_bearer(session.access_token().clone());

        match self.transport.call(request).await {
            // 401/404: the provider already forgot this session.
            Ok(response) if response.is_success() || matches!(response.status, 401 | 404) => {
                Ok(())
            }
            Ok(response) => {
                let err = map_provider_error(&response);
                warn!("remote sign-out failed: {}", err);
                Err(err)
            }
            Err(err) => {
                warn!("remote sign-out failed: {}", err);
                Err(err.into())
            }
        }
    }

    /// Ask the provider to email a recovery link. Succeeds whether or not the
    /// address is registered.
    ///
    /// # Errors
    /// `invalid_input` before any network call, then `busy`, `unreachable`
    /// or `unknown`.
    #[instrument(skip_all)]
    pub async fn request_password_reset(&self, email: &str) -> AuthResult<()> {
        check_email(email)?;

        let _guard = BusyGuard::acquire(&self.busy)?;

        let request = self.with_redirect(
            ProviderRequest::new(Endpoint::Recover).with_payload(json!({ "email": email.trim() })),
        );

        match self.transport.call(request).await {
            Ok(response) if response.is_success() => {
                *lock(&self.recovery) = RecoveryFlow::LinkRequested;
                info!("recovery link requested");
                Ok(())
            }
            Ok(response) => Err(self.abort_recovery(map_provider_error(&response))),
            Err(err) => Err(self.abort_recovery(err.into())),
        }
    }

    /// Start a recovery attempt from a pasted link.
    ///
    /// Links usually arrive in a fresh process, so this is accepted from any
    /// stage; a new link replaces an unfinished attempt.
    ///
    /// # Errors
    /// `busy`, `invalid_or_expired` when the link carries a provider error, or
    /// `invalid_input` when it holds no credential.
    #[instrument(skip_all)]
    pub fn begin_recovery(&self, raw_link_text: &str) -> AuthResult<RecoveryCredential> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let link = RecoveryLink::parse(raw_link_text);
        let Some(credential) = link.credential else {
            let err = if let Some(reason) = link.error {
                info!("recovery link carries provider error: {}", reason);
                AuthError::InvalidOrExpired
            } else {
                InputViolation::MissingRecoveryToken.into()
            };
            return Err(self.abort_recovery(err));
        };

        let attempt = RecoveryAttempt::new(raw_link_text, Some(credential.clone()));
        debug!("recovery attempt {} started", attempt.id);
        *lock(&self.recovery) = RecoveryFlow::InProgress(attempt);

        Ok(credential)
    }

    /// Resolve a recovery credential to the account it belongs to.
    ///
    /// # Errors
    /// `invalid_state` unless `credential` was extracted in the current
    /// attempt, `busy`, `unreachable`, or `invalid_or_expired` for any
    /// non-success answer.
    #[instrument(skip_all)]
    pub async fn validate_recovery_credential(
        &self,
        credential: &RecoveryCredential,
    ) -> AuthResult<Identity> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let attempt_id = match &*lock(&self.recovery) {
            RecoveryFlow::InProgress(attempt) if attempt.holds(credential) => Some(attempt.id),
            _ => None,
        };
        let Some(attempt_id) = attempt_id else {
            warn!("recovery validation attempted without an extracted credential");
            return Err(self.abort_recovery(AuthError::InvalidState(
                "credential was not extracted in this recovery attempt",
            )));
        };

        let request = ProviderRequest::new(Endpoint::User).with_bearer(credential.secret().clone());
        let response = match self.transport.call(request).await {
            Ok(response) => response,
            Err(err) => return Err(self.abort_recovery(err.into())),
        };

        if !response.is_success() {
            debug!("recovery credential rejected with {}", response.status);
            return Err(self.abort_recovery(AuthError::InvalidOrExpired));
        }

        let Some(identity) = Identity::from_user_response(&response.body) else {
            return Err(self.abort_recovery(AuthError::Unknown(
                "malformed user response".to_string(),
            )));
        };

        let mut flow = lock(&self.recovery);
        match &mut *flow {
            RecoveryFlow::InProgress(attempt) if attempt.id == attempt_id => {
                attempt.validated = true;
                attempt.identity = Some(identity.clone());
            }
            _ => {
                return Err(AuthError::InvalidState(
                    "recovery attempt changed during validation",
                ))
            }
        }
        info!("recovery credential validated for attempt {}", attempt_id);

        Ok(identity)
    }

    /// Set a new password with a validated recovery credential. No session is
    /// created; the user signs in again afterwards.
    ///
    /// # Errors
    /// `invalid_input` for short passwords, `invalid_state` without a prior
    /// successful validation of the same credential, `busy`, `unreachable`,
    /// `invalid_or_expired` or `unknown`.
    #[instrument(skip_all)]
    pub async fn update_password_with_recovery(
        &self,
        credential: &RecoveryCredential,
        new_password: &str,
    ) -> AuthResult<()> {
        check_password_length(new_password)?;

        let _guard = BusyGuard::acquire(&self.busy)?;

        let validated = matches!(
            &*lock(&self.recovery),
            RecoveryFlow::InProgress(attempt) if attempt.validated && attempt.holds(credential)
        );
        if !validated {
            warn!("password update attempted before credential validation");
            return Err(self.abort_recovery(AuthError::InvalidState(
                "recovery credential has not been validated",
            )));
        }

        let request = ProviderRequest::new(Endpoint::UpdateUser)
            .with_bearer(credential.secret().clone())
            .with_payload(json!({ "password": new_password }));

        let response = match self.transport.call(request).await {
            Ok(response) => response,
            Err(err) => return Err(self.abort_recovery(err.into())),
        };

        if !response.is_success() {
            let err = if matches!(response.status, 401 | 403) {
                AuthError::InvalidOrExpired
            } else {
                map_provider_error(&response)
            };
            return Err(self.abort_recovery(err));
        }

        *lock(&self.recovery) = RecoveryFlow::PasswordUpdated;
        info!("password updated through recovery");

        Ok(())
    }

    async fn exchange_refresh_token(
        &self,
        refresh_token: &SecretString,
        generation: u64,
    ) -> AuthResult<Option<Session>> {
        let request = ProviderRequest::new(Endpoint::Refresh)
            .with_payload(json!({ "refresh_token": refresh_token.expose_secret() }));
        let response = self.transport.call(request).await?;

        if matches!(response.status, 400 | 401 | 403) {
            debug!("stored session rejected with {}", response.status);
            return Ok(None);
        }
        if !response.is_success() {
            return Err(map_provider_error(&response));
        }

        let session = parse_session(&response)?;
        if !self.publish(generation, &session) {
            debug!("signed out while the refresh was in flight");
            return Ok(None);
        }

        Ok(Some(session))
    }

    fn with_redirect(&self, request: ProviderRequest) -> ProviderRequest {
        match &self.redirect_url {
            Some(redirect) => request.with_query("redirect_to", redirect.clone()),
            None => request,
        }
    }

    fn set_session(&self, session: Option<Session>) {
        self.session.send_replace(session);
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store `session` and its refresh token unless a sign-out happened since
    /// `generation` was read. Runs under the channel's write lock, the same
    /// lock `sign_out` clears under.
    fn publish(&self, generation: u64, session: &Session) -> bool {
        self.session.send_if_modified(|current| {
            if self.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            *lock(&self.seed) = session.refresh_token().cloned();
            *current = Some(session.clone());
            true
        })
    }

    /// Return the flow to `Idle` and hand the error back for reporting.
    fn abort_recovery(&self, err: AuthError) -> AuthError {
        debug!("recovery aborted: {}", err.reason());
        *lock(&self.recovery) = RecoveryFlow::Idle;
        err
    }
}

fn signed_out_during_call() -> AuthError {
    AuthError::InvalidState("signed out while the request was in flight")
}

fn parse_session(response: &ProviderResponse) -> AuthResult<Session> {
    Session::from_token_response(&response.body, Utc::now())
        .ok_or_else(|| AuthError::Unknown(describe_malformed(&response.body)))
}

fn describe_malformed(body: &Value) -> String {
    if body.is_null() {
        "empty session response".to_string()
    } else {
        "malformed session response".to_string()
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
