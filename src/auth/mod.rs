//! Auth feature module covering session bootstrap, password sign-in and
//! sign-up, sign-out, and password recovery. It keeps credential handling out
//! of the view layer and touches security boundaries: passwords, session
//! tokens and recovery credentials must never be logged.
//!
//! Flow Overview: Sign-in stores the provider session in the controller, and so
//! does completing a third-party sign-in redirect.
//! Sign-up only triggers the confirmation email. Recovery goes
//! request link -> paste link -> validate credential -> update password, and
//! ends signed out so the user signs in with the new password.

pub mod controller;
pub mod error;
mod link;
pub mod mapping;
pub mod recovery;
pub mod redirect;
pub mod session;
pub mod validation;

pub use self::controller::{SessionAuthController, SignUpOutcome};
pub use self::error::{AuthError, AuthResult, InputViolation};
pub use self::mapping::{map_provider_error, map_sign_in_error};
pub use self::recovery::{
    extract_recovery_credential, RecoveryAttempt, RecoveryCredential, RecoveryLink, RecoveryStage,
};
pub use self::redirect::SessionRedirect;
pub use self::session::{AdminPolicy, Identity, Session};
