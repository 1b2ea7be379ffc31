use crate::auth::Session;
use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
}

/// Sign in and print the session together with its refresh token, which is
/// what `session` and `sign-out` take as `--refresh-token`.
///
/// # Errors
/// Returns an error if the credentials are rejected or the provider cannot be reached.
pub async fn execute(args: Args) -> Result<()> {
    let controller = args.globals.controller(None)?;

    let session = controller
        .sign_in(&args.email, args.password.expose_secret())
        .await
        .context("sign-in failed")?;

    print_session(&session)
}

/// Print a session snapshot with the refresh token needed to restore it.
///
/// # Errors
/// Returns an error if the output cannot be serialized.
pub fn print_session(session: &Session) -> Result<()> {
    let refresh_token = session
        .refresh_token()
        .map(|token| token.expose_secret().to_string());
    let output = json!({
        "session": session,
        "refresh_token": refresh_token,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
