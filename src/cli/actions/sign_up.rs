use crate::auth::SignUpOutcome;
use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub name: Option<String>,
}

/// # Errors
/// Returns an error if the input is invalid, the account exists, or the
/// provider cannot be reached.
pub async fn execute(args: Args) -> Result<()> {
    let controller = args.globals.controller(None)?;

    let outcome = controller
        .sign_up(
            &args.email,
            args.password.expose_secret(),
            args.confirm_password.expose_secret(),
            args.name.as_deref(),
        )
        .await
        .context("sign-up failed")?;

    match outcome {
        SignUpOutcome::ConfirmationPending { email } => {
            println!("Account created. Check {email} for the confirmation link.");
        }
    }

    Ok(())
}
