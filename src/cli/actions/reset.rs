use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
}

/// # Errors
/// Returns an error if the email is malformed or the provider cannot be reached.
pub async fn execute(args: Args) -> Result<()> {
    let controller = args.globals.controller(None)?;

    controller
        .request_password_reset(&args.email)
        .await
        .context("password reset request failed")?;

    // Same answer whether or not the account exists.
    println!(
        "If an account exists for {}, a recovery link is on its way.",
        args.email.trim()
    );

    Ok(())
}
