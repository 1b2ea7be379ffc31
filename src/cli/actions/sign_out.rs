use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub refresh_token: SecretString,
}

/// Restore the session behind `refresh_token` and revoke it.
///
/// # Errors
/// Returns an error if the provider cannot be reached or refuses the revoke.
pub async fn execute(args: Args) -> Result<()> {
    let controller = args.globals.controller(Some(args.refresh_token))?;

    if controller
        .bootstrap()
        .await
        .context("failed to restore session")?
        .is_none()
    {
        info!("stored session already expired or revoked");
        println!("Signed out.");
        return Ok(());
    }

    controller.sign_out().await.context("sign-out failed")?;
    println!("Signed out.");

    Ok(())
}
