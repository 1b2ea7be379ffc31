use super::sign_in::print_session;
use crate::cli::globals::GlobalArgs;
use crate::provider::{oauth::authorize_url, OAuthProvider};
use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub provider: String,
    pub redirect_to: Option<String>,
}

/// Print the provider's authorize URL; no session changes.
///
/// # Errors
/// Returns an error if the provider name or configuration is invalid.
pub fn execute(args: &Args) -> Result<()> {
    let provider: OAuthProvider = args.provider.parse().map_err(|err: String| anyhow!(err))?;
    let config = args.globals.provider_config()?;

    let url = authorize_url(&config, provider, args.redirect_to.as_deref())?;
    println!("{url}");

    Ok(())
}

#[derive(Debug)]
pub struct CallbackArgs {
    pub globals: GlobalArgs,
    pub callback_url: SecretString,
}

/// Turn the provider's redirect back into a session and print it like `sign-in`.
///
/// # Errors
/// Returns an error if the redirect carries no usable token or the provider
/// refuses it.
pub async fn complete(args: CallbackArgs) -> Result<()> {
    let controller = args.globals.controller(None)?;

    let session = controller
        .complete_oauth_redirect(args.callback_url.expose_secret())
        .await
        .context("third-party sign-in failed")?;

    print_session(&session)
}
