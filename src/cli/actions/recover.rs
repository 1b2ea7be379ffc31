use crate::auth::{AuthError, RecoveryLink};
use crate::cli::globals::GlobalArgs;
use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub link: SecretString,
    pub new_password: SecretString,
}

#[derive(Debug)]
pub struct ExtractArgs {
    pub link: SecretString,
}

/// Run the whole recovery flow for one pasted link: extract the credential,
/// validate it, then set the new password. Ends signed out.
///
/// # Errors
/// Returns an error at the first step that fails.
pub async fn execute(args: Args) -> Result<()> {
    let controller = args.globals.controller(None)?;

    let credential = controller
        .begin_recovery(args.link.expose_secret())
        .context("unusable recovery link")?;

    let identity = controller
        .validate_recovery_credential(&credential)
        .await
        .context("recovery link could not be validated")?;
    info!("recovery credential belongs to user {}", identity.user_id);

    controller
        .update_password_with_recovery(&credential, args.new_password.expose_secret())
        .await
        .context("password update failed")?;

    println!(
        "Password updated for {}. Sign in with the new password.",
        identity.email
    );

    Ok(())
}

/// Print the credential a recovery link carries. Pure; no network.
///
/// # Errors
/// Returns an error if the link carries a provider error or no credential.
pub fn extract(args: &ExtractArgs) -> Result<()> {
    let link = RecoveryLink::parse(args.link.expose_secret());

    if let Some(reason) = link.error {
        bail!("{} ({reason})", AuthError::InvalidOrExpired);
    }
    let Some(credential) = link.credential else {
        bail!("no recovery credential found in link");
    };

    println!("{}", credential.expose());

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(link: &str) -> ExtractArgs {
        ExtractArgs {
            link: SecretString::from(link.to_string()),
        }
    }

    #[test]
    fn extract_accepts_recovery_links() {
        assert!(extract(&args("https://learn.example.com/#access_token=abc&type=recovery")).is_ok());
    }

    #[test]
    fn extract_reports_missing_and_expired_links() {
        let missing = extract(&args("https://learn.example.com/login.html")).unwrap_err();
        assert!(missing.to_string().contains("no recovery credential"));

        let expired =
            extract(&args("https://learn.example.com/#error=access_denied&error_code=otp_expired"))
                .unwrap_err();
        assert!(expired.to_string().contains("otp_expired"));
    }
}
