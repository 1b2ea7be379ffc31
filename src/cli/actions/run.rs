use crate::cli::actions::{
    authorize, recover, reset, session, sign_in, sign_out, sign_up, Action,
};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Session(args) => session::execute(args).await,
        Action::SignIn(args) => sign_in::execute(args).await,
        Action::SignUp(args) => sign_up::execute(args).await,
        Action::SignOut(args) => sign_out::execute(args).await,
        Action::AuthorizeUrl(args) => authorize::execute(&args),
        Action::OAuthCallback(args) => authorize::complete(args).await,
        Action::ResetPassword(args) => reset::execute(args).await,
        Action::Recover(args) => recover::execute(args).await,
        Action::ExtractToken(args) => recover::extract(&args),
    }
}
