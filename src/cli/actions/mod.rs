pub mod authorize;
pub mod recover;
pub mod reset;
pub mod session;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

// Internal "interpreter" for `Action`, kept apart so this module stays small.
mod run;

#[derive(Debug)]
pub enum Action {
    Session(session::Args),
    SignIn(sign_in::Args),
    SignUp(sign_up::Args),
    SignOut(sign_out::Args),
    AuthorizeUrl(authorize::Args),
    OAuthCallback(authorize::CallbackArgs),
    ResetPassword(reset::Args),
    Recover(recover::Args),
    ExtractToken(recover::ExtractArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
