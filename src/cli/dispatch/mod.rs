//! Maps validated CLI matches to an [`Action`].

use crate::cli::actions::{
    authorize, recover, reset, session, sign_in, sign_out, sign_up, Action,
};
use crate::cli::commands::{
    provider,
    recovery::{CMD_EXTRACT_TOKEN, CMD_RECOVER, CMD_RESET_PASSWORD, ARG_LINK, ARG_NEW_PASSWORD},
    session::{
        ARG_ADMIN_EMAIL, ARG_CALLBACK_URL, ARG_CONFIRM_PASSWORD, ARG_EMAIL, ARG_NAME,
        ARG_OAUTH_PROVIDER, ARG_PASSWORD, ARG_REDIRECT_TO, ARG_REFRESH_TOKEN, CMD_AUTHORIZE_URL,
        CMD_OAUTH_CALLBACK, CMD_SESSION, CMD_SIGN_IN, CMD_SIGN_OUT, CMD_SIGN_UP,
    },
};
use crate::cli::globals::GlobalArgs;
use crate::provider::config::normalize_value;
use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use std::time::Duration;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or blank.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub) = matches.subcommand().context("missing subcommand")?;

    // extract-token is pure and needs no provider settings
    if name == CMD_EXTRACT_TOKEN {
        return Ok(Action::ExtractToken(recover::ExtractArgs {
            link: secret(sub, ARG_LINK)?,
        }));
    }

    let globals = globals(matches)?;

    let action = match name {
        CMD_SESSION => Action::Session(session::Args {
            globals,
            refresh_token: optional(sub, ARG_REFRESH_TOKEN).map(SecretString::from),
            admin_emails: sub
                .get_many::<String>(ARG_ADMIN_EMAIL)
                .map(|emails| emails.filter_map(|email| normalize_value(email)).collect())
                .unwrap_or_default(),
        }),
        CMD_SIGN_IN => Action::SignIn(sign_in::Args {
            globals,
            email: required(sub, ARG_EMAIL)?,
            password: raw_secret(sub, ARG_PASSWORD)?,
        }),
        CMD_SIGN_UP => Action::SignUp(sign_up::Args {
            globals,
            email: required(sub, ARG_EMAIL)?,
            password: raw_secret(sub, ARG_PASSWORD)?,
            confirm_password: raw_secret(sub, ARG_CONFIRM_PASSWORD)?,
            name: optional(sub, ARG_NAME),
        }),
        CMD_SIGN_OUT => Action::SignOut(sign_out::Args {
            globals,
            refresh_token: secret(sub, ARG_REFRESH_TOKEN)?,
        }),
        CMD_AUTHORIZE_URL => Action::AuthorizeUrl(authorize::Args {
            globals,
            provider: required(sub, ARG_OAUTH_PROVIDER)?,
            redirect_to: optional(sub, ARG_REDIRECT_TO),
        }),
        CMD_OAUTH_CALLBACK => Action::OAuthCallback(authorize::CallbackArgs {
            globals,
            callback_url: secret(sub, ARG_CALLBACK_URL)?,
        }),
        CMD_RESET_PASSWORD => Action::ResetPassword(reset::Args {
            globals,
            email: required(sub, ARG_EMAIL)?,
        }),
        CMD_RECOVER => Action::Recover(recover::Args {
            globals,
            link: secret(sub, ARG_LINK)?,
            new_password: raw_secret(sub, ARG_NEW_PASSWORD)?,
        }),
        other => bail!("unknown subcommand: {other}"),
    };

    Ok(action)
}

fn globals(matches: &ArgMatches) -> Result<GlobalArgs> {
    let options = provider::Options::parse(matches)?;

    let mut globals = GlobalArgs::new(options.url, options.anon_key);
    globals.redirect_url = options.redirect_url;
    globals.timeout = Duration::from_secs(options.timeout_seconds);

    Ok(globals)
}

fn optional(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .and_then(|value| normalize_value(value))
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    optional(matches, id).ok_or_else(|| anyhow!("missing required argument: --{id}"))
}

fn secret(matches: &ArgMatches, id: &str) -> Result<SecretString> {
    required(matches, id).map(SecretString::from)
}

// Passwords are passed through untrimmed; the controller validates them.
fn raw_secret(matches: &ArgMatches, id: &str) -> Result<SecretString> {
    matches
        .get_one::<String>(id)
        .cloned()
        .map(SecretString::from)
        .ok_or_else(|| anyhow!("missing required argument: --{id}"))
}
