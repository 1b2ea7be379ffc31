use clap::{builder::PossibleValuesParser, Arg, ArgAction, Command};

pub const CMD_SESSION: &str = "session";
pub const CMD_SIGN_IN: &str = "sign-in";
pub const CMD_SIGN_UP: &str = "sign-up";
pub const CMD_SIGN_OUT: &str = "sign-out";
pub const CMD_AUTHORIZE_URL: &str = "authorize-url";
pub const CMD_OAUTH_CALLBACK: &str = "oauth-callback";

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_CONFIRM_PASSWORD: &str = "confirm-password";
pub const ARG_NAME: &str = "name";
pub const ARG_REFRESH_TOKEN: &str = "refresh-token";
pub const ARG_ADMIN_EMAIL: &str = "admin-email";
pub const ARG_OAUTH_PROVIDER: &str = "provider";
pub const ARG_REDIRECT_TO: &str = "redirect-to";
pub const ARG_CALLBACK_URL: &str = "callback-url";

fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long(ARG_EMAIL)
        .help("Account email address")
        .env("CLASSGATE_EMAIL")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('p')
        .long(ARG_PASSWORD)
        .help("Account password")
        .env("CLASSGATE_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

fn refresh_token_arg() -> Arg {
    Arg::new(ARG_REFRESH_TOKEN)
        .long(ARG_REFRESH_TOKEN)
        .help("Refresh token of a stored session")
        .env("CLASSGATE_REFRESH_TOKEN")
        .hide_env_values(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_SESSION)
                .about("Restore a stored session and print it")
                .arg(refresh_token_arg())
                .arg(
                    Arg::new(ARG_ADMIN_EMAIL)
                        .long(ARG_ADMIN_EMAIL)
                        .help("Email allowed into the admin dashboard (comma separated or repeated)")
                        .env("CLASSGATE_ADMIN_EMAILS")
                        .value_delimiter(',')
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new(CMD_SIGN_IN)
                .about("Sign in with email and password")
                .arg(email_arg())
                .arg(password_arg()),
        )
        .subcommand(
            Command::new(CMD_SIGN_UP)
                .about("Create an account; the provider emails a confirmation link")
                .arg(email_arg())
                .arg(password_arg())
                .arg(
                    Arg::new(ARG_CONFIRM_PASSWORD)
                        .long(ARG_CONFIRM_PASSWORD)
                        .help("Password confirmation, must match --password")
                        .env("CLASSGATE_CONFIRM_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_NAME)
                        .short('n')
                        .long(ARG_NAME)
                        .help("Display name stored with the account"),
                ),
        )
        .subcommand(
            Command::new(CMD_SIGN_OUT)
                .about("Revoke a stored session")
                .arg(refresh_token_arg().required(true)),
        )
        .subcommand(
            Command::new(CMD_AUTHORIZE_URL)
                .about("Print the third-party sign-in URL")
                .arg(
                    Arg::new(ARG_OAUTH_PROVIDER)
                        .long(ARG_OAUTH_PROVIDER)
                        .help("OAuth provider")
                        .value_parser(PossibleValuesParser::new(["google", "github"]))
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_REDIRECT_TO)
                        .long(ARG_REDIRECT_TO)
                        .help("Page to return to after sign-in (default: --redirect-url)"),
                ),
        )
        .subcommand(
            Command::new(CMD_OAUTH_CALLBACK)
                .about("Finish a third-party sign-in from the URL the provider redirected to")
                .arg(
                    Arg::new(ARG_CALLBACK_URL)
                        .long(ARG_CALLBACK_URL)
                        .help("Redirect URL including its #access_token=... fragment")
                        .env("CLASSGATE_CALLBACK_URL")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
}
