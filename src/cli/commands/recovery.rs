use super::session::ARG_EMAIL;
use clap::{Arg, Command};

pub const CMD_RESET_PASSWORD: &str = "reset-password";
pub const CMD_RECOVER: &str = "recover";
pub const CMD_EXTRACT_TOKEN: &str = "extract-token";

pub const ARG_LINK: &str = "link";
pub const ARG_NEW_PASSWORD: &str = "new-password";

fn link_arg() -> Arg {
    Arg::new(ARG_LINK)
        .short('l')
        .long(ARG_LINK)
        .help("Recovery link as received by email")
        .env("CLASSGATE_RECOVERY_LINK")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_RESET_PASSWORD)
                .about("Email a password recovery link")
                .arg(
                    Arg::new(ARG_EMAIL)
                        .short('e')
                        .long(ARG_EMAIL)
                        .help("Account email address")
                        .env("CLASSGATE_EMAIL")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(CMD_RECOVER)
                .about("Set a new password from a recovery link")
                .arg(link_arg())
                .arg(
                    Arg::new(ARG_NEW_PASSWORD)
                        .long(ARG_NEW_PASSWORD)
                        .help("The new password")
                        .env("CLASSGATE_NEW_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(CMD_EXTRACT_TOKEN)
                .about("Check a recovery link and print the credential it carries")
                .arg(link_arg()),
        )
}
