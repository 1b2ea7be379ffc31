use crate::provider::config::{normalize_value, DEFAULT_TIMEOUT_SECONDS};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_PROVIDER_URL: &str = "provider-url";
pub const ARG_ANON_KEY: &str = "anon-key";
pub const ARG_REDIRECT_URL: &str = "redirect-url";
pub const ARG_TIMEOUT: &str = "timeout";

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub anon_key: SecretString,
    pub redirect_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Options {
    /// Parse provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the URL or key is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .and_then(|v| normalize_value(v))
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            url: read_required(ARG_PROVIDER_URL)?,
            anon_key: SecretString::from(read_required(ARG_ANON_KEY)?),
            redirect_url: matches
                .get_one::<String>(ARG_REDIRECT_URL)
                .and_then(|v| normalize_value(v)),
            timeout_seconds: matches
                .get_one::<u64>(ARG_TIMEOUT)
                .copied()
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PROVIDER_URL)
                .long(ARG_PROVIDER_URL)
                .help("Identity provider project URL, example: https://<project>.supabase.co")
                .env("CLASSGATE_PROVIDER_URL"),
        )
        .arg(
            Arg::new(ARG_ANON_KEY)
                .long(ARG_ANON_KEY)
                .help("Public (anon) API key of the provider project")
                .env("CLASSGATE_ANON_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_REDIRECT_URL)
                .long(ARG_REDIRECT_URL)
                .help("Page that confirmation and recovery emails link back to")
                .env("CLASSGATE_REDIRECT_URL"),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Provider request timeout in seconds")
                .env("CLASSGATE_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
