use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL: &str = "session-ttl-seconds";
pub const ARG_TOKEN_TTL: &str = "token-ttl-seconds";
pub const ARG_EVENTS_URL: &str = "events-url";

#[derive(Debug, Clone)]
pub struct Options {
    pub base_url: String,
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub token_ttl_seconds: i64,
    pub events_url: Option<String>,
}

impl Options {
    /// Parse authentication arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // Helper to filter empty strings which clap might pass through if env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let Some(secret) = get_non_empty(ARG_SESSION_SECRET) else {
            anyhow::bail!("missing required argument: --{ARG_SESSION_SECRET}");
        };

        let Some(base_url) = get_non_empty(ARG_BASE_URL) else {
            anyhow::bail!("missing required argument: --{ARG_BASE_URL}");
        };

        Ok(Self {
            base_url,
            session_secret: SecretString::from(secret),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL)
                .copied()
                .unwrap_or(3600),
            token_ttl_seconds: matches
                .get_one::<i64>(ARG_TOKEN_TTL)
                .copied()
                .unwrap_or(86400),
            events_url: get_non_empty(ARG_EVENTS_URL),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_verification_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("HMAC key used to sign and verify session tokens")
                .long_help(
                    "HMAC key used to sign and verify session tokens. Required. Rotating the key invalidates every outstanding session.",
                )
                .env("ATESTI_SESSION_SECRET"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Session token TTL in seconds")
                .env("ATESTI_SESSION_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_verification_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BASE_URL)
                .long(ARG_BASE_URL)
                .help("Base URL used to build email verification links")
                .env("ATESTI_BASE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL)
                .long(ARG_TOKEN_TTL)
                .help("Email verification token TTL in seconds")
                .env("ATESTI_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_EVENTS_URL)
                .long(ARG_EVENTS_URL)
                .help("Endpoint notified after a registration is accepted")
                .env("ATESTI_EVENTS_URL"),
        )
}
