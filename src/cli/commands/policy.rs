use crate::policy::{DEFAULT_ALLOWED_DOMAIN, DEFAULT_LOGIN_URL, normalize_domain};
use clap::{Arg, Command, builder::ValueParser};
use regex::Regex;

pub const ARG_ALLOWED_DOMAIN: &str = "allowed-domain";
pub const ARG_LOGIN_URL: &str = "login-url";

/// Accepts a hostname such as `vit.edu` or `@VIT.edu` and normalizes it.
#[must_use]
pub fn validator_domain() -> ValueParser {
    ValueParser::from(move |domain: &str| -> std::result::Result<String, String> {
        let normalized = normalize_domain(domain);
        let hostname = Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)+$")
            .map_err(|e| e.to_string())?;

        if hostname.is_match(&normalized) {
            Ok(normalized)
        } else {
            Err(format!("invalid domain: {domain}"))
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ALLOWED_DOMAIN)
                .long(ARG_ALLOWED_DOMAIN)
                .help("Only emails under this domain may sign up")
                .env("SIGNUP_GATE_ALLOWED_DOMAIN")
                .default_value(DEFAULT_ALLOWED_DOMAIN)
                .value_parser(validator_domain()),
        )
        .arg(
            Arg::new(ARG_LOGIN_URL)
                .long(ARG_LOGIN_URL)
                .help("Login page refused social signups are redirected to")
                .env("SIGNUP_GATE_LOGIN_URL")
                .default_value(DEFAULT_LOGIN_URL),
        )
}
