//! Map validated CLI arguments to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::policy;
use crate::policy::{DEFAULT_ALLOWED_DOMAIN, DEFAULT_LOGIN_URL};
use anyhow::Result;
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches.get_one::<String>("dsn").cloned();
    let db_password = matches
        .get_one::<String>("db-password")
        .map(|password| SecretString::from(password.clone()));

    if db_password.is_some() && dsn.is_none() {
        return Err(anyhow::anyhow!(
            "--db-password requires --dsn to be set"
        ));
    }

    let allowed_domain = matches
        .get_one::<String>(policy::ARG_ALLOWED_DOMAIN)
        .cloned()
        .unwrap_or_else(|| DEFAULT_ALLOWED_DOMAIN.to_string());
    let login_url = matches
        .get_one::<String>(policy::ARG_LOGIN_URL)
        .cloned()
        .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());

    Ok(Action::Server(Args {
        port,
        dsn,
        db_password,
        allowed_domain,
        login_url,
    }))
}
