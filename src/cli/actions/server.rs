use crate::{cli::globals::GlobalArgs, gate, policy::PolicyConfig, store::UserStore};
use anyhow::Result;
use secrecy::SecretString;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub db_password: Option<SecretString>,
    pub allowed_domain: String,
    pub login_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database cannot be reached or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let mut globals = GlobalArgs::new(args.dsn);

    if let Some(password) = args.db_password {
        globals.set_db_password(password);
    }

    debug!("Global args: {:?}", globals);

    let store = if let Some(dsn) = globals.database_url()? {
        UserStore::connect(&dsn).await?
    } else {
        warn!("No DSN configured, users are kept in memory");
        UserStore::memory()
    };

    let config = PolicyConfig::new(&args.allowed_domain).with_login_url(args.login_url);

    gate::new(args.port, store, config).await
}
