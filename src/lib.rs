//! # Signup Gate
//!
//! `signup-gate` restricts self-service account creation to a single email
//! domain (by default `vit.edu`) and assigns every new account a unique
//! username.
//!
//! ## Flows
//!
//! - **Password signup:** the submitted email is validated against the allowed
//!   domain and becomes the username.
//! - **Social signup:** a provider profile is checked the same way. Refused
//!   logins are redirected to the login page with `invalid_domain=1`.
//!   Profiles without an email fall back to `provider_externalId` as the
//!   username seed.
//!
//! When the preferred username is taken, a random 5-character suffix is
//! appended to the first 25 characters of the base until a free name is found.
//!
//! ## Storage
//!
//! Users live in `PostgreSQL` (see `sql/schema.sql`) or, when no DSN is
//! configured, in an in-memory store that is lost on restart.

pub mod adapter;
pub mod cli;
pub mod gate;
pub mod policy;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
