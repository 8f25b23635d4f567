//! User persistence behind the signup hooks.
//!
//! `UserStore` dispatches to `PostgreSQL` in production or to an in-process map
//! for tests and local runs. Both enforce unique usernames and unique emails at
//! insert time; a lost race surfaces as [`InsertOutcome::Conflict`].

mod memory;
mod postgres;

pub use memory::MemoryUsers;

use crate::policy::{ResolvedUser, SocialIdentity};
use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{collections::HashSet, time::Duration};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    Conflict,
}

#[derive(Debug, Clone)]
pub enum UserStore {
    Postgres(PgPool),
    Memory(MemoryUsers),
}

impl UserStore {
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemoryUsers::default())
    }

    /// Connect to `PostgreSQL` and make sure the `users` table exists.
    ///
    /// # Errors
    /// Returns an error if the pool cannot connect or the schema cannot be applied.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        postgres::ensure_schema(&pool)
            .await
            .context("Failed to apply users schema")?;

        Ok(Self::Postgres(pool))
    }

    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Whether `username` is already registered.
    ///
    /// # Errors
    /// Returns an error if the backend query fails.
    pub async fn exists(&self, username: &str) -> Result<bool> {
        match self {
            Self::Postgres(pool) => postgres::username_exists(pool, username).await,
            Self::Memory(users) => users.contains_username(username),
        }
    }

    /// Whether an account with `email` already exists.
    ///
    /// # Errors
    /// Returns an error if the backend query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        match self {
            Self::Postgres(pool) => postgres::email_exists(pool, email).await,
            Self::Memory(users) => users.contains_email(email),
        }
    }

    /// Persist a resolved user, optionally linked to a social identity.
    ///
    /// # Errors
    /// Returns an error for backend failures other than a uniqueness conflict.
    pub async fn insert(
        &self,
        user: &ResolvedUser,
        social: Option<&SocialIdentity>,
    ) -> Result<InsertOutcome> {
        match self {
            Self::Postgres(pool) => postgres::insert_user(pool, user, social).await,
            Self::Memory(users) => users.insert(user, social),
        }
    }

    /// Cheap liveness probe used by `/health`.
    ///
    /// # Errors
    /// Returns an error if the backend is unreachable.
    pub async fn ping(&self) -> Result<()> {
        match self {
            Self::Postgres(pool) => postgres::ping(pool).await,
            Self::Memory(users) => users.count().map(|_| ()),
        }
    }

    /// Usernames already held by `base` or any of its suffixed candidates.
    ///
    /// The signup hooks check candidates against this set, so one query covers
    /// the whole collision loop.
    ///
    /// # Errors
    /// Returns an error if the backend query fails.
    #[instrument(skip(self))]
    pub async fn usernames_sharing(&self, base: &str) -> Result<HashSet<String>> {
        let taken = match self {
            Self::Postgres(pool) => postgres::usernames_sharing(pool, base).await?,
            Self::Memory(users) => users.usernames_sharing(base)?,
        };
        debug!(taken = taken.len(), "username candidates in use");
        Ok(taken)
    }
}
