use super::InsertOutcome;
use crate::policy::{ResolvedUser, SocialIdentity, is_candidate_of};
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredUser {
    email: String,
    social: Option<SocialIdentity>,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, StoredUser>,
    emails: HashSet<String>,
    identities: HashSet<(String, String)>,
}

/// In-process user table. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryUsers {
    state: Arc<Mutex<State>>,
}

impl MemoryUsers {
    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory user store lock poisoned"))
    }

    pub(super) fn contains_username(&self, username: &str) -> Result<bool> {
        Ok(self.lock()?.users.contains_key(username))
    }

    pub(super) fn usernames_sharing(&self, base: &str) -> Result<HashSet<String>> {
        Ok(self
            .lock()?
            .users
            .keys()
            .filter(|username| is_candidate_of(base, username))
            .cloned()
            .collect())
    }

    pub(super) fn contains_email(&self, email: &str) -> Result<bool> {
        Ok(self.lock()?.emails.contains(email))
    }

    pub(super) fn insert(
        &self,
        user: &ResolvedUser,
        social: Option<&SocialIdentity>,
    ) -> Result<InsertOutcome> {
        let mut state = self.lock()?;
        let identity = social.map(|social| (social.provider.clone(), social.external_id.clone()));
        if state.users.contains_key(&user.username)
            || state.emails.contains(&user.email)
            || identity
                .as_ref()
                .is_some_and(|identity| state.identities.contains(identity))
        {
            return Ok(InsertOutcome::Conflict);
        }

        if let Some(identity) = identity {
            state.identities.insert(identity);
        }
        state.emails.insert(user.email.clone());
        state.users.insert(
            user.username.clone(),
            StoredUser {
                email: user.email.clone(),
                social: social.cloned(),
            },
        );
        Ok(InsertOutcome::Created)
    }

    /// Number of stored users.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn count(&self) -> Result<usize> {
        Ok(self.lock()?.users.len())
    }

    /// Email registered for `username`, if any.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn email_of(&self, username: &str) -> Result<Option<String>> {
        Ok(self
            .lock()?
            .users
            .get(username)
            .map(|stored| stored.email.clone()))
    }

    /// Social identity linked to `username`, if any.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn social_of(&self, username: &str) -> Result<Option<SocialIdentity>> {
        Ok(self
            .lock()?
            .users
            .get(username)
            .and_then(|stored| stored.social.clone()))
    }
}
