//! # Signup policy
//!
//! Two stateless pieces decide whether a signup may proceed and which username
//! the new account receives:
//!
//! - [`SignupEmailPolicy`] accepts only emails under the configured domain
//!   (exact suffix `@<domain>`, case-insensitive, no subdomains).
//! - [`username::assign`] derives the username from the email, falling back to
//!   `<provider>_<external_id>` for social signups without an email, and appends
//!   a random `_xxxxx` suffix while the name is taken.
//!
//! Neither touches storage. Uniqueness is checked through a caller-supplied
//! `is_taken` callback, and the username returned is only guaranteed free at
//! check time; the store's unique constraint settles concurrent signups.

pub mod email;
pub mod username;

pub use email::{NormalizedEmail, SignupEmailPolicy, normalize_domain};
pub use username::{
    Candidates, SUFFIX_LEN, TRUNCATE_LEN, assign, assign_with_rng, base_identity,
    collision_prefix, is_candidate_of,
};

use thiserror::Error;

pub const DEFAULT_ALLOWED_DOMAIN: &str = "vit.edu";
pub const DEFAULT_LOGIN_URL: &str = "/accounts/login/";

/// Reasons a signup attempt is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Email is required.")]
    MissingEmail,
    #[error("You must sign up using your @{domain} email address.")]
    DisallowedDomain { domain: String },
    #[error("No email or social identity available to derive a username.")]
    NoIdentitySource,
}

impl Rejection {
    /// Stable machine-readable code used in API error bodies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingEmail => "missing_email",
            Self::DisallowedDomain { .. } => "disallowed_domain",
            Self::NoIdentitySource => "no_identity_source",
        }
    }
}

/// `(provider, external_id)` pair handed over by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialIdentity {
    pub provider: String,
    pub external_id: String,
}

impl SocialIdentity {
    #[must_use]
    pub fn new(provider: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            external_id: external_id.into(),
        }
    }

    /// Username seed used when the provider gave no email: `<provider>_<external_id>`.
    /// `None` when either half is empty.
    #[must_use]
    pub fn seed(&self) -> Option<String> {
        if self.provider.is_empty() || self.external_id.is_empty() {
            return None;
        }
        Some(format!("{}_{}", self.provider, self.external_id))
    }
}

/// Raw input of a single signup request, from a password form or a social profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupCandidate {
    pub email: Option<String>,
    pub raw_username: Option<String>,
    pub provider: Option<String>,
    pub external_id: Option<String>,
}

impl SignupCandidate {
    /// The social identity, present only when both provider and external id are set.
    #[must_use]
    pub fn social_identity(&self) -> Option<SocialIdentity> {
        match (&self.provider, &self.external_id) {
            (Some(provider), Some(external_id)) => {
                Some(SocialIdentity::new(provider.clone(), external_id.clone()))
            }
            _ => None,
        }
    }
}

/// Account data ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub username: String,
    pub email: String,
}

impl ResolvedUser {
    #[must_use]
    pub fn new(username: String, email: NormalizedEmail) -> Self {
        Self {
            username,
            email: email.into_inner(),
        }
    }
}

/// Runtime policy settings shared by the adapters and the HTTP hooks.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    email_policy: SignupEmailPolicy,
    login_url: String,
}

impl PolicyConfig {
    #[must_use]
    pub fn new(allowed_domain: &str) -> Self {
        Self {
            email_policy: SignupEmailPolicy::new(allowed_domain),
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    #[must_use]
    pub const fn email_policy(&self) -> &SignupEmailPolicy {
        &self.email_policy
    }

    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_DOMAIN)
    }
}
