//! Allowed-domain check for signup emails.

use super::Rejection;
use std::fmt;
use tracing::debug;

/// A lower-cased email that passed [`SignupEmailPolicy::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedEmail(String);

impl NormalizedEmail {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for NormalizedEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a configured domain: trim, drop a leading `@`, lower-case.
#[must_use]
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches('@').to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupEmailPolicy {
    domain: String,
    suffix: String,
}

impl SignupEmailPolicy {
    #[must_use]
    pub fn new(allowed_domain: &str) -> Self {
        let domain = normalize_domain(allowed_domain);
        let suffix = format!("@{domain}");
        Self { domain, suffix }
    }

    #[must_use]
    pub fn allowed_domain(&self) -> &str {
        &self.domain
    }

    /// Accept `email` only if it ends with `@<allowed-domain>`, ignoring case.
    ///
    /// # Errors
    /// `MissingEmail` for `None` or an empty string, `DisallowedDomain` when the
    /// suffix does not match. Subdomains of the allowed domain do not match.
    pub fn validate(&self, email: Option<&str>) -> Result<NormalizedEmail, Rejection> {
        let email = email
            .filter(|email| !email.is_empty())
            .ok_or(Rejection::MissingEmail)?;

        let normalized = email.to_lowercase();
        if !normalized.ends_with(&self.suffix) {
            debug!(domain = %self.domain, "signup email outside allowed domain");
            return Err(Rejection::DisallowedDomain {
                domain: self.domain.clone(),
            });
        }

        Ok(NormalizedEmail(normalized))
    }
}
