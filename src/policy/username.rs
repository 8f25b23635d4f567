//! Username derivation with random-suffix collision resolution.
//!
//! The base username is the lower-cased email, or `<provider>_<external_id>`
//! when there is no email. If the base is taken, candidates of the form
//! `<first 25 chars of base>_<5 random [a-z0-9]>` are tried until one is free.

use super::{Rejection, SocialIdentity};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Characters of the base kept in front of a collision suffix.
pub const TRUNCATE_LEN: usize = 25;
/// Length of the random collision suffix.
pub const SUFFIX_LEN: usize = 5;

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Pick the base identity for a new username.
///
/// # Errors
/// `NoIdentitySource` if there is neither a non-empty email nor a complete
/// social identity.
pub fn base_identity(
    email: Option<&str>,
    fallback: Option<&SocialIdentity>,
) -> Result<String, Rejection> {
    if let Some(email) = email.filter(|email| !email.is_empty()) {
        return Ok(email.to_lowercase());
    }

    fallback
        .and_then(SocialIdentity::seed)
        .ok_or(Rejection::NoIdentitySource)
}

/// The part of `base` kept in front of a collision suffix: its first
/// [`TRUNCATE_LEN`] characters.
#[must_use]
pub fn collision_prefix(base: &str) -> String {
    base.chars().take(TRUNCATE_LEN).collect()
}

/// Whether `username` is `base` itself or one of its suffixed candidates.
#[must_use]
pub fn is_candidate_of(base: &str, username: &str) -> bool {
    if username == base {
        return true;
    }

    username
        .strip_prefix(collision_prefix(base).as_str())
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|suffix| suffix.chars().count() == SUFFIX_LEN)
}

/// Endless sequence of username candidates: the base first, then suffixed variants.
///
#[derive(Debug)]
pub struct Candidates<R = StdRng> {
    base: String,
    prefix: String,
    rng: R,
    base_tried: bool,
}

impl Candidates<StdRng> {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_rng(base, StdRng::from_entropy())
    }
}

impl<R: Rng> Candidates<R> {
    pub fn with_rng(base: impl Into<String>, rng: R) -> Self {
        let base = base.into();
        let prefix = collision_prefix(&base);
        Self {
            base,
            prefix,
            rng,
            base_tried: false,
        }
    }

    /// Next candidate; never runs dry.
    pub fn next_candidate(&mut self) -> String {
        if !self.base_tried {
            self.base_tried = true;
            return self.base.clone();
        }

        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(SUFFIX_ALPHABET[self.rng.gen_range(0..SUFFIX_ALPHABET.len())]))
            .collect();
        format!("{}_{suffix}", self.prefix)
    }
}

impl<R: Rng> Iterator for Candidates<R> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_candidate())
    }
}

/// Derive a username that `is_taken` reports as free.
///
/// # Errors
/// `NoIdentitySource` when no base identity can be derived.
pub fn assign<F>(
    email: Option<&str>,
    fallback: Option<&SocialIdentity>,
    is_taken: F,
) -> Result<String, Rejection>
where
    F: FnMut(&str) -> bool,
{
    assign_with_rng(StdRng::from_entropy(), email, fallback, is_taken)
}

/// [`assign`] with an explicit random source for the collision suffix.
///
/// # Errors
/// `NoIdentitySource` when no base identity can be derived.
pub fn assign_with_rng<R, F>(
    rng: R,
    email: Option<&str>,
    fallback: Option<&SocialIdentity>,
    mut is_taken: F,
) -> Result<String, Rejection>
where
    R: Rng,
    F: FnMut(&str) -> bool,
{
    let base = base_identity(email, fallback)?;
    let mut candidates = Candidates::with_rng(base, rng);

    loop {
        let candidate = candidates.next_candidate();
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn suffix_of<'a>(username: &'a str, prefix: &str) -> &'a str {
        username
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or_default()
    }

    #[test]
    fn free_email_is_returned_unchanged() {
        let username = assign(Some("alice@vit.edu"), None, |_| false);
        assert_eq!(username, Ok("alice@vit.edu".to_string()));
    }

    #[test]
    fn email_is_lowercased() {
        let username = assign(Some("Alice@VIT.edu"), None, |_| false);
        assert_eq!(username, Ok("alice@vit.edu".to_string()));
    }

    #[test]
    fn no_identity_source_is_rejected() {
        assert_eq!(assign(None, None, |_| false), Err(Rejection::NoIdentitySource));
        assert_eq!(
            assign(Some(""), None, |_| false),
            Err(Rejection::NoIdentitySource)
        );
    }

    #[test]
    fn social_fallback_is_used_without_email() {
        let identity = SocialIdentity::new("google", "123");
        let username = assign(None, Some(&identity), |name| name != "google_123");
        assert_eq!(username, Ok("google_123".to_string()));
    }

    #[test]
    fn email_wins_over_social_fallback() {
        let identity = SocialIdentity::new("google", "123");
        let username = assign(Some("dave@vit.edu"), Some(&identity), |_| false);
        assert_eq!(username, Ok("dave@vit.edu".to_string()));
    }

    #[test]
    fn taken_base_gets_random_suffix() {
        let taken: HashSet<&str> = HashSet::from(["alice@vit.edu"]);
        let username = assign(Some("alice@vit.edu"), None, |name| taken.contains(name));

        let Ok(username) = username else {
            panic!("expected a username");
        };
        let suffix = suffix_of(&username, "alice@vit.edu");
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
        assert!(!taken.contains(username.as_str()));
    }

    #[test]
    fn long_base_is_truncated_before_suffix() {
        let email = "a.very.long.student.name.for.testing@vit.edu";
        let username = assign(Some(email), None, |name| name == email);

        let Ok(username) = username else {
            panic!("expected a username");
        };
        let prefix: String = email.chars().take(TRUNCATE_LEN).collect();
        assert_eq!(username.chars().count(), TRUNCATE_LEN + 1 + SUFFIX_LEN);
        assert_eq!(suffix_of(&username, &prefix).len(), SUFFIX_LEN);
    }

    #[test]
    fn truncation_counts_characters() {
        let base = "ééééééééééééééééééééééééééééé@vit.edu";
        let mut candidates = Candidates::with_rng(base, StdRng::seed_from_u64(1));
        assert_eq!(candidates.next_candidate(), base);

        let suffixed = candidates.next_candidate();
        assert!(suffixed.starts_with(&"é".repeat(TRUNCATE_LEN)));
        assert_eq!(suffixed.chars().count(), TRUNCATE_LEN + 1 + SUFFIX_LEN);
    }

    #[test]
    fn loop_retries_until_free() {
        let mut attempts = 0;
        let username = assign_with_rng(
            StdRng::seed_from_u64(7),
            Some("erin@vit.edu"),
            None,
            |_| {
                attempts += 1;
                attempts <= 3
            },
        );

        assert_eq!(attempts, 4);
        let Ok(username) = username else {
            panic!("expected a username");
        };
        assert!(username.starts_with("erin@vit.edu_"));
    }

    #[test]
    fn candidates_are_recognized_by_prefix() {
        let base = "a.very.long.student.name.for.testing@vit.edu";
        let candidates = Candidates::with_rng(base, StdRng::seed_from_u64(3));
        for candidate in candidates.take(5) {
            assert!(is_candidate_of(base, &candidate), "{candidate}");
        }

        assert!(!is_candidate_of(base, "a.very.long.student.name.f_abc"));
        assert!(!is_candidate_of("kim@vit.edu", "kim@vit.edu.au"));
        assert!(!is_candidate_of("kim@vit.edu", "kim@vit.edu_abcdef"));
        assert!(is_candidate_of("kim@vit.edu", "kim@vit.edu_ab12z"));
    }

    #[test]
    fn seeded_candidates_are_deterministic() {
        let first: Vec<String> =
            Candidates::with_rng("frank@vit.edu", StdRng::seed_from_u64(9))
                .take(4)
                .collect();
        let second: Vec<String> =
            Candidates::with_rng("frank@vit.edu", StdRng::seed_from_u64(9))
                .take(4)
                .collect();

        assert_eq!(first, second);
        assert_eq!(first[0], "frank@vit.edu");
    }
}
