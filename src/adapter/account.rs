use crate::policy::{
    NormalizedEmail, Rejection, ResolvedUser, SignupCandidate, SignupEmailPolicy, username,
};
use tracing::{debug, instrument};

/// Form-level email validation for password signups.
///
/// # Errors
/// Propagates the policy rejection (`MissingEmail`, `DisallowedDomain`).
pub fn clean_email(
    policy: &SignupEmailPolicy,
    email: Option<&str>,
) -> Result<NormalizedEmail, Rejection> {
    policy.validate(email)
}

/// Resolve the account for a password signup: username equals the validated email,
/// suffixed when taken. The form's own username field is ignored.
///
/// # Errors
/// Returns the rejection from [`clean_email`].
#[instrument(skip(policy, candidate, is_taken))]
pub fn save_user<F>(
    policy: &SignupEmailPolicy,
    candidate: &SignupCandidate,
    is_taken: F,
) -> Result<ResolvedUser, Rejection>
where
    F: FnMut(&str) -> bool,
{
    let email = clean_email(policy, candidate.email.as_deref())?;

    if candidate.raw_username.as_deref().is_some_and(|raw| !raw.is_empty()) {
        debug!("ignoring form username, email is the username");
    }

    let username = username::assign(Some(email.as_str()), None, is_taken)?;
    Ok(ResolvedUser::new(username, email))
}
