use crate::policy::{
    NormalizedEmail, PolicyConfig, Rejection, ResolvedUser, SocialIdentity, username,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Query flag appended to the login URL when a social signup is refused.
pub const INVALID_DOMAIN_FLAG: &str = "invalid_domain=1";

/// Provider-specific payload that may carry the email when the profile does not.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraData {
    #[serde(default)]
    pub email: Option<String>,
}

/// Profile returned by the identity provider after a successful social login.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SocialLoginProfile {
    pub provider: String,
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub extra_data: ExtraData,
}

impl SocialLoginProfile {
    #[must_use]
    pub fn identity(&self) -> SocialIdentity {
        SocialIdentity::new(self.provider.clone(), self.uid.clone())
    }

    /// Trimmed, lower-cased profile email, falling back to the provider's extra data.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        [self.email.as_deref(), self.extra_data.email.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|email| !email.is_empty())
            .map(str::to_lowercase)
    }
}

/// Where to send a user whose social signup was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRedirect {
    pub location: String,
}

impl SignupRedirect {
    /// Login URL with the `invalid_domain=1` flag added to its query.
    #[must_use]
    pub fn invalid_domain(login_url: &str) -> Self {
        let separator = if login_url.contains('?') { '&' } else { '?' };
        Self {
            location: format!("{login_url}{separator}{INVALID_DOMAIN_FLAG}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocialRejection {
    #[error("social signup redirected to {}", .0.location)]
    Redirect(SignupRedirect),
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

/// Username and email as populated from a social profile, before any domain check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulatedUser {
    pub username: String,
    pub email: Option<String>,
}

/// Gate a social signup on the profile email's domain.
///
/// # Errors
/// A redirect to the login page when the email is missing or outside the domain.
pub fn is_open_for_signup(
    config: &PolicyConfig,
    profile: &SocialLoginProfile,
) -> Result<NormalizedEmail, SignupRedirect> {
    let email = profile.email();
    config.email_policy().validate(email.as_deref()).map_err(|rejection| {
        info!(
            provider = %profile.provider,
            reason = rejection.code(),
            "social signup refused"
        );
        SignupRedirect::invalid_domain(config.login_url())
    })
}

/// Fill in the username from a social profile: the email if any, otherwise
/// `<provider>_<uid>`, suffixed while taken.
///
/// # Errors
/// `NoIdentitySource` when the profile has neither an email nor a provider/uid pair.
pub fn populate_user<F>(profile: &SocialLoginProfile, is_taken: F) -> Result<PopulatedUser, Rejection>
where
    F: FnMut(&str) -> bool,
{
    let email = profile.email();
    let identity = profile.identity();
    let username = username::assign(email.as_deref(), Some(&identity), is_taken)?;
    Ok(PopulatedUser { username, email })
}

/// Full social signup: domain gate, then username population.
///
/// # Errors
/// `SocialRejection::Redirect` for refused emails, `SocialRejection::Rejected` when
/// no username can be derived.
#[instrument(skip(config, profile, is_taken), fields(provider = %profile.provider))]
pub fn signup<F>(
    config: &PolicyConfig,
    profile: &SocialLoginProfile,
    is_taken: F,
) -> Result<ResolvedUser, SocialRejection>
where
    F: FnMut(&str) -> bool,
{
    let email = is_open_for_signup(config, profile).map_err(SocialRejection::Redirect)?;
    let populated = populate_user(profile, is_taken)?;
    Ok(ResolvedUser::new(populated.username, email))
}
