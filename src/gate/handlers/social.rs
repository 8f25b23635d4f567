use super::{ErrorBody, SignupError, UserCreated, valid_email};
use crate::{
    adapter::social::{self as social_adapter, SocialLoginProfile},
    policy::{PolicyConfig, username},
    store::{InsertOutcome, UserStore},
};
use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;
use tracing::{info, instrument};

#[utoipa::path(
    post,
    path= "/v1/signup/social",
    request_body = SocialLoginProfile,
    responses (
        (status = 201, description = "Account created from the social profile", body = UserCreated, content_type = "application/json"),
        (status = 303, description = "Email missing or outside the allowed domain, redirect to login with invalid_domain=1"),
        (status = 400, description = "Profile email is malformed", body = ErrorBody),
        (status = 409, description = "Account for this email or social identity already exists", body = ErrorBody),
        (status = 422, description = "No email or provider identity to derive a username", body = ErrorBody),
    ),
    tag= "signup"
)]
// axum handler for social (OAuth) signups
#[instrument(skip(store, config, payload))]
pub async fn social(
    store: Extension<UserStore>,
    config: Extension<Arc<PolicyConfig>>,
    payload: Option<Json<SocialLoginProfile>>,
) -> Result<(StatusCode, Json<UserCreated>), SignupError> {
    let Some(Json(profile)) = payload else {
        return Err(SignupError::MissingPayload);
    };

    if profile.email().is_some_and(|email| !valid_email(&email)) {
        return Err(SignupError::InvalidEmail);
    }

    let email = social_adapter::is_open_for_signup(&config, &profile)?;

    if store.email_exists(email.as_str()).await? {
        return Err(SignupError::AlreadyExists);
    }

    let identity = profile.identity();
    let base = username::base_identity(Some(email.as_str()), Some(&identity))?;
    let taken = store.usernames_sharing(&base).await?;
    let user = social_adapter::signup(&config, &profile, |name| taken.contains(name))?;

    match store.insert(&user, Some(&identity)).await? {
        InsertOutcome::Created => {
            info!(username = %user.username, provider = %identity.provider, "social account created");
            Ok((StatusCode::CREATED, Json(user.into())))
        }
        InsertOutcome::Conflict => Err(SignupError::AlreadyExists),
    }
}
