use super::{ErrorBody, SignupError, UserCreated, trimmed, valid_email};
use crate::{
    adapter::account as account_adapter,
    policy::{PolicyConfig, SignupCandidate, username},
    store::{InsertOutcome, UserStore},
};
use axum::{Json, extract::Extension, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct EmailCheck {
    #[serde(default)]
    email: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct EmailAccepted {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct AccountSignup {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[utoipa::path(
    post,
    path= "/v1/signup/email",
    request_body = EmailCheck,
    responses (
        (status = 200, description = "Email belongs to the allowed domain", body = EmailAccepted, content_type = "application/json"),
        (status = 400, description = "Email missing or malformed", body = ErrorBody),
        (status = 403, description = "Email outside the allowed domain", body = ErrorBody),
    ),
    tag= "signup"
)]
// axum handler for form-level email validation
#[instrument(skip(config, payload))]
pub async fn validate_email(
    config: Extension<Arc<PolicyConfig>>,
    payload: Option<Json<EmailCheck>>,
) -> Result<Json<EmailAccepted>, SignupError> {
    let Some(Json(check)) = payload else {
        return Err(SignupError::MissingPayload);
    };

    let email = trimmed(check.email);
    if email.as_deref().is_some_and(|email| !valid_email(email)) {
        return Err(SignupError::InvalidEmail);
    }

    let email = account_adapter::clean_email(config.email_policy(), email.as_deref())?;

    Ok(Json(EmailAccepted {
        email: email.into_inner(),
    }))
}

#[utoipa::path(
    post,
    path= "/v1/signup/account",
    request_body = AccountSignup,
    responses (
        (status = 201, description = "Account created, username equals the email", body = UserCreated, content_type = "application/json"),
        (status = 400, description = "Email missing or malformed", body = ErrorBody),
        (status = 403, description = "Email outside the allowed domain", body = ErrorBody),
        (status = 409, description = "User with the specified email already exists", body = ErrorBody),
    ),
    tag= "signup"
)]
// axum handler for password signups
#[instrument(skip(store, config, payload))]
pub async fn account(
    store: Extension<UserStore>,
    config: Extension<Arc<PolicyConfig>>,
    payload: Option<Json<AccountSignup>>,
) -> Result<(StatusCode, Json<UserCreated>), SignupError> {
    let Some(Json(form)) = payload else {
        return Err(SignupError::MissingPayload);
    };

    let candidate = SignupCandidate {
        email: trimmed(form.email),
        raw_username: form.username,
        ..SignupCandidate::default()
    };

    if candidate
        .email
        .as_deref()
        .is_some_and(|email| !valid_email(email))
    {
        return Err(SignupError::InvalidEmail);
    }

    let email = account_adapter::clean_email(config.email_policy(), candidate.email.as_deref())?;

    if store.email_exists(email.as_str()).await? {
        debug!("email already registered");
        return Err(SignupError::AlreadyExists);
    }

    let base = username::base_identity(Some(email.as_str()), None)?;
    let taken = store.usernames_sharing(&base).await?;
    let user = account_adapter::save_user(config.email_policy(), &candidate, |name| {
        taken.contains(name)
    })?;

    match store.insert(&user, None).await? {
        InsertOutcome::Created => {
            info!(username = %user.username, "account created");
            Ok((StatusCode::CREATED, Json(user.into())))
        }
        InsertOutcome::Conflict => Err(SignupError::AlreadyExists),
    }
}
