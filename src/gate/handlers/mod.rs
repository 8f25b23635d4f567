pub mod health;
pub use self::health::health;

pub mod signup;
pub use self::signup::{account, validate_email};

pub mod social;
pub use self::social::social;

// common types for the handlers
use crate::{
    adapter::social::{SignupRedirect, SocialRejection},
    policy::{Rejection, ResolvedUser},
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

/// Basic `local@host.tld` format check on already-trimmed input.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Trim submitted emails the way form fields do; blank becomes `None`.
pub(crate) fn trimmed(email: Option<String>) -> Option<String> {
    email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct UserCreated {
    pub username: String,
    pub email: String,
}

impl From<ResolvedUser> for UserCreated {
    fn from(user: ResolvedUser) -> Self {
        Self {
            username: user.username,
            email: user.email,
        }
    }
}

/// Failures a signup hook reports back to the authentication framework.
#[derive(Debug)]
pub enum SignupError {
    MissingPayload,
    InvalidEmail,
    Rejected(Rejection),
    Redirect(SignupRedirect),
    AlreadyExists,
    Internal(anyhow::Error),
}

impl From<Rejection> for SignupError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<SignupRedirect> for SignupError {
    fn from(redirect: SignupRedirect) -> Self {
        Self::Redirect(redirect)
    }
}

impl From<SocialRejection> for SignupError {
    fn from(rejection: SocialRejection) -> Self {
        match rejection {
            SocialRejection::Redirect(redirect) => Self::Redirect(redirect),
            SocialRejection::Rejected(rejection) => Self::Rejected(rejection),
        }
    }
}

impl From<anyhow::Error> for SignupError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl SignupError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::MissingPayload => (
                StatusCode::BAD_REQUEST,
                "missing_payload",
                "Missing payload".to_string(),
            ),
            Self::InvalidEmail => (
                StatusCode::BAD_REQUEST,
                "invalid_email",
                "Enter a valid email address.".to_string(),
            ),
            Self::Rejected(rejection) => {
                let status = match rejection {
                    Rejection::MissingEmail => StatusCode::BAD_REQUEST,
                    Rejection::DisallowedDomain { .. } => StatusCode::FORBIDDEN,
                    Rejection::NoIdentitySource => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, rejection.code(), rejection.to_string())
            }
            Self::Redirect(redirect) => (
                StatusCode::SEE_OTHER,
                "invalid_domain",
                redirect.location.clone(),
            ),
            Self::AlreadyExists => (
                StatusCode::CONFLICT,
                "already_exists",
                "User already exists".to_string(),
            ),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Error creating user".to_string(),
            ),
        }
    }
}

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(err) => error!("Signup failed: {err:?}"),
            Self::Redirect(redirect) => return Redirect::to(&redirect.location).into_response(),
            _ => {}
        }

        let (status, code, message) = self.parts();
        let body = ErrorBody {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
