use super::handlers::{self, ErrorBody, UserCreated, health, signup};
use crate::adapter::social::{ExtraData, SocialLoginProfile};
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        signup::validate_email,
        signup::account,
        handlers::social::social,
    ),
    components(schemas(
        health::Health,
        signup::EmailCheck,
        signup::EmailAccepted,
        signup::AccountSignup,
        SocialLoginProfile,
        ExtraData,
        UserCreated,
        ErrorBody,
    )),
    tags(
        (name = "health", description = "Service and user store status"),
        (name = "signup", description = "Domain-restricted signup hooks")
    )
)]
pub struct ApiDoc;

// axum handler serving the generated document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
