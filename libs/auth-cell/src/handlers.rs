use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    Extension,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{AuthError, AuthResponse, LoginRequest, RegisterRequest};
use crate::services::AccountService;

fn map_auth_error(err: AuthError) -> AppError {
    match err {
        AuthError::MissingField(field) => {
            AppError::BadRequest(format!("Missing required field: {}", field))
        }
        AuthError::InvalidEmail => AppError::BadRequest("Invalid email address".to_string()),
        AuthError::DuplicateEmail => AppError::Conflict("Email already registered".to_string()),
        AuthError::InvalidCredentials => AppError::Auth("Invalid credentials".to_string()),
        AuthError::Hashing(e) => AppError::Internal(e),
        AuthError::Token(e) => AppError::Internal(e),
        AuthError::Store(e) => AppError::Database(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn register(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    debug!("Handling registration");

    let service = AccountService::new(&config);
    let response = service.register(request).await.map_err(map_auth_error)?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    debug!("Handling login");

    let service = AccountService::new(&config);
    let response = service.login(request).await.map_err(map_auth_error)?;

    Ok(Json(response))
}

/// Echo the identity resolved by the auth middleware.
#[axum::debug_handler]
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
    debug!("Returning profile for user: {}", user.id);
    Json(user)
}
