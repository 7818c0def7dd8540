use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::StoreClient;
use shared_models::auth::{AuthUser, UserRecord};
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Middleware for authentication. Validates the bearer token and resolves the
/// user record so downstream handlers always see a user that still exists.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Extract token from headers
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    let token = &auth_value[7..];

    let claims = validate_token(token, &config.jwt_secret).map_err(|e| {
        debug!("Token rejected: {}", e);
        AppError::Auth("Invalid or expired token".to_string())
    })?;

    // The token may outlive the account; re-resolve against the store.
    let store = StoreClient::new(&config);
    let record = store
        .find_one::<UserRecord>("users", &format!("id=eq.{}", claims.sub))
        .await
        .map_err(|e| {
            debug!("User lookup failed during auth: {}", e);
            AppError::Auth("Invalid or expired token".to_string())
        })?;

    let user = match record {
        Some(record) => AuthUser::from(record),
        None => {
            debug!("Token subject {} has no matching user", claims.sub);
            return Err(AppError::Auth("Invalid or expired token".to_string()));
        }
    };

    // Add user to request extensions
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Middleware for admin-only routes. Must run after `auth_middleware`.
pub async fn require_admin(
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))?;

    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
