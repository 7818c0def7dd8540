use std::sync::Arc;

use axum::extract::{Json, Query, State};
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{RtcError, RtcTokenQuery, RtcTokenResponse};
use crate::services::RtcTokenService;

fn map_rtc_error(err: RtcError) -> AppError {
    match err {
        RtcError::MissingChannel => AppError::BadRequest("Channel name is required".to_string()),
        RtcError::NotConfigured => {
            error!("Call token requested but Agora credentials are not configured");
            AppError::Internal("Agora credentials not configured".to_string())
        }
        RtcError::Signing(e) => {
            error!("Call token signing failed: {}", e);
            AppError::Internal("Failed to generate token".to_string())
        }
    }
}

#[axum::debug_handler]
pub async fn issue_rtc_token(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<RtcTokenQuery>,
) -> Result<Json<RtcTokenResponse>, AppError> {
    let channel_name = query
        .channel_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| map_rtc_error(RtcError::MissingChannel))?;

    debug!("Issuing call token for channel {}", channel_name);

    let service = RtcTokenService::new(&config).map_err(map_rtc_error)?;
    let (token, uid) = service
        .issue(&channel_name, query.uid)
        .map_err(map_rtc_error)?;

    Ok(Json(RtcTokenResponse {
        token,
        app_id: service.app_id().to_string(),
        channel_name,
        uid,
    }))
}
