use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::handlers;

/// Token issuance is public: the call page fetches a token before the
/// user is necessarily signed in on this origin.
pub fn rtc_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/token", get(handlers::issue_rtc_token))
        .with_state(state)
}
