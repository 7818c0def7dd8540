use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Deserialize)]
pub struct RtcTokenQuery {
    #[serde(rename = "channelName")]
    pub channel_name: Option<String>,
    pub uid: Option<u32>,
}

/// Everything the browser client needs to join the call.
#[derive(Debug, Serialize)]
pub struct RtcTokenResponse {
    pub token: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    #[serde(rename = "channelName")]
    pub channel_name: String,
    pub uid: u32,
}

#[derive(Error, Debug)]
pub enum RtcError {
    #[error("Channel name is required")]
    MissingChannel,

    #[error("Agora credentials not configured")]
    NotConfigured,

    #[error("Failed to generate token: {0}")]
    Signing(String),
}
