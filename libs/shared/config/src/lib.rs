use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub database_url: String,
    pub database_service_key: String,
    pub agora_app_id: String,
    pub agora_app_certificate: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_URL not set, using empty value");
                    String::new()
                }),
            database_service_key: env::var("DATABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            agora_app_id: env::var("AGORA_APP_ID")
                .unwrap_or_else(|_| {
                    warn!("AGORA_APP_ID not set, using empty value");
                    String::new()
                }),
            agora_app_certificate: env::var("AGORA_APP_CERTIFICATE")
                .unwrap_or_else(|_| {
                    warn!("AGORA_APP_CERTIFICATE not set, using empty value");
                    String::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty() && !self.database_url.is_empty()
    }

    pub fn is_rtc_configured(&self) -> bool {
        !self.agora_app_id.is_empty() && !self.agora_app_certificate.is_empty()
    }
}
