use chrono::Utc;
use regex::Regex;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::StoreClient;
use shared_models::auth::{AuthUser, UserRecord, UserRole};
use shared_utils::jwt::issue_token;

use crate::models::{AuthError, AuthResponse, LoginRequest, RegisterRequest};
use crate::services::password::PasswordService;

pub struct AccountService {
    store: StoreClient,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    /// Create a patient account. The role is never caller-settable here;
    /// admin and doctor accounts are provisioned out of band.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let name = request.name.ok_or(AuthError::MissingField("name"))?;
        let email = request.email.ok_or(AuthError::MissingField("email"))?;
        let password = request.password.ok_or(AuthError::MissingField("password"))?;

        if !Self::is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        let email = email.to_lowercase();

        debug!("Registering account for {}", email);

        let existing = self
            .store
            .find_one::<UserRecord>("users", &format!("email=eq.{}", email))
            .await?;
        if existing.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = PasswordService::hash_password(&password)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let record: UserRecord = self
            .store
            .insert(
                "users",
                json!({
                    "id": Uuid::new_v4(),
                    "name": name,
                    "email": email,
                    "password_hash": password_hash,
                    "role": UserRole::Patient.to_string(),
                    "phone": request.phone,
                    "date_of_birth": request.date_of_birth,
                    "address": request.address,
                    "created_at": Utc::now(),
                }),
            )
            .await
            .map_err(|e| match e {
                // The unique index on email can still fire under a lost race.
                shared_database::StoreError::Conflict(_) => AuthError::DuplicateEmail,
                other => AuthError::Store(other),
            })?;

        let token = issue_token(record.id, &record.email, record.role, &self.jwt_secret)
            .map_err(AuthError::Token)?;

        Ok(AuthResponse {
            token,
            user: AuthUser::from(record),
        })
    }

    /// Verify credentials and issue a fresh token. Unknown email and wrong
    /// password are indistinguishable on the wire.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = request.email.ok_or(AuthError::MissingField("email"))?;
        let password = request.password.ok_or(AuthError::MissingField("password"))?;
        let email = email.to_lowercase();

        debug!("Login attempt for {}", email);

        let record = self
            .store
            .find_one::<UserRecord>("users", &format!("email=eq.{}", email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let verified = PasswordService::verify_password(&password, &record.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        if !verified {
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(record.id, &record.email, record.role, &self.jwt_secret)
            .map_err(AuthError::Token)?;

        Ok(AuthResponse {
            token,
            user: AuthUser::from(record),
        })
    }

    fn is_valid_email(email: &str) -> bool {
        let email_regex = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();

        email_regex.is_match(email) && email.len() <= 254
    }
}
