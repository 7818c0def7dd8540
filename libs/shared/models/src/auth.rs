use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Patient,
    Admin,
    Doctor,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Patient
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Patient => write!(f, "patient"),
            UserRole::Admin => write!(f, "admin"),
            UserRole::Doctor => write!(f, "doctor"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(UserRole::Patient),
            "admin" => Ok(UserRole::Admin),
            "doctor" => Ok(UserRole::Doctor),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Full user record as persisted in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: UserRole,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Sanitized identity attached to authenticated requests. Never carries
/// the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<UserRecord> for AuthUser {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            role: record.role,
            phone: record.phone,
            date_of_birth: record.date_of_birth,
            address: record.address,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_wire_strings() {
        for (role, wire) in [
            (UserRole::Patient, "patient"),
            (UserRole::Admin, "admin"),
            (UserRole::Doctor, "doctor"),
        ] {
            assert_eq!(role.to_string(), wire);
            assert_eq!(wire.parse::<UserRole>().unwrap(), role);
        }
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn auth_user_drops_password_hash() {
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: "Pat Example".to_string(),
            email: "pat@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: UserRole::Patient,
            phone: None,
            date_of_birth: None,
            address: None,
            created_at: Utc::now(),
        };

        let user: AuthUser = record.clone().into();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "pat@example.com");
        assert_eq!(user.id, record.id);
    }
}
