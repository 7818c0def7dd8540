use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;

/// Daily consulting window, stored as "HH:MM" labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
        }
    }
}

pub fn default_available_days() -> Vec<String> {
    ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

pub fn default_slot_duration() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub email: String,
    pub phone: String,
    pub qualification: Option<String>,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub consultation_fee: f64,
    #[serde(default = "default_available_days")]
    pub available_days: Vec<String>,
    #[serde(default)]
    pub working_hours: WorkingHours,
    #[serde(default = "default_slot_duration")]
    pub slot_duration: u32,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Creation payload. Required fields are optional here so absence maps to a
/// 400 naming the field.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<u32>,
    pub consultation_fee: Option<f64>,
    pub available_days: Option<Vec<String>>,
    pub working_hours: Option<WorkingHours>,
    pub slot_duration: Option<u32>,
    pub image_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<u32>,
    pub consultation_fee: Option<f64>,
    pub available_days: Option<Vec<String>>,
    pub working_hours: Option<WorkingHours>,
    pub slot_duration: Option<u32>,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorListQuery {
    pub specialization: Option<String>,
}

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor with this email already exists")]
    DuplicateEmail,

    #[error(transparent)]
    Store(#[from] StoreError),
}
