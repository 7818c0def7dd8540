use chrono::Utc;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StoreClient, StoreError};

use crate::models::{
    default_available_days, default_slot_duration, CreateDoctorRequest, Doctor, DoctorError,
    UpdateDoctorRequest,
};

pub struct DirectoryService {
    store: StoreClient,
}

impl DirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
        }
    }

    /// Active doctors, optionally narrowed by a case-insensitive
    /// specialization substring, sorted by name.
    pub async fn list_doctors(
        &self,
        specialization: Option<&str>,
    ) -> Result<Vec<Doctor>, DoctorError> {
        let mut query_parts = vec!["is_active=eq.true".to_string()];
        if let Some(specialization) = specialization {
            // Literal % wildcards must be escaped or the URL parser eats them.
            query_parts.push(format!(
                "specialization=ilike.{}",
                urlencoding::encode(&format!("%{}%", specialization))
            ));
        }
        query_parts.push("order=name.asc".to_string());
        let query = query_parts.join("&");

        debug!("Listing doctors: {}", query);
        Ok(self.store.find("doctors", &query).await?)
    }

    /// Fetch by id. Deactivated doctors are still returned so historical
    /// appointment references keep resolving.
    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor profile: {}", doctor_id);

        self.store
            .find_one::<Doctor>("doctors", &format!("id=eq.{}", doctor_id))
            .await?
            .ok_or(DoctorError::NotFound)
    }

    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        let name = request.name.ok_or(DoctorError::MissingField("name"))?;
        let specialization = request
            .specialization
            .ok_or(DoctorError::MissingField("specialization"))?;
        let email = request
            .email
            .ok_or(DoctorError::MissingField("email"))?
            .to_lowercase();
        let phone = request.phone.ok_or(DoctorError::MissingField("phone"))?;

        debug!("Creating doctor profile for {}", email);

        let existing = self
            .store
            .find_one::<Doctor>("doctors", &format!("email=eq.{}", email))
            .await?;
        if existing.is_some() {
            return Err(DoctorError::DuplicateEmail);
        }

        let doctor: Doctor = self
            .store
            .insert(
                "doctors",
                json!({
                    "id": Uuid::new_v4(),
                    "name": name,
                    "specialization": specialization,
                    "email": email,
                    "phone": phone,
                    "qualification": request.qualification,
                    "experience": request.experience.unwrap_or(0),
                    "consultation_fee": request.consultation_fee.unwrap_or(0.0),
                    "available_days": request.available_days.unwrap_or_else(default_available_days),
                    "working_hours": request.working_hours.unwrap_or_default(),
                    "slot_duration": request.slot_duration.unwrap_or_else(default_slot_duration),
                    "image_url": request.image_url,
                    "bio": request.bio,
                    "is_active": true,
                    "created_at": Utc::now(),
                }),
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => DoctorError::DuplicateEmail,
                other => DoctorError::Store(other),
            })?;

        debug!("Doctor profile created with id {}", doctor.id);
        Ok(doctor)
    }

    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor profile: {}", doctor_id);

        let mut changes = serde_json::Map::new();
        if let Some(name) = request.name {
            changes.insert("name".to_string(), json!(name));
        }
        if let Some(specialization) = request.specialization {
            changes.insert("specialization".to_string(), json!(specialization));
        }
        if let Some(email) = request.email {
            changes.insert("email".to_string(), json!(email.to_lowercase()));
        }
        if let Some(phone) = request.phone {
            changes.insert("phone".to_string(), json!(phone));
        }
        if let Some(qualification) = request.qualification {
            changes.insert("qualification".to_string(), json!(qualification));
        }
        if let Some(experience) = request.experience {
            changes.insert("experience".to_string(), json!(experience));
        }
        if let Some(fee) = request.consultation_fee {
            changes.insert("consultation_fee".to_string(), json!(fee));
        }
        if let Some(days) = request.available_days {
            changes.insert("available_days".to_string(), json!(days));
        }
        if let Some(hours) = request.working_hours {
            changes.insert("working_hours".to_string(), json!(hours));
        }
        if let Some(duration) = request.slot_duration {
            changes.insert("slot_duration".to_string(), json!(duration));
        }
        if let Some(image_url) = request.image_url {
            changes.insert("image_url".to_string(), json!(image_url));
        }
        if let Some(bio) = request.bio {
            changes.insert("bio".to_string(), json!(bio));
        }
        if let Some(is_active) = request.is_active {
            changes.insert("is_active".to_string(), json!(is_active));
        }

        let mut updated: Vec<Doctor> = self
            .store
            .update(
                "doctors",
                &format!("id=eq.{}", doctor_id),
                serde_json::Value::Object(changes),
            )
            .await?;

        if updated.is_empty() {
            return Err(DoctorError::NotFound);
        }
        Ok(updated.remove(0))
    }

    /// Soft delete. The record stays resolvable by id.
    pub async fn deactivate_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        debug!("Deactivating doctor: {}", doctor_id);

        let mut updated: Vec<Doctor> = self
            .store
            .update(
                "doctors",
                &format!("id=eq.{}", doctor_id),
                json!({ "is_active": false }),
            )
            .await?;

        if updated.is_empty() {
            return Err(DoctorError::NotFound);
        }
        Ok(updated.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use crate::models::WorkingHours;

    #[test]
    fn default_working_hours_cover_office_day() {
        let hours = WorkingHours::default();
        assert_eq!(hours.start, "09:00");
        assert_eq!(hours.end, "17:00");
    }
}
