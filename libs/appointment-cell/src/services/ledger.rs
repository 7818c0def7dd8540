use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StoreClient, StoreError};
use shared_models::auth::AuthUser;

use crate::models::{
    AdminListQuery, Appointment, AppointmentError, AppointmentListQuery, AppointmentStatus,
    AppointmentWithRefs, BookAppointmentRequest, DoctorSummary, PatientSummary,
};

/// The booking ledger. All writes to the `appointments` collection go
/// through here; the store's partial unique index on
/// (doctor_id, date, time_slot) for status=booked backs the conflict checks.
pub struct AppointmentLedger {
    store: StoreClient,
}

impl AppointmentLedger {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
        }
    }

    pub async fn book(
        &self,
        patient: &AuthUser,
        request: BookAppointmentRequest,
    ) -> Result<AppointmentWithRefs, AppointmentError> {
        let doctor_id = request
            .doctor_id
            .ok_or(AppointmentError::MissingField("doctor_id"))?;
        let date = request.date.ok_or(AppointmentError::MissingField("date"))?;
        let time_slot = request
            .time_slot
            .ok_or(AppointmentError::MissingField("time_slot"))?;

        debug!(
            "Booking request: patient {} with doctor {} at {} ({})",
            patient.id, doctor_id, date, time_slot
        );

        // Inactive doctors are indistinguishable from absent ones here.
        let doctor = self
            .store
            .find_one::<DoctorSummary>(
                "doctors",
                &format!("id=eq.{}&is_active=eq.true", doctor_id),
            )
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        // Advisory probe for the common path. The unique index still decides
        // the race; see the conflict mapping on insert below.
        let clashes: Vec<Appointment> = self
            .store
            .find(
                "appointments",
                &format!(
                    "doctor_id=eq.{}&date=eq.{}&time_slot=eq.{}&status=eq.booked",
                    doctor_id,
                    urlencoding::encode(&date.to_rfc3339()),
                    urlencoding::encode(&time_slot),
                ),
            )
            .await?;
        if !clashes.is_empty() {
            return Err(AppointmentError::SlotTaken);
        }

        if date < Utc::now() {
            return Err(AppointmentError::PastDate);
        }

        let now = Utc::now();
        let appointment: Appointment = self
            .store
            .insert(
                "appointments",
                json!({
                    "id": Uuid::new_v4(),
                    "patient_id": patient.id,
                    "doctor_id": doctor_id,
                    "date": date.to_rfc3339(),
                    "time_slot": time_slot,
                    "status": AppointmentStatus::Booked,
                    "reason": request.reason.unwrap_or_else(|| "General consultation".to_string()),
                    "symptoms": request.symptoms,
                    "notes": request.notes,
                    "cancelled_by": null,
                    "cancelled_at": null,
                    "cancellation_reason": null,
                    "created_at": now.to_rfc3339(),
                    "updated_at": now.to_rfc3339(),
                }),
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    warn!(
                        "Lost booking race for doctor {} at {} ({})",
                        doctor_id, date, time_slot
                    );
                    AppointmentError::SlotTaken
                }
                other => AppointmentError::Store(other),
            })?;

        debug!("Appointment {} booked", appointment.id);
        Ok(AppointmentWithRefs {
            appointment,
            doctor: Some(doctor),
            patient: None,
        })
    }

    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        actor: &AuthUser,
        reason: Option<String>,
    ) -> Result<AppointmentWithRefs, AppointmentError> {
        let appointment = self.load(appointment_id).await?;

        if appointment.patient_id != actor.id && !actor.is_admin() {
            return Err(AppointmentError::Forbidden);
        }

        if appointment.is_terminal_for_cancellation() {
            let message = match appointment.status {
                AppointmentStatus::Cancelled => "Appointment is already cancelled",
                _ => "Cannot cancel a completed appointment",
            };
            return Err(AppointmentError::InvalidState(message.to_string()));
        }

        let now = Utc::now();
        let updated = self
            .apply(
                appointment_id,
                json!({
                    "status": AppointmentStatus::Cancelled,
                    "cancelled_by": actor.id,
                    "cancelled_at": now.to_rfc3339(),
                    "cancellation_reason": reason.unwrap_or_else(|| "No reason provided".to_string()),
                    "updated_at": now.to_rfc3339(),
                }),
            )
            .await?;

        debug!("Appointment {} cancelled by {}", appointment_id, actor.id);
        let doctor = self.doctor_summary(updated.doctor_id).await?;
        Ok(AppointmentWithRefs {
            appointment: updated,
            doctor,
            patient: None,
        })
    }

    /// Administrative overwrite. Any state can be forced to any other; this
    /// is the only path that marks appointments completed or no-show.
    pub async fn set_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<AppointmentWithRefs, AppointmentError> {
        let appointment = self.load(appointment_id).await?;

        let updated = self
            .apply(
                appointment_id,
                json!({
                    "status": status,
                    "updated_at": Utc::now().to_rfc3339(),
                }),
            )
            .await?;

        debug!(
            "Appointment {} status {} -> {}",
            appointment_id, appointment.status, status
        );
        let doctor = self.doctor_summary(updated.doctor_id).await?;
        let patient = self.patient_summary(updated.patient_id).await?;
        Ok(AppointmentWithRefs {
            appointment: updated,
            doctor,
            patient,
        })
    }

    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
        query: AppointmentListQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut parts = vec![format!("patient_id=eq.{}", patient_id)];

        if query.upcoming.unwrap_or(false) {
            parts.push(format!(
                "date=gte.{}",
                urlencoding::encode(&Utc::now().to_rfc3339())
            ));
            parts.push("status=eq.booked".to_string());
        } else if let Some(status) = query.status {
            let status: AppointmentStatus = status
                .parse()
                .map_err(|_| AppointmentError::InvalidStatus(status.clone()))?;
            parts.push(format!("status=eq.{}", status));
        }

        parts.push("order=date.desc".to_string());
        let query = parts.join("&");

        debug!("Listing appointments: {}", query);
        Ok(self.store.find("appointments", &query).await?)
    }

    pub async fn list_all(
        &self,
        query: AdminListQuery,
    ) -> Result<Vec<AppointmentWithRefs>, AppointmentError> {
        let mut parts = Vec::new();

        if let Some(status) = query.status {
            let status: AppointmentStatus = status
                .parse()
                .map_err(|_| AppointmentError::InvalidStatus(status.clone()))?;
            parts.push(format!("status=eq.{}", status));
        }
        if let Some(date) = query.date {
            let (from, to) = day_bounds(date);
            parts.push(format!("date=gte.{}", urlencoding::encode(&from.to_rfc3339())));
            parts.push(format!("date=lte.{}", urlencoding::encode(&to.to_rfc3339())));
        }
        parts.push("order=date.desc".to_string());
        let query = parts.join("&");

        debug!("Listing all appointments: {}", query);
        let appointments: Vec<Appointment> = self.store.find("appointments", &query).await?;

        let mut enriched = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            let doctor = self.doctor_summary(appointment.doctor_id).await?;
            let patient = self.patient_summary(appointment.patient_id).await?;
            enriched.push(AppointmentWithRefs {
                appointment,
                doctor,
                patient,
            });
        }
        Ok(enriched)
    }

    pub async fn get(
        &self,
        appointment_id: Uuid,
        actor: &AuthUser,
    ) -> Result<AppointmentWithRefs, AppointmentError> {
        let appointment = self.load(appointment_id).await?;

        if appointment.patient_id != actor.id && !actor.is_admin() {
            return Err(AppointmentError::Forbidden);
        }

        let doctor = self.doctor_summary(appointment.doctor_id).await?;
        let patient = self.patient_summary(appointment.patient_id).await?;
        Ok(AppointmentWithRefs {
            appointment,
            doctor,
            patient,
        })
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .find_one::<Appointment>("appointments", &format!("id=eq.{}", appointment_id))
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    async fn apply(
        &self,
        appointment_id: Uuid,
        changes: serde_json::Value,
    ) -> Result<Appointment, AppointmentError> {
        let mut updated: Vec<Appointment> = self
            .store
            .update(
                "appointments",
                &format!("id=eq.{}", appointment_id),
                changes,
            )
            .await?;
        if updated.is_empty() {
            return Err(AppointmentError::NotFound);
        }
        Ok(updated.remove(0))
    }

    /// Summaries tolerate a missing referent. Doctors are never hard-deleted
    /// but a ledger row must still render if one disappears out of band.
    async fn doctor_summary(
        &self,
        doctor_id: Uuid,
    ) -> Result<Option<DoctorSummary>, AppointmentError> {
        Ok(self
            .store
            .find_one("doctors", &format!("id=eq.{}", doctor_id))
            .await?)
    }

    async fn patient_summary(
        &self,
        patient_id: Uuid,
    ) -> Result<Option<PatientSummary>, AppointmentError> {
        Ok(self
            .store
            .find_one("users", &format!("id=eq.{}", patient_id))
            .await?)
    }
}

fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = date
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();
    let to = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_default()
        .and_utc();
    (from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let date = NaiveDate::from_ymd_opt(2030, 6, 15).unwrap();
        let (from, to) = day_bounds(date);
        assert_eq!(from.to_rfc3339(), "2030-06-15T00:00:00+00:00");
        assert!(to > from);
        assert_eq!(to.date_naive(), date);
    }
}
