use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    Extension,
};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{
    AdminListQuery, Appointment, AppointmentError, AppointmentListQuery, AppointmentStatus,
    AppointmentWithRefs, BookAppointmentRequest, CancelAppointmentRequest, UpdateStatusRequest,
};
use crate::services::AppointmentLedger;

fn map_appointment_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::MissingField(field) => {
            AppError::BadRequest(format!("Missing required field: {}", field))
        }
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::SlotTaken => {
            AppError::Conflict("This time slot is already booked".to_string())
        }
        AppointmentError::PastDate => {
            AppError::BadRequest("Cannot book an appointment in the past".to_string())
        }
        AppointmentError::InvalidState(msg) => AppError::BadRequest(msg),
        AppointmentError::InvalidStatus(status) => {
            AppError::BadRequest(format!("Invalid status: {}", status))
        }
        AppointmentError::Forbidden => {
            AppError::Forbidden("Not allowed to access this appointment".to_string())
        }
        AppointmentError::Store(e) => AppError::Database(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentWithRefs>), AppError> {
    debug!("Booking appointment for user {}", user.id);

    let ledger = AppointmentLedger::new(&config);
    let booked = ledger
        .book(&user, request)
        .await
        .map_err(map_appointment_error)?;

    Ok((StatusCode::CREATED, Json(booked)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let ledger = AppointmentLedger::new(&config);
    let appointments = ledger
        .list_for_patient(user.id, query)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn list_all_appointments(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Vec<AppointmentWithRefs>>, AppError> {
    debug!("Listing appointments across patients");

    let ledger = AppointmentLedger::new(&config);
    let appointments = ledger
        .list_all(query)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<AppointmentWithRefs>, AppError> {
    let ledger = AppointmentLedger::new(&config);
    let appointment = ledger
        .get(appointment_id, &user)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
    request: Option<Json<CancelAppointmentRequest>>,
) -> Result<Json<AppointmentWithRefs>, AppError> {
    debug!("Cancel request for appointment {}", appointment_id);

    let reason = request.and_then(|Json(body)| body.reason);
    let ledger = AppointmentLedger::new(&config);
    let cancelled = ledger
        .cancel(appointment_id, &user, reason)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(cancelled))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(config): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<AppointmentWithRefs>, AppError> {
    let status = request
        .status
        .ok_or_else(|| AppError::BadRequest("Missing required field: status".to_string()))?;
    let status: AppointmentStatus = status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid status: {}", status)))?;

    debug!("Setting appointment {} to {}", appointment_id, status);

    let ledger = AppointmentLedger::new(&config);
    let updated = ledger
        .set_status(appointment_id, status)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(updated))
}
