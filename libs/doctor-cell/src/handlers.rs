use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateDoctorRequest, Doctor, DoctorError, DoctorListQuery, UpdateDoctorRequest};
use crate::services::DirectoryService;

fn map_doctor_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::MissingField(field) => {
            AppError::BadRequest(format!("Missing required field: {}", field))
        }
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::DuplicateEmail => {
            AppError::Conflict("Doctor with this email already exists".to_string())
        }
        DoctorError::Store(e) => AppError::Database(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    debug!("Listing doctors");

    let service = DirectoryService::new(&config);
    let doctors = service
        .list_doctors(query.specialization.as_deref())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(doctors))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Doctor>, AppError> {
    let service = DirectoryService::new(&config);
    let doctor = service
        .get_doctor(doctor_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(doctor))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Doctor>), AppError> {
    debug!("Creating doctor");

    let service = DirectoryService::new(&config);
    let doctor = service
        .create_doctor(request)
        .await
        .map_err(map_doctor_error)?;

    Ok((StatusCode::CREATED, Json(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Doctor>, AppError> {
    debug!("Updating doctor {}", doctor_id);

    let service = DirectoryService::new(&config);
    let doctor = service
        .update_doctor(doctor_id, request)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(doctor))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    debug!("Deactivating doctor {}", doctor_id);

    let service = DirectoryService::new(&config);
    service
        .deactivate_doctor(doctor_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "message": "Doctor deactivated successfully" })))
}
