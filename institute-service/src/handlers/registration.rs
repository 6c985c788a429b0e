use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{ConfirmRegistrationRequest, StudentResponse},
    AppState,
};

#[tracing::instrument(skip(state, payload), fields(student_id = %student_id))]
pub async fn confirm_registration(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(payload): Json<ConfirmRegistrationRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    payload.validate()?;

    let student = state
        .registration
        .confirm_registration(&student_id, payload)
        .await?;

    Ok(Json(StudentResponse::from(student)))
}
