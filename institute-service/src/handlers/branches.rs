use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{BranchResponse, CreateBranchRequest, EnrollmentNumberResponse, StudentResponse},
    models::Branch,
    AppState,
};

#[tracing::instrument(skip(state, payload))]
pub async fn create_branch(
    State(state): State<AppState>,
    Json(payload): Json<CreateBranchRequest>,
) -> Result<(StatusCode, Json<BranchResponse>), AppError> {
    payload.validate()?;

    let branch = Branch::new(payload.name, payload.short_code, payload.address);

    tracing::info!(branch_id = %branch.id, short_code = %branch.short_code, "Creating branch");

    state.db.branches().insert_one(&branch, None).await?;

    Ok((StatusCode::CREATED, Json(BranchResponse::from(branch))))
}

pub async fn get_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
) -> Result<Json<BranchResponse>, AppError> {
    let branch = state
        .db
        .find_branch(&branch_id)
        .await
        .map_err(AppError::InternalError)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Branch not found")))?;

    Ok(Json(BranchResponse::from(branch)))
}

/// Reserve the next enrollment number of a branch.
#[tracing::instrument(skip(state))]
pub async fn allocate_enrollment_number(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
) -> Result<(StatusCode, Json<EnrollmentNumberResponse>), AppError> {
    if state
        .db
        .find_branch(&branch_id)
        .await
        .map_err(AppError::InternalError)?
        .is_none()
    {
        return Err(AppError::NotFound(anyhow::anyhow!("Branch not found")));
    }

    let enrollment_no = state.sequences.next_enrollment_number(&branch_id).await?;

    tracing::info!(branch_id = %branch_id, enrollment_no = %enrollment_no, "Enrollment number allocated");

    Ok((
        StatusCode::CREATED,
        Json(EnrollmentNumberResponse { enrollment_no }),
    ))
}

pub async fn list_students(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
) -> Result<Json<Vec<StudentResponse>>, AppError> {
    let students = state
        .db
        .students_in_branch(&branch_id)
        .await
        .map_err(AppError::InternalError)?;

    Ok(Json(students.into_iter().map(Into::into).collect()))
}
