use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::{doc, DateTime as BsonDateTime};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{AdmitStudentRequest, StudentResponse},
    models::Student,
    AppState,
};

/// Admit a student: creates the record in the pre-registration phase.
/// Enrollment and registration numbers arrive later, from the ledger and
/// the registration workflow.
#[tracing::instrument(skip(state, payload))]
pub async fn admit_student(
    State(state): State<AppState>,
    Json(payload): Json<AdmitStudentRequest>,
) -> Result<(StatusCode, Json<StudentResponse>), AppError> {
    payload.validate()?;

    if state
        .db
        .find_branch(&payload.branch_id)
        .await
        .map_err(AppError::InternalError)?
        .is_none()
    {
        return Err(AppError::NotFound(anyhow::anyhow!("Branch not found")));
    }
    if state
        .db
        .find_course(&payload.course_id)
        .await
        .map_err(AppError::InternalError)?
        .is_none()
    {
        return Err(AppError::NotFound(anyhow::anyhow!("Course not found")));
    }

    let student = Student::admit(
        payload.branch_id,
        payload.course_id,
        payload.batch_id,
        payload.name,
        payload.phone,
        payload.email,
        payload.total_fees,
        payload.payment_plan,
        payload.emi_details,
    );

    tracing::info!(
        student_id = %student.id,
        branch_id = %student.branch_id,
        total_fees = student.total_fees,
        "Admitting student"
    );

    state.db.students().insert_one(&student, None).await?;

    Ok((StatusCode::CREATED, Json(StudentResponse::from(student))))
}

pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<StudentResponse>, AppError> {
    let student = state
        .db
        .find_student(&student_id)
        .await
        .map_err(AppError::InternalError)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Student not found")))?;

    Ok(Json(StudentResponse::from(student)))
}

/// Soft delete: the record stays for receipt history, but drops out of
/// listings and lookups.
#[tracing::instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let student = state
        .db
        .find_student(&student_id)
        .await
        .map_err(AppError::InternalError)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Student not found")))?;

    state
        .db
        .students()
        .update_one(
            doc! { "_id": &student.id },
            doc! { "$set": { "is_deleted": true, "is_active": false, "updated_at": BsonDateTime::now() } },
            None,
        )
        .await?;

    tracing::info!(student_id = %student.id, "Student soft deleted");

    Ok(StatusCode::NO_CONTENT)
}
