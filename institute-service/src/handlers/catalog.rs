use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{BatchResponse, CourseResponse, CreateBatchRequest, CreateCourseRequest},
    models::{Batch, Course},
    AppState,
};

#[tracing::instrument(skip(state, payload))]
pub async fn create_course(
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    payload.validate()?;

    let course = Course::new(payload.name, payload.admission_fees, payload.duration_months);

    tracing::info!(course_id = %course.id, "Creating course");

    state.db.courses().insert_one(&course, None).await?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from(course))))
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, AppError> {
    let course = state
        .db
        .find_course(&course_id)
        .await
        .map_err(AppError::InternalError)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Course not found")))?;

    Ok(Json(CourseResponse::from(course)))
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_batch(
    State(state): State<AppState>,
    Json(payload): Json<CreateBatchRequest>,
) -> Result<(StatusCode, Json<BatchResponse>), AppError> {
    payload.validate()?;

    if state
        .db
        .find_course(&payload.course_id)
        .await
        .map_err(AppError::InternalError)?
        .is_none()
    {
        return Err(AppError::NotFound(anyhow::anyhow!("Course not found")));
    }

    let batch = Batch::new(
        payload.branch_id,
        payload.course_id,
        payload.name,
        payload.start_time,
        payload.end_time,
    );

    tracing::info!(batch_id = %batch.id, course_id = %batch.course_id, "Creating batch");

    state.db.batches().insert_one(&batch, None).await?;

    Ok((StatusCode::CREATED, Json(BatchResponse::from(batch))))
}
