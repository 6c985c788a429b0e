use axum::{extract::State, http::StatusCode, Json};
use chrono::{Datelike, Utc};
use service_core::error::AppError;

use crate::{dtos::ExamSerialResponse, AppState};

/// Allocate the next exam serial for the current year.
#[tracing::instrument(skip(state))]
pub async fn allocate_exam_serial(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ExamSerialResponse>), AppError> {
    let serial = state.sequences.next_exam_serial(Utc::now().year()).await?;

    tracing::info!(serial = %serial, "Exam serial allocated");

    Ok((StatusCode::CREATED, Json(ExamSerialResponse { serial })))
}
