use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{
        LedgerResponse, PaymentSummaryResponse, ReceiptResponse, RecordPaymentRequest,
        UpdateReceiptRequest,
    },
    AppState,
};

#[tracing::instrument(skip(state, payload), fields(student_id = %student_id))]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ReceiptResponse>), AppError> {
    payload.validate()?;

    let receipt = state.ledger.record_payment(&student_id, payload).await?;

    Ok((StatusCode::CREATED, Json(ReceiptResponse::from(receipt))))
}

#[tracing::instrument(skip(state, payload), fields(receipt_id = %receipt_id))]
pub async fn update_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
    Json(payload): Json<UpdateReceiptRequest>,
) -> Result<Json<ReceiptResponse>, AppError> {
    payload.validate()?;

    let receipt = state.ledger.update_receipt(&receipt_id, payload).await?;

    Ok(Json(ReceiptResponse::from(receipt)))
}

#[tracing::instrument(skip(state), fields(receipt_id = %receipt_id))]
pub async fn delete_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.ledger.delete_receipt(&receipt_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn payment_summary(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<PaymentSummaryResponse>, AppError> {
    let summary = state.ledger.payment_summary(&student_id).await?;

    Ok(Json(summary))
}

pub async fn get_ledger(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<LedgerResponse>, AppError> {
    let ledger = state.ledger.ledger(&student_id).await?;

    Ok(Json(ledger))
}
