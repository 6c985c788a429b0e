pub mod branches;
pub mod catalog;
pub mod exams;
pub mod payments;
pub mod registration;
pub mod students;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services;

/// Health check endpoint for Docker/K8s liveness probes.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "institute-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Prometheus metrics endpoint.
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        services::get_metrics(),
    )
}
