use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Student not found")]
    StudentNotFound,

    #[error("Receipt not found")]
    ReceiptNotFound,

    #[error("Branch not found")]
    BranchNotFound,

    #[error("Course not found")]
    CourseNotFound,

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Student is already registered")]
    AlreadyRegistered,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::StudentNotFound => AppError::NotFound(anyhow::anyhow!("Student not found")),
            ServiceError::ReceiptNotFound => AppError::NotFound(anyhow::anyhow!("Receipt not found")),
            ServiceError::BranchNotFound => AppError::NotFound(anyhow::anyhow!("Branch not found")),
            ServiceError::CourseNotFound => AppError::NotFound(anyhow::anyhow!("Course not found")),
            ServiceError::InvalidAmount(amount) => {
                AppError::BadRequest(anyhow::anyhow!("Invalid amount: {}", amount))
            }
            ServiceError::AlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Student is already registered"))
            }
            ServiceError::UsernameTaken => {
                AppError::Conflict(anyhow::anyhow!("Username already taken"))
            }
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
        }
    }
}
