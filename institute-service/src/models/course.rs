use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only reference data consumed by summary computation and the
/// welcome notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Standard admission fee for the course; summaries take the greater of
    /// this and the amount the student actually paid.
    pub admission_fees: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_months: Option<u32>,
    pub is_active: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn new(name: String, admission_fees: f64, duration_months: Option<u32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            admission_fees,
            duration_months,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
