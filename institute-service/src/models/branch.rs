use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scoping entity: owns students and batches, and contributes the short
/// code used in registration-number formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Short code embedded in registration numbers, e.g. "MN".
    pub short_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub is_active: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Branch {
    pub fn new(name: String, short_code: String, address: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            short_code,
            address,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
