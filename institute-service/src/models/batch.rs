use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled batch of a course at a branch. The time window is quoted in
/// the welcome notification sent after admission completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    #[serde(rename = "_id")]
    pub id: String,
    pub branch_id: String,
    pub course_id: String,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub is_active: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(
        branch_id: String,
        course_id: String,
        name: String,
        start_time: String,
        end_time: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            branch_id,
            course_id,
            name,
            start_time,
            end_time,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
