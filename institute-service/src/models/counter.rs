use serde::{Deserialize, Serialize};

/// One persisted counter per numbering domain. Every sequence in the
/// system is advanced through an atomic increment-and-return on one of
/// these documents; numbers are never derived by scanning existing rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceCounter {
    /// Domain key, e.g. "receiptNumber" or "enrollmentNumber:<branchId>".
    #[serde(rename = "_id")]
    pub key: String,
    pub seq: i64,
}
