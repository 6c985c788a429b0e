use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

use super::database::Database;
use super::error::ServiceError;

/// Counter domain for registration numbers; global across branches.
const REGISTRATION_NUMBER_KEY: &str = "registrationNumber";
/// Counter domain for receipt numbers; global, not branch-scoped.
const RECEIPT_NUMBER_KEY: &str = "receiptNumber";
/// Short code used when the owning branch cannot be resolved.
const FALLBACK_BRANCH_CODE: &str = "MN";

/// Produces the next identifier in a named, optionally branch-scoped
/// sequence. Every domain is backed by a persisted counter advanced with
/// an atomic increment-and-return; a number handed out once is never
/// handed out again, and storage failures fail the allocation closed.
#[derive(Clone)]
pub struct SequenceAllocator {
    db: Database,
}

impl SequenceAllocator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Atomically advance the counter for `key` and return the new value.
    /// The counter document is created on first use, so fresh domains
    /// start at 1.
    async fn next(&self, key: &str) -> Result<i64, ServiceError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .db
            .counters()
            .find_one_and_update(doc! { "_id": key }, doc! { "$inc": { "seq": 1 } }, options)
            .await?;

        counter.map(|c| c.seq).ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!(
                "counter upsert for '{}' returned no document",
                key
            ))
        })
    }

    /// Next enrollment number within a branch, as a numeric string
    /// starting at "1".
    pub async fn next_enrollment_number(&self, branch_id: &str) -> Result<String, ServiceError> {
        let seq = self.next(&enrollment_key(branch_id)).await?;
        Ok(seq.to_string())
    }

    /// Next receipt number, as a numeric string. One sequence for the
    /// whole institute.
    pub async fn next_receipt_number(&self) -> Result<String, ServiceError> {
        let seq = self.next(RECEIPT_NUMBER_KEY).await?;
        Ok(seq.to_string())
    }

    /// Next registration number, formatted `<sequence>-<branchShortCode>`.
    /// A failed branch lookup falls back to the default code rather than
    /// failing the allocation.
    pub async fn next_registration_number(&self, branch_id: &str) -> Result<String, ServiceError> {
        let seq = self.next(REGISTRATION_NUMBER_KEY).await?;

        let short_code = match self.db.find_branch(branch_id).await {
            Ok(Some(branch)) => branch.short_code,
            Ok(None) => {
                tracing::warn!(branch_id = %branch_id, "branch missing, using fallback short code");
                FALLBACK_BRANCH_CODE.to_string()
            }
            Err(e) => {
                tracing::warn!(branch_id = %branch_id, error = %e, "branch lookup failed, using fallback short code");
                FALLBACK_BRANCH_CODE.to_string()
            }
        };

        Ok(format_registration_number(seq, &short_code))
    }

    /// Next exam serial for the given year, `EX-<year>-NNNN`.
    pub async fn next_exam_serial(&self, year: i32) -> Result<String, ServiceError> {
        let seq = self.next(&exam_key(year)).await?;
        Ok(format_exam_serial(year, seq))
    }
}

fn enrollment_key(branch_id: &str) -> String {
    format!("enrollmentNumber:{}", branch_id)
}

fn exam_key(year: i32) -> String {
    format!("examSerial:{}", year)
}

pub(crate) fn format_registration_number(seq: i64, short_code: &str) -> String {
    format!("{}-{}", seq, short_code)
}

pub(crate) fn format_exam_serial(year: i32, seq: i64) -> String {
    format!("EX-{}-{:04}", year, seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_numbers_embed_branch_code() {
        assert_eq!(format_registration_number(17, "KP"), "17-KP");
        assert_eq!(format_registration_number(1, FALLBACK_BRANCH_CODE), "1-MN");
    }

    #[test]
    fn exam_serials_are_zero_padded() {
        assert_eq!(format_exam_serial(2025, 3), "EX-2025-0003");
        assert_eq!(format_exam_serial(2025, 1042), "EX-2025-1042");
    }

    #[test]
    fn counter_keys_scope_by_domain() {
        assert_eq!(enrollment_key("b-1"), "enrollmentNumber:b-1");
        assert_eq!(exam_key(2026), "examSerial:2026");
        assert_ne!(enrollment_key("b-1"), enrollment_key("b-2"));
    }
}
