pub mod batch;
pub mod branch;
pub mod counter;
pub mod course;
pub mod receipt;
pub mod student;
pub mod user;

pub use batch::Batch;
pub use branch::Branch;
pub use counter::SequenceCounter;
pub use course::Course;
pub use receipt::{FeeReceipt, PaymentMode, ReceiptPurpose};
pub use student::{EmiDetails, PaymentPlan, Student};
pub use user::UserAccount;

// Helper module for optional DateTime<Utc> as BSON DateTime
pub(crate) mod opt_chrono_datetime_as_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(dt) => {
                let bson_dt = bson::DateTime::from_chrono(*dt);
                bson_dt.serialize(serializer)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        Ok(opt.map(|dt| dt.to_chrono()))
    }
}
