use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMode {
    Cash,
    Cheque,
    #[serde(rename = "Online/UPI")]
    OnlineUpi,
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMode::Cash => write!(f, "Cash"),
            PaymentMode::Cheque => write!(f, "Cheque"),
            PaymentMode::OnlineUpi => write!(f, "Online/UPI"),
        }
    }
}

/// Which logical fee a receipt represents, fixed at creation time instead
/// of being re-derived from remark text on every read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReceiptPurpose {
    Admission,
    Registration,
    Installment,
}

impl std::fmt::Display for ReceiptPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReceiptPurpose::Admission => write!(f, "Admission"),
            ReceiptPurpose::Registration => write!(f, "Registration"),
            ReceiptPurpose::Installment => write!(f, "Installment"),
        }
    }
}

/// One payment transaction. Receipts are append-only: updates only correct
/// the amount or metadata, and deletion reverses the balance effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeReceipt {
    #[serde(rename = "_id")]
    pub id: String,
    /// Globally unique, monotonically increasing numeric string.
    pub receipt_no: String,
    pub student_id: String,
    pub course_id: String,
    pub amount_paid: f64,
    pub payment_mode: PaymentMode,
    pub purpose: ReceiptPurpose,
    pub installment_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,

    // Mode-specific metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheque_number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::opt_chrono_datetime_as_bson_datetime"
    )]
    pub cheque_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::opt_chrono_datetime_as_bson_datetime"
    )]
    pub transaction_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
