use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a student has contracted to pay tuition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentPlan {
    OneTime,
    Monthly,
}

impl std::fmt::Display for PaymentPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentPlan::OneTime => write!(f, "OneTime"),
            PaymentPlan::Monthly => write!(f, "Monthly"),
        }
    }
}

/// Installment structure for `Monthly` plans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmiDetails {
    pub registration_fees: f64,
    pub monthly_installment: f64,
    pub months: u32,
}

/// A student record: identity, academic and financial state.
///
/// `pending_fees` tracks the remaining tuition balance. The admission fee
/// is additive to tuition and never decrements it; overpayment drives the
/// balance negative, representing credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: String,
    pub branch_id: String,
    pub course_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Assigned on the first qualifying payment; numeric string, unique per branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_no: Option<String>,
    /// Assigned at registration confirmation; `<sequence>-<branchShortCode>`, globally unique.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_no: Option<String>,

    /// Contracted tuition, excludes the admission fee.
    pub total_fees: f64,
    /// Remaining tuition balance; not clamped at zero.
    pub pending_fees: f64,
    pub is_admission_fees_paid: bool,
    /// Amount actually paid for admission.
    pub admission_fee_amount: f64,
    pub is_registration_fees_paid: bool,
    pub payment_plan: PaymentPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emi_details: Option<EmiDetails>,

    pub is_registered: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::opt_chrono_datetime_as_bson_datetime"
    )]
    pub registration_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub is_active: bool,
    pub is_deleted: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Admit a new student. Registration and enrollment identifiers are
    /// assigned later by the fee ledger and registration workflow.
    #[allow(clippy::too_many_arguments)]
    pub fn admit(
        branch_id: String,
        course_id: String,
        batch_id: Option<String>,
        name: String,
        phone: String,
        email: Option<String>,
        total_fees: f64,
        payment_plan: PaymentPlan,
        emi_details: Option<EmiDetails>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            branch_id,
            course_id,
            batch_id,
            name,
            phone,
            email,
            enrollment_no: None,
            reg_no: None,
            total_fees,
            pending_fees: total_fees,
            is_admission_fees_paid: false,
            admission_fee_amount: 0.0,
            is_registration_fees_paid: false,
            payment_plan,
            emi_details,
            is_registered: false,
            registration_date: None,
            user_id: None,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}
