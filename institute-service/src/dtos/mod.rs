use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    Batch, Branch, Course, EmiDetails, FeeReceipt, PaymentMode, PaymentPlan, ReceiptPurpose,
    Student,
};

// ---- Requests ----

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, message = "Branch name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 8, message = "Short code must be 1-8 characters"))]
    pub short_code: String,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, message = "Course name is required"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "Admission fees must not be negative"))]
    pub admission_fees: f64,
    pub duration_months: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBatchRequest {
    #[validate(length(min = 1))]
    pub branch_id: String,
    #[validate(length(min = 1))]
    pub course_id: String,
    #[validate(length(min = 1, message = "Batch name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Start time is required"))]
    pub start_time: String,
    #[validate(length(min = 1, message = "End time is required"))]
    pub end_time: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdmitStudentRequest {
    #[validate(length(min = 1))]
    pub branch_id: String,
    #[validate(length(min = 1))]
    pub course_id: String,
    pub batch_id: Option<String>,
    #[validate(length(min = 1, message = "Student name is required"))]
    pub name: String,
    #[validate(length(min = 10, message = "Phone number must be at least 10 characters"))]
    pub phone: String,
    pub email: Option<String>,
    #[validate(range(min = 0.0, message = "Total fees must not be negative"))]
    pub total_fees: f64,
    pub payment_plan: PaymentPlan,
    pub emi_details: Option<EmiDetails>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
    pub payment_mode: PaymentMode,
    pub remarks: Option<String>,
    pub bank_name: Option<String>,
    pub cheque_number: Option<String>,
    pub cheque_date: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateReceiptRequest {
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: Option<f64>,
    pub payment_mode: Option<PaymentMode>,
    pub remarks: Option<String>,
    pub bank_name: Option<String>,
    pub cheque_number: Option<String>,
    pub cheque_date: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationFeeDetails {
    #[validate(range(min = 0.0))]
    pub amount: f64,
    pub payment_mode: PaymentMode,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmRegistrationRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Explicit registration number; allocated when absent.
    pub reg_no: Option<String>,
    #[validate(nested)]
    pub registration_fee: Option<RegistrationFeeDetails>,
}

// ---- Responses ----

#[derive(Debug, Serialize)]
pub struct BranchResponse {
    pub id: String,
    pub name: String,
    pub short_code: String,
    pub address: Option<String>,
}

impl From<Branch> for BranchResponse {
    fn from(b: Branch) -> Self {
        Self {
            id: b.id,
            name: b.name,
            short_code: b.short_code,
            address: b.address,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub id: String,
    pub name: String,
    pub admission_fees: f64,
    pub duration_months: Option<u32>,
}

impl From<Course> for CourseResponse {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            name: c.name,
            admission_fees: c.admission_fees,
            duration_months: c.duration_months,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub id: String,
    pub branch_id: String,
    pub course_id: String,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
}

impl From<Batch> for BatchResponse {
    fn from(b: Batch) -> Self {
        Self {
            id: b.id,
            branch_id: b.branch_id,
            course_id: b.course_id,
            name: b.name,
            start_time: b.start_time,
            end_time: b.end_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub id: String,
    pub branch_id: String,
    pub course_id: String,
    pub batch_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub enrollment_no: Option<String>,
    pub reg_no: Option<String>,
    pub total_fees: f64,
    pub pending_fees: f64,
    pub is_admission_fees_paid: bool,
    pub admission_fee_amount: f64,
    pub is_registration_fees_paid: bool,
    pub payment_plan: PaymentPlan,
    pub emi_details: Option<EmiDetails>,
    pub is_registered: bool,
    pub registration_date: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
    pub is_active: bool,
}

impl From<Student> for StudentResponse {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            branch_id: s.branch_id,
            course_id: s.course_id,
            batch_id: s.batch_id,
            name: s.name,
            phone: s.phone,
            email: s.email,
            enrollment_no: s.enrollment_no,
            reg_no: s.reg_no,
            total_fees: s.total_fees,
            pending_fees: s.pending_fees,
            is_admission_fees_paid: s.is_admission_fees_paid,
            admission_fee_amount: s.admission_fee_amount,
            is_registration_fees_paid: s.is_registration_fees_paid,
            payment_plan: s.payment_plan,
            emi_details: s.emi_details,
            is_registered: s.is_registered,
            registration_date: s.registration_date,
            user_id: s.user_id,
            is_active: s.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub id: String,
    pub receipt_no: String,
    pub student_id: String,
    pub course_id: String,
    pub amount_paid: f64,
    pub payment_mode: PaymentMode,
    pub purpose: ReceiptPurpose,
    pub installment_number: i32,
    pub remarks: Option<String>,
    pub date: DateTime<Utc>,
    pub bank_name: Option<String>,
    pub cheque_number: Option<String>,
    pub cheque_date: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
}

impl From<FeeReceipt> for ReceiptResponse {
    fn from(r: FeeReceipt) -> Self {
        Self {
            id: r.id,
            receipt_no: r.receipt_no,
            student_id: r.student_id,
            course_id: r.course_id,
            amount_paid: r.amount_paid,
            payment_mode: r.payment_mode,
            purpose: r.purpose,
            installment_number: r.installment_number,
            remarks: r.remarks,
            date: r.date,
            bank_name: r.bank_name,
            cheque_number: r.cheque_number,
            cheque_date: r.cheque_date,
            transaction_id: r.transaction_id,
            transaction_date: r.transaction_date,
            created_by: r.created_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnrollmentNumberResponse {
    pub enrollment_no: String,
}

#[derive(Debug, Serialize)]
pub struct ExamSerialResponse {
    pub serial: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PaymentSummaryResponse {
    pub total_received: f64,
    /// `totalFees - totalReceived`; negative means the student holds credit.
    pub due_amount: f64,
    /// Credit held by the student, zero unless overpaid.
    pub credit_amount: f64,
    pub outstanding_amount: f64,
    pub fees_method: PaymentPlan,
    pub emi_structure: Option<EmiDetails>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LedgerSummary {
    pub total_course_fees: f64,
    pub total_paid: f64,
    pub due_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub receipts: Vec<ReceiptResponse>,
    pub summary: LedgerSummary,
}
