use chrono::Utc;
use mongodb::bson::{doc, DateTime as BsonDateTime};

use super::database::Database;
use super::error::ServiceError;
use super::metrics;
use super::notifier::{payment_message, welcome_message, NotificationDispatcher};
use super::sequence::SequenceAllocator;
use crate::dtos::{
    LedgerResponse, LedgerSummary, PaymentSummaryResponse, RecordPaymentRequest,
    UpdateReceiptRequest,
};
use crate::models::{FeeReceipt, PaymentPlan, ReceiptPurpose, Student};

/// The first receipt of a student who registered before paying anything is
/// numbered 3: slots 1 and 2 are reserved for the admission and
/// registration fees even when those were never recorded as receipts.
pub const FIRST_POST_REGISTRATION_INSTALLMENT: i32 = 3;

/// Records payments and keeps a student's aggregate balance consistent
/// with receipt history.
///
/// The receipt write and the student balance write always travel in one
/// MongoDB transaction; a partial application of either would break
/// `pending_fees == total_fees - sum(non-admission receipts)`.
#[derive(Clone)]
pub struct FeeLedger {
    db: Database,
    sequences: SequenceAllocator,
    notifier: NotificationDispatcher,
}

impl FeeLedger {
    pub fn new(db: Database, sequences: SequenceAllocator, notifier: NotificationDispatcher) -> Self {
        Self {
            db,
            sequences,
            notifier,
        }
    }

    pub async fn record_payment(
        &self,
        student_id: &str,
        req: RecordPaymentRequest,
    ) -> Result<FeeReceipt, ServiceError> {
        if req.amount <= 0.0 {
            return Err(ServiceError::InvalidAmount(req.amount));
        }

        let student = self
            .db
            .find_student(student_id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or(ServiceError::StudentNotFound)?;

        let receipt_no = self.sequences.next_receipt_number().await?;
        let prior_receipts = self
            .db
            .count_receipts_for_student(student_id)
            .await
            .map_err(ServiceError::Internal)?;

        // The first payment a student ever makes is the admission fee,
        // regardless of remarks. It does not reduce the tuition balance.
        let completes_admission = !student.is_admission_fees_paid;
        let installment_number = installment_number(prior_receipts, student.is_registered);
        let purpose = classify_purpose(completes_admission, req.remarks.as_deref());

        let assigned_enrollment = if completes_admission && student.enrollment_no.is_none() {
            Some(
                self.sequences
                    .next_enrollment_number(&student.branch_id)
                    .await?,
            )
        } else {
            None
        };

        let now = Utc::now();
        let receipt = FeeReceipt {
            id: uuid::Uuid::new_v4().to_string(),
            receipt_no,
            student_id: student.id.clone(),
            course_id: student.course_id.clone(),
            amount_paid: req.amount,
            payment_mode: req.payment_mode,
            purpose,
            installment_number,
            remarks: req.remarks.clone(),
            date: now,
            bank_name: req.bank_name,
            cheque_number: req.cheque_number,
            cheque_date: req.cheque_date,
            transaction_id: req.transaction_id,
            transaction_date: req.transaction_date,
            created_by: req.created_by,
            created_at: now,
            updated_at: now,
        };

        let student_update = if completes_admission {
            let mut set = doc! {
                "is_admission_fees_paid": true,
                "admission_fee_amount": req.amount,
                "updated_at": BsonDateTime::now(),
            };
            if let Some(enrollment) = &assigned_enrollment {
                set.insert("enrollment_no", enrollment);
            }
            doc! { "$set": set }
        } else {
            doc! {
                "$inc": { "pending_fees": -req.amount },
                "$set": { "updated_at": BsonDateTime::now() },
            }
        };

        let mut session = self.db.client().start_session(None).await?;
        session.start_transaction(None).await?;

        let writes: Result<(), mongodb::error::Error> = async {
            self.db
                .receipts()
                .insert_one_with_session(&receipt, None, &mut session)
                .await?;
            self.db
                .students()
                .update_one_with_session(
                    doc! { "_id": &student.id },
                    student_update,
                    None,
                    &mut session,
                )
                .await?;
            Ok(())
        }
        .await;

        match writes {
            Ok(()) => session.commit_transaction().await?,
            Err(e) => {
                let _ = session.abort_transaction().await;
                return Err(e.into());
            }
        }

        tracing::info!(
            student_id = %student.id,
            receipt_no = %receipt.receipt_no,
            amount = req.amount,
            purpose = %purpose,
            installment = installment_number,
            "payment recorded"
        );
        metrics::record_receipt(&student.branch_id, &purpose.to_string(), req.amount);

        let enrollment_no = assigned_enrollment
            .as_deref()
            .or(student.enrollment_no.as_deref());
        let purpose_line =
            sms_purpose_line(completes_admission, req.remarks.as_deref(), installment_number);
        self.notifier.dispatch(
            vec![student.phone.clone()],
            payment_message(
                &student.name,
                req.amount,
                &purpose_line,
                &receipt.receipt_no,
                enrollment_no,
            ),
        );

        if completes_admission {
            self.send_welcome(&student).await;
        }

        Ok(receipt)
    }

    /// Welcome notification after admission completes. Reference-data
    /// lookups here only shape the message; they never fail the payment.
    async fn send_welcome(&self, student: &Student) {
        let course_name = match self.db.find_course(&student.course_id).await {
            Ok(Some(course)) => course.name,
            _ => "your course".to_string(),
        };

        let batch = match &student.batch_id {
            Some(batch_id) => self.db.find_batch(batch_id).await.ok().flatten(),
            None => None,
        };
        let batch_window = batch
            .as_ref()
            .map(|b| (b.start_time.as_str(), b.end_time.as_str()));

        self.notifier.dispatch(
            vec![student.phone.clone()],
            welcome_message(&student.name, &course_name, batch_window),
        );
    }

    pub async fn update_receipt(
        &self,
        receipt_id: &str,
        req: UpdateReceiptRequest,
    ) -> Result<FeeReceipt, ServiceError> {
        let receipt = self
            .db
            .find_receipt(receipt_id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or(ServiceError::ReceiptNotFound)?;
        let student = self
            .db
            .find_student(&receipt.student_id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or(ServiceError::StudentNotFound)?;

        if let Some(amount) = req.amount {
            if amount <= 0.0 {
                return Err(ServiceError::InvalidAmount(amount));
            }
        }
        let delta = req
            .amount
            .map(|amount| amount - receipt.amount_paid)
            .unwrap_or(0.0);

        let mut set = doc! { "updated_at": BsonDateTime::now() };
        if let Some(amount) = req.amount {
            set.insert("amount_paid", amount);
        }
        if let Some(mode) = &req.payment_mode {
            let mode = mongodb::bson::to_bson(mode)
                .map_err(|e| ServiceError::Internal(anyhow::Error::new(e)))?;
            set.insert("payment_mode", mode);
        }
        if let Some(remarks) = &req.remarks {
            set.insert("remarks", remarks);
        }
        if let Some(bank_name) = &req.bank_name {
            set.insert("bank_name", bank_name);
        }
        if let Some(cheque_number) = &req.cheque_number {
            set.insert("cheque_number", cheque_number);
        }
        if let Some(cheque_date) = req.cheque_date {
            set.insert("cheque_date", BsonDateTime::from_chrono(cheque_date));
        }
        if let Some(transaction_id) = &req.transaction_id {
            set.insert("transaction_id", transaction_id);
        }
        if let Some(transaction_date) = req.transaction_date {
            set.insert(
                "transaction_date",
                BsonDateTime::from_chrono(transaction_date),
            );
        }
        let receipt_update = doc! { "$set": set };

        // Admission receipts never touched pending_fees, so a corrected
        // amount lands on admission_fee_amount instead.
        let student_update = if delta != 0.0 {
            if receipt.purpose == ReceiptPurpose::Admission {
                Some(doc! {
                    "$set": {
                        "admission_fee_amount": req.amount.unwrap_or(receipt.amount_paid),
                        "updated_at": BsonDateTime::now(),
                    }
                })
            } else {
                Some(doc! {
                    "$inc": { "pending_fees": -delta },
                    "$set": { "updated_at": BsonDateTime::now() },
                })
            }
        } else {
            None
        };

        let mut session = self.db.client().start_session(None).await?;
        session.start_transaction(None).await?;

        let writes: Result<(), mongodb::error::Error> = async {
            self.db
                .receipts()
                .update_one_with_session(
                    doc! { "_id": &receipt.id },
                    receipt_update,
                    None,
                    &mut session,
                )
                .await?;
            if let Some(update) = student_update {
                self.db
                    .students()
                    .update_one_with_session(
                        doc! { "_id": &student.id },
                        update,
                        None,
                        &mut session,
                    )
                    .await?;
            }
            Ok(())
        }
        .await;

        match writes {
            Ok(()) => session.commit_transaction().await?,
            Err(e) => {
                let _ = session.abort_transaction().await;
                return Err(e.into());
            }
        }

        tracing::info!(
            receipt_id = %receipt.id,
            student_id = %student.id,
            delta = delta,
            "receipt updated"
        );

        self.db
            .find_receipt(receipt_id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or(ServiceError::ReceiptNotFound)
    }

    pub async fn delete_receipt(&self, receipt_id: &str) -> Result<(), ServiceError> {
        let receipt = self
            .db
            .find_receipt(receipt_id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or(ServiceError::ReceiptNotFound)?;
        let student = self
            .db
            .find_student(&receipt.student_id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or(ServiceError::StudentNotFound)?;

        let student_update = if receipt.purpose == ReceiptPurpose::Admission {
            doc! {
                "$set": {
                    "is_admission_fees_paid": false,
                    "admission_fee_amount": 0.0,
                    "updated_at": BsonDateTime::now(),
                }
            }
        } else {
            doc! {
                "$inc": { "pending_fees": receipt.amount_paid },
                "$set": { "updated_at": BsonDateTime::now() },
            }
        };

        let mut session = self.db.client().start_session(None).await?;
        session.start_transaction(None).await?;

        let writes: Result<(), mongodb::error::Error> = async {
            self.db
                .receipts()
                .delete_one_with_session(doc! { "_id": &receipt.id }, None, &mut session)
                .await?;
            self.db
                .students()
                .update_one_with_session(
                    doc! { "_id": &student.id },
                    student_update,
                    None,
                    &mut session,
                )
                .await?;
            Ok(())
        }
        .await;

        match writes {
            Ok(()) => session.commit_transaction().await?,
            Err(e) => {
                let _ = session.abort_transaction().await;
                return Err(e.into());
            }
        }

        tracing::info!(
            receipt_id = %receipt.id,
            student_id = %student.id,
            amount = receipt.amount_paid,
            "receipt deleted, balance effect reversed"
        );

        Ok(())
    }

    pub async fn payment_summary(
        &self,
        student_id: &str,
    ) -> Result<PaymentSummaryResponse, ServiceError> {
        let student = self
            .db
            .find_student(student_id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or(ServiceError::StudentNotFound)?;
        let receipts = self
            .db
            .receipts_for_student(student_id)
            .await
            .map_err(ServiceError::Internal)?;

        let course_admission_fees = match self.db.find_course(&student.course_id).await {
            Ok(Some(course)) => course.admission_fees,
            _ => {
                tracing::warn!(
                    student_id = %student.id,
                    course_id = %student.course_id,
                    "course missing, summary uses paid admission amount only"
                );
                0.0
            }
        };

        Ok(compute_summary(&student, course_admission_fees, &receipts))
    }

    pub async fn ledger(&self, student_id: &str) -> Result<LedgerResponse, ServiceError> {
        let student = self
            .db
            .find_student(student_id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or(ServiceError::StudentNotFound)?;
        let receipts = self
            .db
            .receipts_for_student(student_id)
            .await
            .map_err(ServiceError::Internal)?;

        let summary = compute_ledger_summary(&student, &receipts);
        Ok(LedgerResponse {
            receipts: receipts.into_iter().map(Into::into).collect(),
            summary,
        })
    }
}

pub(crate) fn installment_number(prior_receipts: u64, already_registered: bool) -> i32 {
    if prior_receipts == 0 && already_registered {
        FIRST_POST_REGISTRATION_INSTALLMENT
    } else {
        prior_receipts as i32 + 1
    }
}

pub(crate) fn classify_purpose(
    completes_admission: bool,
    remarks: Option<&str>,
) -> ReceiptPurpose {
    if completes_admission {
        ReceiptPurpose::Admission
    } else if remarks_mention(remarks, "registration") {
        ReceiptPurpose::Registration
    } else {
        ReceiptPurpose::Installment
    }
}

pub(crate) fn sms_purpose_line(
    completes_admission: bool,
    remarks: Option<&str>,
    installment_number: i32,
) -> String {
    if completes_admission || remarks_mention(remarks, "admission") {
        "Admission".to_string()
    } else if remarks_mention(remarks, "registration") {
        "Registration".to_string()
    } else {
        format!("Installment {}", installment_number)
    }
}

fn remarks_mention(remarks: Option<&str>, needle: &str) -> bool {
    remarks
        .map(|r| r.to_lowercase().contains(needle))
        .unwrap_or(false)
}

pub(crate) fn compute_summary(
    student: &Student,
    course_admission_fees: f64,
    receipts: &[FeeReceipt],
) -> PaymentSummaryResponse {
    let total_received: f64 = receipts.iter().map(|r| r.amount_paid).sum();
    let total_fees = student.total_fees + course_admission_fees.max(student.admission_fee_amount);
    let due_amount = total_fees - total_received;
    let credit_amount = (-due_amount).max(0.0);

    let outstanding_amount = match (student.payment_plan, &student.emi_details) {
        (PaymentPlan::Monthly, Some(emi)) => {
            // Registration fees live in a sub-ledger: receipts marked as
            // registration, or occupying the reserved slot 2.
            let registration_paid: f64 = receipts
                .iter()
                .filter(|r| {
                    r.purpose == ReceiptPurpose::Registration || r.installment_number == 2
                })
                .map(|r| r.amount_paid)
                .sum();
            let registration_outstanding = (emi.registration_fees - registration_paid).max(0.0);
            registration_outstanding
                + emi.monthly_installment.min(student.pending_fees.max(0.0))
        }
        _ => student.pending_fees.max(0.0),
    };

    PaymentSummaryResponse {
        total_received,
        due_amount,
        credit_amount,
        outstanding_amount,
        fees_method: student.payment_plan,
        emi_structure: student.emi_details.clone(),
    }
}

pub(crate) fn compute_ledger_summary(student: &Student, receipts: &[FeeReceipt]) -> LedgerSummary {
    let total_paid: f64 = receipts.iter().map(|r| r.amount_paid).sum();
    let total_course_fees = student.total_fees + student.admission_fee_amount;
    LedgerSummary {
        total_course_fees,
        total_paid,
        due_amount: total_course_fees - total_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmiDetails, PaymentMode, PaymentPlan};

    fn student(total_fees: f64) -> Student {
        Student::admit(
            "branch-1".to_string(),
            "course-1".to_string(),
            None,
            "Asha Patel".to_string(),
            "9876543210".to_string(),
            None,
            total_fees,
            PaymentPlan::OneTime,
            None,
        )
    }

    fn receipt(student_id: &str, amount: f64, purpose: ReceiptPurpose, installment: i32) -> FeeReceipt {
        let now = chrono::Utc::now();
        FeeReceipt {
            id: uuid::Uuid::new_v4().to_string(),
            receipt_no: "1".to_string(),
            student_id: student_id.to_string(),
            course_id: "course-1".to_string(),
            amount_paid: amount,
            payment_mode: PaymentMode::Cash,
            purpose,
            installment_number: installment,
            remarks: None,
            date: now,
            bank_name: None,
            cheque_number: None,
            cheque_date: None,
            transaction_id: None,
            transaction_date: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn first_receipt_of_registered_student_is_numbered_three() {
        assert_eq!(installment_number(0, true), 3);
        assert_eq!(installment_number(0, false), 1);
        assert_eq!(installment_number(1, false), 2);
        // The forced slot only applies to the very first receipt.
        assert_eq!(installment_number(1, true), 2);
        assert_eq!(installment_number(3, true), 4);
    }

    #[test]
    fn first_payment_is_always_admission() {
        assert_eq!(
            classify_purpose(true, Some("monthly installment")),
            ReceiptPurpose::Admission
        );
        assert_eq!(
            classify_purpose(false, Some("Registration Fee")),
            ReceiptPurpose::Registration
        );
        assert_eq!(classify_purpose(false, None), ReceiptPurpose::Installment);
        assert_eq!(
            classify_purpose(false, Some("July tuition")),
            ReceiptPurpose::Installment
        );
    }

    #[test]
    fn sms_purpose_line_falls_back_to_remark_matching() {
        assert_eq!(sms_purpose_line(true, None, 1), "Admission");
        assert_eq!(
            sms_purpose_line(false, Some("balance admission dues"), 4),
            "Admission"
        );
        assert_eq!(
            sms_purpose_line(false, Some("Registration Fee"), 3),
            "Registration"
        );
        assert_eq!(sms_purpose_line(false, None, 2), "Installment 2");
    }

    #[test]
    fn summary_takes_greater_of_course_and_paid_admission_fee() {
        let mut s = student(10000.0);
        s.is_admission_fees_paid = true;
        s.admission_fee_amount = 2000.0;
        let receipts = vec![
            receipt(&s.id, 2000.0, ReceiptPurpose::Admission, 1),
            receipt(&s.id, 3000.0, ReceiptPurpose::Installment, 2),
        ];

        // Course admission fee below what was actually paid
        let summary = compute_summary(&s, 1500.0, &receipts);
        assert_eq!(summary.total_received, 5000.0);
        assert_eq!(summary.due_amount, 12000.0 - 5000.0);
        assert_eq!(summary.credit_amount, 0.0);

        // Course admission fee above what was actually paid
        let summary = compute_summary(&s, 2500.0, &receipts);
        assert_eq!(summary.due_amount, 12500.0 - 5000.0);
    }

    #[test]
    fn overpayment_surfaces_as_credit() {
        let mut s = student(1000.0);
        s.is_admission_fees_paid = true;
        s.admission_fee_amount = 500.0;
        s.pending_fees = -200.0;
        let receipts = vec![
            receipt(&s.id, 500.0, ReceiptPurpose::Admission, 1),
            receipt(&s.id, 1200.0, ReceiptPurpose::Installment, 2),
        ];

        let summary = compute_summary(&s, 0.0, &receipts);
        assert_eq!(summary.due_amount, -200.0);
        assert_eq!(summary.credit_amount, 200.0);
        // A negative balance owes nothing right now.
        assert_eq!(summary.outstanding_amount, 0.0);
    }

    #[test]
    fn monthly_plan_outstanding_adds_unpaid_registration_share() {
        let mut s = student(12000.0);
        s.payment_plan = PaymentPlan::Monthly;
        s.emi_details = Some(EmiDetails {
            registration_fees: 1500.0,
            monthly_installment: 1000.0,
            months: 12,
        });
        s.is_admission_fees_paid = true;
        s.admission_fee_amount = 2000.0;
        s.pending_fees = 12000.0;

        // Registration only partially covered so far
        let receipts = vec![
            receipt(&s.id, 2000.0, ReceiptPurpose::Admission, 1),
            receipt(&s.id, 500.0, ReceiptPurpose::Registration, 2),
        ];
        let summary = compute_summary(&s, 2000.0, &receipts);
        assert_eq!(summary.outstanding_amount, 1000.0 + 1000.0);

        // Remaining balance smaller than one installment
        s.pending_fees = 300.0;
        let summary = compute_summary(&s, 2000.0, &receipts);
        assert_eq!(summary.outstanding_amount, 1000.0 + 300.0);
    }

    #[test]
    fn ledger_summary_includes_paid_admission_fee() {
        let mut s = student(10000.0);
        s.is_admission_fees_paid = true;
        s.admission_fee_amount = 2000.0;
        let receipts = vec![
            receipt(&s.id, 2000.0, ReceiptPurpose::Admission, 1),
            receipt(&s.id, 3000.0, ReceiptPurpose::Installment, 2),
        ];

        let summary = compute_ledger_summary(&s, &receipts);
        assert_eq!(summary.total_course_fees, 12000.0);
        assert_eq!(summary.total_paid, 5000.0);
        assert_eq!(summary.due_amount, 7000.0);
    }
}
