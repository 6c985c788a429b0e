use chrono::Utc;
use mongodb::bson::{doc, DateTime as BsonDateTime};

use super::accounts::{generate_password, AccountProvisioner};
use super::database::Database;
use super::error::ServiceError;
use super::ledger::FeeLedger;
use super::metrics;
use super::notifier::{credentials_message, NotificationDispatcher};
use super::sequence::SequenceAllocator;
use crate::dtos::{ConfirmRegistrationRequest, RecordPaymentRequest};
use crate::models::Student;

const STUDENT_ROLE: &str = "student";
const DEFAULT_REGISTRATION_REMARK: &str = "Registration Fee";

/// Transitions a student from "admitted" to "registered" exactly once.
#[derive(Clone)]
pub struct RegistrationWorkflow {
    db: Database,
    sequences: SequenceAllocator,
    ledger: FeeLedger,
    accounts: AccountProvisioner,
    notifier: NotificationDispatcher,
}

impl RegistrationWorkflow {
    pub fn new(
        db: Database,
        sequences: SequenceAllocator,
        ledger: FeeLedger,
        accounts: AccountProvisioner,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            db,
            sequences,
            ledger,
            accounts,
            notifier,
        }
    }

    pub async fn confirm_registration(
        &self,
        student_id: &str,
        req: ConfirmRegistrationRequest,
    ) -> Result<Student, ServiceError> {
        let student = self
            .db
            .find_student(student_id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or(ServiceError::StudentNotFound)?;

        // Re-running the workflow would allocate a second registration
        // number and a second account.
        if student.is_registered {
            return Err(ServiceError::AlreadyRegistered);
        }

        let reg_no = match req.reg_no {
            Some(reg_no) if !reg_no.trim().is_empty() => reg_no,
            _ => {
                self.sequences
                    .next_registration_number(&student.branch_id)
                    .await?
            }
        };

        let email = student
            .email
            .clone()
            .unwrap_or_else(|| format!("{}@institute.com", reg_no));
        let username = req.username.unwrap_or_else(|| reg_no.clone());
        let password = req.password.unwrap_or_else(generate_password);

        let account = self
            .accounts
            .provision(
                &student.branch_id,
                &student.name,
                &username,
                &password,
                &email,
                STUDENT_ROLE,
            )
            .await?;

        let mut registration_fee_paid = false;
        if let Some(fee) = req.registration_fee {
            if fee.amount > 0.0 {
                self.ledger
                    .record_payment(
                        &student.id,
                        RecordPaymentRequest {
                            amount: fee.amount,
                            payment_mode: fee.payment_mode,
                            remarks: Some(
                                fee.remarks
                                    .unwrap_or_else(|| DEFAULT_REGISTRATION_REMARK.to_string()),
                            ),
                            bank_name: None,
                            cheque_number: None,
                            cheque_date: None,
                            transaction_id: None,
                            transaction_date: None,
                            created_by: None,
                        },
                    )
                    .await?;
                registration_fee_paid = true;
            }
        }

        let registration_date = Utc::now();
        let mut set = doc! {
            "reg_no": &reg_no,
            "is_registered": true,
            "registration_date": BsonDateTime::from_chrono(registration_date),
            "user_id": &account.id,
            "updated_at": BsonDateTime::now(),
        };
        if registration_fee_paid {
            set.insert("is_registration_fees_paid", true);
        }

        self.db
            .students()
            .update_one(doc! { "_id": &student.id }, doc! { "$set": set }, None)
            .await?;

        tracing::info!(
            student_id = %student.id,
            reg_no = %reg_no,
            user_id = %account.id,
            registration_fee_paid = registration_fee_paid,
            "registration confirmed"
        );
        metrics::record_registration(&student.branch_id);

        self.notifier.dispatch(
            vec![student.phone.clone()],
            credentials_message(&student.name, &account.username),
        );

        self.db
            .find_student(&student.id)
            .await
            .map_err(ServiceError::Internal)?
            .ok_or(ServiceError::StudentNotFound)
    }
}
