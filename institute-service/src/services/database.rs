use anyhow::Result;
use futures::TryStreamExt;
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{bson::doc, Client, Collection, Database as MongoDatabase, IndexModel};

use crate::models::{Batch, Branch, Course, FeeReceipt, SequenceCounter, Student, UserAccount};

/// MongoDB wrapper with one typed accessor per collection.
///
/// Multi-document writes are orchestrated by the services through
/// `client().start_session`; everything here is a single round trip.
#[derive(Clone)]
pub struct Database {
    client: Client,
    db: MongoDatabase,
}

impl Database {
    pub fn new(client: Client, db: MongoDatabase) -> Self {
        Self { client, db }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn students(&self) -> Collection<Student> {
        self.db.collection("students")
    }

    pub fn receipts(&self) -> Collection<FeeReceipt> {
        self.db.collection("fee_receipts")
    }

    pub fn branches(&self) -> Collection<Branch> {
        self.db.collection("branches")
    }

    pub fn courses(&self) -> Collection<Course> {
        self.db.collection("courses")
    }

    pub fn batches(&self) -> Collection<Batch> {
        self.db.collection("batches")
    }

    pub fn counters(&self) -> Collection<SequenceCounter> {
        self.db.collection("sequence_counters")
    }

    pub fn users(&self) -> Collection<UserAccount> {
        self.db.collection("users")
    }

    /// Initialize the unique indexes the numbering scheme depends on.
    /// Duplicate counter values surface as write errors here instead of
    /// silently colliding.
    pub async fn init_indexes(&self) -> Result<()> {
        let receipt_no_index = IndexModel::builder()
            .keys(doc! { "receipt_no": 1 })
            .options(
                IndexOptions::builder()
                    .name("receipt_no_unique_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let student_receipts_index = IndexModel::builder()
            .keys(doc! { "student_id": 1, "date": 1 })
            .options(
                IndexOptions::builder()
                    .name("student_receipts_idx".to_string())
                    .build(),
            )
            .build();

        self.receipts()
            .create_indexes([receipt_no_index, student_receipts_index], None)
            .await?;

        // Enrollment numbers are unique within a branch, registration
        // numbers globally; both fields are absent until assigned.
        let enrollment_index = IndexModel::builder()
            .keys(doc! { "branch_id": 1, "enrollment_no": 1 })
            .options(
                IndexOptions::builder()
                    .name("branch_enrollment_unique_idx".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "enrollment_no": { "$exists": true } })
                    .build(),
            )
            .build();

        let reg_no_index = IndexModel::builder()
            .keys(doc! { "reg_no": 1 })
            .options(
                IndexOptions::builder()
                    .name("reg_no_unique_idx".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "reg_no": { "$exists": true } })
                    .build(),
            )
            .build();

        let branch_students_index = IndexModel::builder()
            .keys(doc! { "branch_id": 1, "is_deleted": 1 })
            .options(
                IndexOptions::builder()
                    .name("branch_students_idx".to_string())
                    .build(),
            )
            .build();

        self.students()
            .create_indexes([enrollment_index, reg_no_index, branch_students_index], None)
            .await?;

        let username_index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(
                IndexOptions::builder()
                    .name("username_unique_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.users().create_indexes([username_index], None).await?;

        tracing::info!("Institute service indexes initialized");
        Ok(())
    }

    pub async fn find_student(&self, id: &str) -> Result<Option<Student>> {
        let student = self
            .students()
            .find_one(doc! { "_id": id, "is_deleted": false }, None)
            .await?;
        Ok(student)
    }

    pub async fn find_receipt(&self, id: &str) -> Result<Option<FeeReceipt>> {
        let receipt = self.receipts().find_one(doc! { "_id": id }, None).await?;
        Ok(receipt)
    }

    pub async fn find_branch(&self, id: &str) -> Result<Option<Branch>> {
        let branch = self.branches().find_one(doc! { "_id": id }, None).await?;
        Ok(branch)
    }

    pub async fn find_course(&self, id: &str) -> Result<Option<Course>> {
        let course = self.courses().find_one(doc! { "_id": id }, None).await?;
        Ok(course)
    }

    pub async fn find_batch(&self, id: &str) -> Result<Option<Batch>> {
        let batch = self.batches().find_one(doc! { "_id": id }, None).await?;
        Ok(batch)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<UserAccount>> {
        let user = self
            .users()
            .find_one(doc! { "username": username }, None)
            .await?;
        Ok(user)
    }

    /// A student's receipts ordered by payment date ascending.
    pub async fn receipts_for_student(&self, student_id: &str) -> Result<Vec<FeeReceipt>> {
        let options = FindOptions::builder().sort(doc! { "date": 1 }).build();
        let cursor = self
            .receipts()
            .find(doc! { "student_id": student_id }, Some(options))
            .await?;
        let receipts: Vec<FeeReceipt> = cursor.try_collect().await?;
        Ok(receipts)
    }

    pub async fn count_receipts_for_student(&self, student_id: &str) -> Result<u64> {
        let count = self
            .receipts()
            .count_documents(doc! { "student_id": student_id }, None)
            .await?;
        Ok(count)
    }

    /// Active (non-deleted) students of a branch, newest first.
    pub async fn students_in_branch(&self, branch_id: &str) -> Result<Vec<Student>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let cursor = self
            .students()
            .find(doc! { "branch_id": branch_id, "is_deleted": false }, Some(options))
            .await?;
        let students: Vec<Student> = cursor.try_collect().await?;
        Ok(students)
    }
}
