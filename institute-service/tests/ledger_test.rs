mod common;

use common::TestApp;
use serde_json::json;

// These tests run against a real MongoDB replica set; transactions are not
// available on a standalone mongod.

#[tokio::test]
#[ignore] // Requires running MongoDB
async fn first_payment_is_admission_and_assigns_enrollment() {
    let app = TestApp::spawn().await;
    let branch_id = app.create_branch("Main Center", "MN").await;
    let course_id = app.create_course("Full Stack", 2000.0).await;
    let student_id = app.admit_student(&branch_id, &course_id, 10000.0).await;

    let response = app
        .post(
            &format!("/students/{}/payments", student_id),
            json!({ "amount": 2000.0, "payment_mode": "Cash" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let receipt: serde_json::Value = response.json().await.unwrap();
    assert_eq!(receipt["purpose"], "Admission");
    assert_eq!(receipt["installment_number"], 1);
    assert_eq!(receipt["receipt_no"], "1");

    let student = app.fetch_student(&student_id).await;
    assert_eq!(student["is_admission_fees_paid"], true);
    assert_eq!(student["admission_fee_amount"], 2000.0);
    // Admission fee is additive to tuition: the balance is untouched.
    assert_eq!(student["pending_fees"], 10000.0);
    assert_eq!(student["enrollment_no"], "1");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires running MongoDB
async fn later_payments_decrement_pending_fees() {
    let app = TestApp::spawn().await;
    let branch_id = app.create_branch("Main Center", "MN").await;
    let course_id = app.create_course("Full Stack", 2000.0).await;
    let student_id = app.admit_student(&branch_id, &course_id, 10000.0).await;

    app.post(
        &format!("/students/{}/payments", student_id),
        json!({ "amount": 2000.0, "payment_mode": "Cash" }),
    )
    .await;

    let response = app
        .post(
            &format!("/students/{}/payments", student_id),
            json!({ "amount": 3000.0, "payment_mode": "Online/UPI", "transaction_id": "UPI-1" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let receipt: serde_json::Value = response.json().await.unwrap();
    assert_eq!(receipt["purpose"], "Installment");
    assert_eq!(receipt["installment_number"], 2);

    let student = app.fetch_student(&student_id).await;
    assert_eq!(student["pending_fees"], 7000.0);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires running MongoDB
async fn update_receipt_rebalances_by_the_delta() {
    let app = TestApp::spawn().await;
    let branch_id = app.create_branch("Main Center", "MN").await;
    let course_id = app.create_course("Full Stack", 2000.0).await;
    let student_id = app.admit_student(&branch_id, &course_id, 10000.0).await;

    app.post(
        &format!("/students/{}/payments", student_id),
        json!({ "amount": 2000.0, "payment_mode": "Cash" }),
    )
    .await;
    let receipt: serde_json::Value = app
        .post(
            &format!("/students/{}/payments", student_id),
            json!({ "amount": 3000.0, "payment_mode": "Cash" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let receipt_id = receipt["id"].as_str().unwrap();

    let response = app
        .patch(
            &format!("/receipts/{}", receipt_id),
            json!({ "amount": 3500.0 }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["amount_paid"], 3500.0);

    let student = app.fetch_student(&student_id).await;
    // 10000 - 3000 - 500 extra
    assert_eq!(student["pending_fees"], 6500.0);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires running MongoDB
async fn delete_then_identical_recreate_round_trips_the_balance() {
    let app = TestApp::spawn().await;
    let branch_id = app.create_branch("Main Center", "MN").await;
    let course_id = app.create_course("Full Stack", 2000.0).await;
    let student_id = app.admit_student(&branch_id, &course_id, 10000.0).await;

    app.post(
        &format!("/students/{}/payments", student_id),
        json!({ "amount": 2000.0, "payment_mode": "Cash" }),
    )
    .await;
    let receipt: serde_json::Value = app
        .post(
            &format!("/students/{}/payments", student_id),
            json!({ "amount": 3000.0, "payment_mode": "Cash" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let receipt_id = receipt["id"].as_str().unwrap();

    let before = app.fetch_student(&student_id).await["pending_fees"].clone();

    let response = app.delete(&format!("/receipts/{}", receipt_id)).await;
    assert_eq!(response.status(), 204);
    let student = app.fetch_student(&student_id).await;
    assert_eq!(student["pending_fees"], 10000.0);

    app.post(
        &format!("/students/{}/payments", student_id),
        json!({ "amount": 3000.0, "payment_mode": "Cash" }),
    )
    .await;
    let student = app.fetch_student(&student_id).await;
    assert_eq!(student["pending_fees"], before);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires running MongoDB
async fn non_positive_amounts_are_rejected_before_any_write() {
    let app = TestApp::spawn().await;
    let branch_id = app.create_branch("Main Center", "MN").await;
    let course_id = app.create_course("Full Stack", 2000.0).await;
    let student_id = app.admit_student(&branch_id, &course_id, 10000.0).await;

    let response = app
        .post(
            &format!("/students/{}/payments", student_id),
            json!({ "amount": -50.0, "payment_mode": "Cash" }),
        )
        .await;
    assert_eq!(response.status(), 422);

    let ledger: serde_json::Value = app
        .get(&format!("/students/{}/ledger", student_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(ledger["receipts"].as_array().unwrap().len(), 0);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires running MongoDB
async fn payment_for_unknown_student_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/students/no-such-student/payments",
            json!({ "amount": 100.0, "payment_mode": "Cash" }),
        )
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires running MongoDB
async fn summary_and_ledger_report_consistent_totals() {
    let app = TestApp::spawn().await;
    let branch_id = app.create_branch("Main Center", "MN").await;
    let course_id = app.create_course("Full Stack", 2500.0).await;
    let student_id = app.admit_student(&branch_id, &course_id, 10000.0).await;

    app.post(
        &format!("/students/{}/payments", student_id),
        json!({ "amount": 2000.0, "payment_mode": "Cash" }),
    )
    .await;
    app.post(
        &format!("/students/{}/payments", student_id),
        json!({ "amount": 3000.0, "payment_mode": "Cash" }),
    )
    .await;

    let summary: serde_json::Value = app
        .get(&format!("/students/{}/payments/summary", student_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(summary["total_received"], 5000.0);
    // Course admission fee (2500) exceeds the amount actually paid (2000).
    assert_eq!(summary["due_amount"], 10000.0 + 2500.0 - 5000.0);
    assert_eq!(summary["credit_amount"], 0.0);
    assert_eq!(summary["fees_method"], "OneTime");

    let ledger: serde_json::Value = app
        .get(&format!("/students/{}/ledger", student_id))
        .await
        .json()
        .await
        .unwrap();
    let receipts = ledger["receipts"].as_array().unwrap();
    assert_eq!(receipts.len(), 2);
    // Ascending by date
    assert_eq!(receipts[0]["amount_paid"], 2000.0);
    assert_eq!(receipts[1]["amount_paid"], 3000.0);
    assert_eq!(ledger["summary"]["total_course_fees"], 12000.0);
    assert_eq!(ledger["summary"]["total_paid"], 5000.0);
    assert_eq!(ledger["summary"]["due_amount"], 7000.0);

    app.cleanup().await;
}
