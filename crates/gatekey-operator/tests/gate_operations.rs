//! End-to-end gate operation flows against a mock device API and an
//! in-memory audit database.
//!
//! Every test asserts both sides of the orchestrator contract: the outcome
//! returned to the caller and the single audit row written for the attempt.

use gatekey_client::{ApiClientConfig, DeviceApiClient, RetryPolicy};
use gatekey_core::{AuditContext, DeviceCommand, DeviceId, FaultKind};
use gatekey_operator::{GateOperator, GateOperatorConfig, OperationOutcome};
use gatekey_storage::{Database, OperationLogRepository, SqliteOperationLogRepository};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const DEVICE_ID: &str = "00000000-0000-0000-0000-000000000001";
const TASK_ID: &str = "01234567-890a-bcde-f012-34567890abcd";

fn device_id() -> DeviceId {
    DeviceId::new(DEVICE_ID).unwrap()
}

fn client_for(server: &mockito::ServerGuard) -> DeviceApiClient {
    let config = ApiClientConfig::new(server.url(), "test-api-key")
        .timeout(Duration::from_secs(2))
        .max_retries(3)
        .retry_policy(RetryPolicy::new(
            Duration::from_millis(1),
            2,
            Duration::from_millis(4),
        ));
    DeviceApiClient::new(config).unwrap()
}

fn fast_polling() -> GateOperatorConfig {
    GateOperatorConfig::default()
        .poll_max_wait(Duration::from_millis(250))
        .poll_interval(Duration::from_millis(5))
}

fn operator_for(server: &mockito::ServerGuard, db: &Database) -> GateOperator {
    GateOperator::with_config(client_for(server), db.pool().clone(), fast_polling())
}

async fn audit_rows(db: &Database) -> Vec<gatekey_storage::OperationLog> {
    SqliteOperationLogRepository::new(db.pool().clone())
        .find_by_device(DEVICE_ID, 10)
        .await
        .unwrap()
}

fn mock_dispatch(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", format!("/devices/{DEVICE_ID}").as_str())
        .match_body(mockito::Matcher::Json(
            serde_json::json!({"command": "unlock"}),
        ))
        .with_status(200)
        .with_body(format!(r#"{{"task_id":"{TASK_ID}"}}"#))
}

#[tokio::test]
async fn unlock_completes_and_audits_success() {
    let mut server = mockito::Server::new_async().await;
    let db = Database::in_memory().await.unwrap();

    let dispatch = mock_dispatch(&mut server).create_async().await;
    let poll = server
        .mock("GET", "/action-result")
        .match_query(mockito::Matcher::UrlEncoded(
            "task_id".into(),
            TASK_ID.into(),
        ))
        .with_status(200)
        .with_body(r#"{"status":"terminated","successful":true}"#)
        .create_async()
        .await;

    let operator = operator_for(&server, &db);
    let outcome = operator
        .perform(
            &device_id(),
            DeviceCommand::Unlock,
            AuditContext::new()
                .with_license_plate("ABC-1234")
                .with_confidence(97.5),
        )
        .await;

    match &outcome {
        OperationOutcome::Completed { task_id } => assert_eq!(task_id.as_str(), TASK_ID),
        other => panic!("expected completion, got {other:?}"),
    }

    let logs = audit_rows(&db).await;
    assert_eq!(logs.len(), 1);
    assert!(logs[0].success);
    assert_eq!(logs[0].operation, "unlock");
    assert_eq!(logs[0].task_id.as_deref(), Some(TASK_ID));
    assert_eq!(logs[0].license_plate.as_deref(), Some("ABC-1234"));
    assert_eq!(logs[0].recognition_confidence, Some(97.5));
    assert_eq!(logs[0].error_message, None);

    dispatch.assert_async().await;
    poll.assert_async().await;
}

#[tokio::test]
async fn device_rejection_is_a_distinct_outcome_with_audit_row() {
    let mut server = mockito::Server::new_async().await;
    let db = Database::in_memory().await.unwrap();

    let _dispatch = mock_dispatch(&mut server).create_async().await;

    // Two in-flight polls, then a terminal-but-unsuccessful verdict.
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let _poll = server
        .mock("GET", "/action-result")
        .match_query(mockito::Matcher::UrlEncoded(
            "task_id".into(),
            TASK_ID.into(),
        ))
        .with_status(200)
        .with_body_from_request(move |_request| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                br#"{"status":"processing"}"#.to_vec()
            } else {
                br#"{"status":"terminated","successful":false,"error":"battery low"}"#.to_vec()
            }
        })
        .create_async()
        .await;

    let operator = operator_for(&server, &db);
    let outcome = operator
        .perform(&device_id(), DeviceCommand::Unlock, AuditContext::new())
        .await;

    match &outcome {
        OperationOutcome::Rejected { reason } => assert_eq!(reason, "battery low"),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let logs = audit_rows(&db).await;
    assert_eq!(logs.len(), 1);
    assert!(!logs[0].success);
    assert_eq!(logs[0].task_id.as_deref(), Some(TASK_ID));
    assert_eq!(logs[0].error_message.as_deref(), Some("battery low"));
}

#[tokio::test]
async fn unauthorized_dispatch_fails_after_one_attempt_with_audit_row() {
    let mut server = mockito::Server::new_async().await;
    let db = Database::in_memory().await.unwrap();

    let dispatch = server
        .mock("POST", format!("/devices/{DEVICE_ID}").as_str())
        .with_status(401)
        .with_body(r#"{"error":"bad key"}"#)
        .expect(1)
        .create_async()
        .await;

    let operator = operator_for(&server, &db);
    let outcome = operator
        .perform(&device_id(), DeviceCommand::Unlock, AuditContext::new())
        .await;

    match &outcome {
        OperationOutcome::Failed { fault } => {
            assert_eq!(fault.kind, FaultKind::Unauthorized);
            assert!(!fault.suggestion.is_empty());
        }
        other => panic!("expected fault, got {other:?}"),
    }

    let logs = audit_rows(&db).await;
    assert_eq!(logs.len(), 1);
    assert!(!logs[0].success);
    assert_eq!(logs[0].task_id, None);
    assert!(logs[0].error_message.is_some());

    dispatch.assert_async().await;
}

#[tokio::test]
async fn missing_task_id_is_an_unknown_fault() {
    let mut server = mockito::Server::new_async().await;
    let db = Database::in_memory().await.unwrap();

    let _dispatch = server
        .mock("POST", format!("/devices/{DEVICE_ID}").as_str())
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let operator = operator_for(&server, &db);
    let outcome = operator
        .perform(&device_id(), DeviceCommand::Lock, AuditContext::new())
        .await;

    match &outcome {
        OperationOutcome::Failed { fault } => {
            assert_eq!(fault.kind, FaultKind::Unknown);
            assert_eq!(
                fault.context.get("device_id").map(String::as_str),
                Some(DEVICE_ID)
            );
        }
        other => panic!("expected fault, got {other:?}"),
    }

    let logs = audit_rows(&db).await;
    assert_eq!(logs.len(), 1);
    assert!(!logs[0].success);
    assert_eq!(logs[0].operation, "lock");
}

#[tokio::test]
async fn poll_timeout_fails_with_task_id_in_audit_row() {
    let mut server = mockito::Server::new_async().await;
    let db = Database::in_memory().await.unwrap();

    let _dispatch = mock_dispatch(&mut server).create_async().await;
    let _poll = server
        .mock("GET", "/action-result")
        .match_query(mockito::Matcher::UrlEncoded(
            "task_id".into(),
            TASK_ID.into(),
        ))
        .with_status(200)
        .with_body(r#"{"status":"processing"}"#)
        .create_async()
        .await;

    let operator = GateOperator::with_config(
        client_for(&server),
        db.pool().clone(),
        fast_polling().poll_max_wait(Duration::from_millis(25)),
    );
    let outcome = operator
        .perform(&device_id(), DeviceCommand::Unlock, AuditContext::new())
        .await;

    match &outcome {
        OperationOutcome::Failed { fault } => {
            assert_eq!(fault.kind, FaultKind::Timeout);
            assert_eq!(
                fault.context.get("task_id").map(String::as_str),
                Some(TASK_ID)
            );
        }
        other => panic!("expected fault, got {other:?}"),
    }

    // The dispatch got far enough to assign a task, so the audit row keeps it.
    let logs = audit_rows(&db).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].task_id.as_deref(), Some(TASK_ID));
}

#[tokio::test]
async fn audit_write_failure_never_changes_the_outcome() {
    let mut server = mockito::Server::new_async().await;
    let db = Database::in_memory().await.unwrap();

    let _dispatch = mock_dispatch(&mut server).create_async().await;
    let _poll = server
        .mock("GET", "/action-result")
        .match_query(mockito::Matcher::UrlEncoded(
            "task_id".into(),
            TASK_ID.into(),
        ))
        .with_status(200)
        .with_body(r#"{"status":"terminated","successful":true}"#)
        .create_async()
        .await;

    let operator = operator_for(&server, &db);

    // Kill the audit sink before the operation runs.
    db.close().await;

    let outcome = operator
        .perform(&device_id(), DeviceCommand::Unlock, AuditContext::new())
        .await;

    assert!(outcome.is_completed());
}

#[tokio::test]
async fn each_perform_call_writes_its_own_audit_row() {
    let mut server = mockito::Server::new_async().await;
    let db = Database::in_memory().await.unwrap();

    let _dispatch = mock_dispatch(&mut server).create_async().await;
    let _poll = server
        .mock("GET", "/action-result")
        .match_query(mockito::Matcher::UrlEncoded(
            "task_id".into(),
            TASK_ID.into(),
        ))
        .with_status(200)
        .with_body(r#"{"status":"terminated","successful":true}"#)
        .create_async()
        .await;

    let operator = operator_for(&server, &db);
    for _ in 0..3 {
        let outcome = operator
            .perform(&device_id(), DeviceCommand::Unlock, AuditContext::new())
            .await;
        assert!(outcome.is_completed());
    }

    let logs = audit_rows(&db).await;
    assert_eq!(logs.len(), 3);
}
