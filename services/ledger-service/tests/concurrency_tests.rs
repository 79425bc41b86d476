//! Concurrency tests for ledger admission
//!
//! - Uniqueness: concurrent submissions of one value commit exactly once
//! - Atomicity: concurrent distinct values all commit once retried by the caller
//! - Fail-fast: a held write lock yields DbBusy within a short bound
//! - Readers are never blocked by the writer

use ledger_service::config::DatabaseConfig;
use ledger_service::{Database, LedgerService, LedgerServiceError, ProcessResponse};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

async fn open_service(dir: &TempDir) -> Arc<LedgerService> {
    let config = DatabaseConfig {
        path: dir.path().join("numbers.db").to_string_lossy().into_owned(),
        max_connections: 8,
        ..DatabaseConfig::default()
    };
    let db = Database::connect(&config).await.unwrap();
    Arc::new(LedgerService::new(Arc::new(db), 1_000_000))
}

/// Resubmit while the ledger reports DbBusy, as a well-behaved caller would
async fn process_with_retry(
    service: &LedgerService,
    n: i64,
) -> Result<ProcessResponse, LedgerServiceError> {
    loop {
        match service.process(n).await {
            Err(LedgerServiceError::DbBusy) => tokio::time::sleep(Duration::from_millis(2)).await,
            other => return other,
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_value_commits_once() {
    let dir = tempfile::tempdir().unwrap();
    let service = open_service(&dir).await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.process(7).await }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(response) => {
                assert_eq!(response.result, 8);
                successes += 1;
            }
            Err(LedgerServiceError::Duplicate(7)) | Err(LedgerServiceError::DbBusy) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(service.record_count().await.unwrap(), 1);
    assert!(matches!(
        service.process(7).await,
        Err(LedgerServiceError::Duplicate(7))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_value_with_retries_reports_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let service = open_service(&dir).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            process_with_retry(&service, 11).await
        }));
    }

    let mut successes = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(LedgerServiceError::Duplicate(11)) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(duplicates, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_values_all_commit() {
    let dir = tempfile::tempdir().unwrap();
    let service = open_service(&dir).await;

    // Even values only, so no submission is another's predecessor
    let values: Vec<i64> = (0..32).map(|i| i * 2).collect();

    let mut handles = Vec::new();
    for n in values.clone() {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            process_with_retry(&service, n).await
        }));
    }

    for (handle, n) in handles.into_iter().zip(&values) {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.result, n + 1);
    }

    assert_eq!(service.record_count().await.unwrap(), values.len() as i64);
    for n in values {
        assert_eq!(service.lookup(n).await.unwrap().value, n);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_held_write_lock_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let service = open_service(&dir).await;
    service.process(1).await.unwrap();

    let held = service.db.begin_immediate().await.unwrap();

    let started = Instant::now();
    let outcome = tokio::time::timeout(Duration::from_secs(2), service.process(3))
        .await
        .expect("process must not wait for the write lock");
    assert!(matches!(outcome, Err(LedgerServiceError::DbBusy)));
    assert!(started.elapsed() < Duration::from_secs(1));

    // Readers still see committed data while the writer holds the lock
    assert_eq!(service.lookup(1).await.unwrap().value, 1);
    assert_eq!(service.record_count().await.unwrap(), 1);

    held.rollback().await.unwrap();
    assert_eq!(service.process(3).await.unwrap().result, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_uncommitted_insert_is_invisible_to_readers() {
    let dir = tempfile::tempdir().unwrap();
    let service = open_service(&dir).await;

    let mut held = service.db.begin_immediate().await.unwrap();
    held.insert(&ledger_service::ProcessedNumber::new(20))
        .await
        .unwrap();

    assert!(service.db.get(20).await.unwrap().is_none());

    held.commit().await.unwrap();
    assert!(service.db.get(20).await.unwrap().is_some());
}
