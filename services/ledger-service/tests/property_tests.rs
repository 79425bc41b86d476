//! Property-based tests for ledger invariants
//!
//! Random submission sequences are replayed against the ledger and against a
//! set-based model:
//! - Uniqueness: a value is admitted at most once
//! - No successor before self: `n` is refused once `n + 1` is recorded
//! - Range: values outside `0..=N_MAX` never touch the ledger

use ledger_service::config::DatabaseConfig;
use ledger_service::{Database, LedgerService, LedgerServiceError};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

const N_MAX: i64 = 40;

#[derive(Debug, PartialEq, Eq)]
enum Expected {
    Admitted(i64),
    Duplicate,
    PredecessorProcessed,
    OutOfRange,
}

/// What the ledger should answer given the values already admitted
fn model_step(admitted: &mut BTreeSet<i64>, n: i64) -> Expected {
    if n < 0 || n > N_MAX {
        Expected::OutOfRange
    } else if admitted.contains(&n) {
        Expected::Duplicate
    } else if admitted.contains(&(n + 1)) {
        Expected::PredecessorProcessed
    } else {
        admitted.insert(n);
        Expected::Admitted(n + 1)
    }
}

fn observed(outcome: Result<i64, LedgerServiceError>) -> Expected {
    match outcome {
        Ok(result) => Expected::Admitted(result),
        Err(LedgerServiceError::Duplicate(_)) => Expected::Duplicate,
        Err(LedgerServiceError::PredecessorProcessed(_)) => Expected::PredecessorProcessed,
        Err(LedgerServiceError::Validation(_)) => Expected::OutOfRange,
        Err(e) => panic!("unexpected error: {e}"),
    }
}

async fn create_test_service(dir: &tempfile::TempDir) -> LedgerService {
    let config = DatabaseConfig {
        path: dir.path().join("numbers.db").to_string_lossy().into_owned(),
        ..DatabaseConfig::default()
    };
    let db = Database::connect(&config).await.unwrap();
    LedgerService::new(Arc::new(db), N_MAX)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the ledger answers exactly like the set model
    #[test]
    fn prop_ledger_matches_model(submissions in prop::collection::vec(-2i64..N_MAX + 3, 1..40)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let service = create_test_service(&dir).await;
            let mut admitted = BTreeSet::new();

            for n in submissions {
                let expected = model_step(&mut admitted, n);
                let actual = observed(service.process(n).await.map(|r| r.result));
                prop_assert_eq!(actual, expected, "n={}", n);
            }

            prop_assert_eq!(service.record_count().await.unwrap(), admitted.len() as i64);
            Ok(())
        })?;
    }

    /// Property: once n + 1 is recorded, n is never admitted
    #[test]
    fn prop_successor_blocks_value(n in 0i64..N_MAX) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let service = create_test_service(&dir).await;

            prop_assert!(service.process(n + 1).await.is_ok());
            let outcome = service.process(n).await;
            prop_assert!(
                matches!(outcome, Err(LedgerServiceError::PredecessorProcessed(v)) if v == n),
                "got {:?}",
                outcome
            );
            Ok(())
        })?;
    }
}
