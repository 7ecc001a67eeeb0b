use mock_db::FakeDatabase;
use querypilot::prelude::*;
use std::sync::Arc;

#[tracing_test::traced_test]
#[tokio::test]
async fn default_progress_is_logged() {
    let db = FakeDatabase::new();
    Workload::new(Arc::new(db), RunConfig::new(40, 2).unwrap())
        .await
        .unwrap();

    assert!(logs_contain("4/40 requests complete (10%)"));
    assert!(logs_contain("40/40 requests complete (100%)"));
    assert!(logs_contain("Workload complete"));
}

#[tracing_test::traced_test]
#[tokio::test]
async fn acquisition_failures_are_traced() {
    let db = FakeDatabase::new().fail_acquire_when(|_| true);
    let report = Workload::new(Arc::new(db), RunConfig::new(3, 1).unwrap())
        .await
        .unwrap();

    assert_eq!(report.failure_count, 3);
    assert!(logs_contain("Refusing acquisition #3"));
}
