mod utils;
#[allow(unused)]
use utils::*;

use mock_db::FakeDatabase;
use querypilot::prelude::*;
use querypilot::{PoolCreationError, UNKNOWN_LABEL};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

async fn pool(db: &FakeDatabase, capacity: usize) -> Arc<ConnectionPool<mock_db::FakeConnector>> {
    let pool = ConnectionPool::connect(
        db.connector(),
        NonZeroUsize::new(capacity).unwrap(),
        Duration::from_secs(1),
    )
    .await
    .unwrap();
    Arc::new(pool)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn pool_bounds_open_connections() {
    init();
    let db = FakeDatabase::new()
        .rows(2)
        .latency(Duration::from_millis(1), Duration::from_micros(300));
    let pool = pool(&db, 3).await;

    let report = Workload::new(pool.clone(), RunConfig::new(300, 12).unwrap())
        .await
        .unwrap();

    assert_eq!(report.total_requests, 300);
    assert_eq!(report.failure_count, 0);

    let stats = pool.stats();
    assert!(stats.high_water <= 3, "{stats:?}");
    assert!(stats.opened <= 3, "{stats:?}");
    assert_eq!(stats.checked_out, 0);
    assert!(db.stats().high_water <= 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn exhausted_pool_times_out_requests() {
    init();
    let db = FakeDatabase::new().latency(Duration::from_millis(100), Duration::ZERO);
    let pool = pool(&db, 1).await;

    let report = Workload::new(pool.clone(), RunConfig::new(4, 4).unwrap())
        .acquire_timeout(Duration::from_millis(10))
        .await
        .unwrap();

    assert_eq!(report.success_count, 1);
    assert_eq!(report.failure_count, 3);
    assert_eq!(report.error_histogram.len(), 1);
    assert!(report.error_histogram[0]
        .key
        .starts_with("timed out after 10ms waiting for a connection"));
    assert!(!report.label_histogram.iter().any(|e| e.key == UNKNOWN_LABEL));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn broken_connections_are_replaced() {
    init();
    let db = FakeDatabase::new().panic_query_when(|q| q.sql.contains("heartbeat"));
    let pool = pool(&db, 2).await;

    let report = Workload::new(pool.clone(), RunConfig::new(200, 2).unwrap())
        .seed(99)
        .await
        .unwrap();

    let panicked = report
        .error_histogram
        .iter()
        .find(|e| e.key.starts_with("unexpected error"))
        .map(|e| e.count)
        .unwrap_or_default();
    assert!(panicked > 0);
    let stats = pool.stats();
    assert_eq!(stats.discarded, panicked);
    assert!(stats.opened <= 2 + panicked);
    assert!(db.stats().live <= 2);
}

#[tokio::test]
async fn unreachable_database_is_fatal() {
    init();
    let db = FakeDatabase::new();
    let connector = db.connector();
    connector.refuse(true);

    let err = ConnectionPool::connect(connector, NonZeroUsize::new(4).unwrap(), Duration::from_secs(1))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, PoolCreationError::Connect(_)));
    assert_eq!(err.to_string(), "unable to reach the database: connection refused");
}
