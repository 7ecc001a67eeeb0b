mod utils;
#[allow(unused)]
use utils::*;

use mock_db::{FakeDatabase, ACQUIRE_FAILURE};
use querypilot::prelude::*;
use querypilot::{
    summarize, Dispatcher, Executor, Outcome, Progress, QueryTemplate, Sampler, UNKNOWN_LABEL,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn ping(_: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new("SELECT 1")
}

fn ping_registry() -> Registry {
    Registry::new(vec![QueryTemplate::new("Ping", ping)])
}

async fn dispatch(
    db: &FakeDatabase,
    registry: Registry,
    config: RunConfig,
) -> Vec<Outcome> {
    let executor = Executor::new(Arc::new(db.clone()), registry)
        .acquire_timeout(config.acquire_timeout)
        .query_timeout(config.query_timeout);
    Dispatcher::new(executor, &config)
        .progress(|_: Progress| {})
        .run()
        .await
        .unwrap()
}

fn jittery() -> FakeDatabase {
    FakeDatabase::new()
        .rows(5)
        .latency(Duration::from_micros(500), Duration::from_micros(200))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn produces_exactly_one_outcome_per_request() {
    init();
    for (total, concurrency) in [(1, 1), (13, 4), (5, 32), (250, 16)] {
        let db = jittery();
        let config = RunConfig::new(total, concurrency).unwrap();
        let outcomes = dispatch(&db, Registry::employees(), config).await;

        assert_eq!(outcomes.len(), total);
        let stats = db.stats();
        assert_eq!(stats.acquire_calls, total);
        assert_eq!(stats.queries, total);
        assert_eq!(stats.released + stats.discarded, total);
        assert_eq!(stats.live, 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn checkouts_never_exceed_concurrency() {
    init();
    let db = jittery();
    let outcomes = dispatch(&db, Registry::employees(), RunConfig::new(400, 6).unwrap()).await;

    assert_eq!(outcomes.len(), 400);
    let stats = db.stats();
    assert!(stats.high_water <= 6, "{stats:?}");
    assert!(stats.high_water >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn labels_come_from_the_registry() {
    init();
    let db = jittery().fail_acquire_when(|call| call % 7 == 0);
    let registry = Registry::employees();
    let outcomes = dispatch(&db, registry.clone(), RunConfig::new(300, 8).unwrap()).await;

    for outcome in &outcomes {
        if outcome.label() == UNKNOWN_LABEL {
            assert!(!outcome.is_success());
            assert!(outcome.message().unwrap().contains(ACQUIRE_FAILURE));
        } else {
            assert!(registry.contains(outcome.label()), "{outcome:?}");
        }
    }
    let unknown = outcomes.iter().filter(|o| o.label() == UNKNOWN_LABEL).count();
    assert_eq!(unknown, 300 / 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn histograms_add_up() {
    init();
    // Distinct messages per employee id, far more than the error histogram keeps.
    let db = jittery().fail_query_when(|q| {
        q.sql
            .contains("salaries")
            .then(|| format!("deadlock on {:?}", q.params.first()))
    });
    let outcomes = dispatch(&db, Registry::employees(), RunConfig::new(500, 10).unwrap()).await;
    let report = summarize(&outcomes, Duration::from_secs(1), 10);

    let labelled: usize = report.label_histogram.iter().map(|e| e.count).sum();
    assert_eq!(labelled, report.success_count);
    assert_eq!(report.success_count + report.failure_count, 500);

    assert!(report.failure_count > 0);
    assert!(!report.error_histogram.is_empty());
    assert!(report.error_histogram.len() <= 5);
    assert!(report.error_histogram.iter().all(|e| e.count >= 1));
    assert!(report
        .error_histogram
        .windows(2)
        .all(|w| w[0].count >= w[1].count));
    assert!(report
        .label_histogram
        .windows(2)
        .all(|w| w[0].count >= w[1].count));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn single_template_all_succeed() {
    init();
    let db = FakeDatabase::new();
    let report = Workload::new(Arc::new(db.clone()), RunConfig::new(10, 1).unwrap())
        .registry(ping_registry())
        .await
        .unwrap();

    assert_eq!(report.total_requests, 10);
    assert_eq!(report.success_count, 10);
    assert_eq!(report.failure_count, 0);
    assert_eq!(report.label_histogram.len(), 1);
    assert_eq!(report.label_histogram[0].key, "Ping");
    assert_eq!(report.label_histogram[0].count, 10);
    assert!(report.error_histogram.is_empty());
    assert!(report.throughput > 0.);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn odd_acquisitions_fail() {
    init();
    let db = FakeDatabase::new().fail_acquire_when(|call| call % 2 == 1);
    let report = Workload::new(Arc::new(db.clone()), RunConfig::new(20, 4).unwrap())
        .registry(ping_registry())
        .await
        .unwrap();

    assert_eq!(report.success_count, 10);
    assert_eq!(report.failure_count, 10);
    assert_eq!(report.label_histogram.len(), 1);
    assert_eq!(report.label_histogram[0].count, 10);
    assert_eq!(report.error_histogram.len(), 1);
    assert_eq!(report.error_histogram[0].count, 10);
    assert!(report.error_histogram[0].key.contains(ACQUIRE_FAILURE));
    assert_eq!(db.stats().acquire_calls, 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn hundred_requests_report_ten_milestones() {
    init();
    let seen = Arc::new(Mutex::new(vec![]));
    let sink = {
        let seen = seen.clone();
        move |progress: Progress| {
            assert_eq!(progress.total, 100);
            seen.lock().unwrap().push(progress.completed);
        }
    };
    Workload::new(Arc::new(jittery()), RunConfig::new(100, 7).unwrap())
        .progress(sink)
        .await
        .unwrap();

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn report_is_a_pure_function_of_outcomes() {
    init();
    let db = jittery().fail_acquire_when(|call| call % 3 == 0);
    let outcomes = dispatch(&db, Registry::employees(), RunConfig::new(60, 5).unwrap()).await;

    let elapsed = Duration::from_millis(750);
    let first = summarize(&outcomes, elapsed, 5);
    let second = summarize(&outcomes, elapsed, 5);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn panics_are_contained() {
    init();
    let db = jittery().panic_query_when(|q| q.sql.contains("heartbeat"));
    let outcomes = dispatch(&db, Registry::employees(), RunConfig::new(600, 8).unwrap()).await;

    assert_eq!(outcomes.len(), 600);
    let panicked: Vec<_> = outcomes
        .iter()
        .filter(|o| o.label() == "Sys: Heartbeat")
        .collect();
    assert!(!panicked.is_empty());
    for outcome in &panicked {
        assert!(!outcome.is_success());
        assert!(outcome.message().unwrap().starts_with("unexpected error:"));
    }
    let stats = db.stats();
    assert_eq!(stats.discarded, panicked.len());
    assert_eq!(stats.live, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn seeded_runs_repeat() {
    init();
    let mut runs = vec![];
    for _ in 0..2 {
        let db = FakeDatabase::new();
        let config = RunConfig::new(50, 1).unwrap().with_seed(1234);
        dispatch(&db, Registry::employees(), config).await;
        runs.push(db.executed());
    }
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0].len(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn query_timeouts_fail_with_label() {
    init();
    let db = FakeDatabase::new().latency(Duration::from_millis(200), Duration::ZERO);
    let start = Instant::now();
    let report = Workload::new(Arc::new(db.clone()), RunConfig::new(8, 8).unwrap())
        .registry(ping_registry())
        .query_timeout(Duration::from_millis(20))
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_millis(190));
    assert_eq!(report.failure_count, 8);
    assert_eq!(report.error_histogram.len(), 1);
    assert!(report.error_histogram[0].key.starts_with("query timed out"));
    assert_eq!(db.stats().discarded, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn acquisition_panic_does_not_abort_the_run() {
    init();
    let db = FakeDatabase::new().panic_acquire_when(|call| call == 3);
    let outcomes = dispatch(&db, ping_registry(), RunConfig::new(10, 2).unwrap()).await;

    let unknown: Vec<_> = outcomes
        .iter()
        .filter(|o| o.label() == UNKNOWN_LABEL)
        .collect();
    assert_eq!(unknown.len(), 1);
    assert!(!unknown[0].is_success());

    let report = summarize(&outcomes, Duration::from_millis(100), 2);
    assert_eq!(report.success_count + report.failure_count, 10);
    assert_eq!(report.failure_count, 1);
    assert_eq!(report.error_histogram.len(), 1);
    assert!(report.error_histogram[0]
        .key
        .starts_with("unexpected error: simulated pool panic"));
    assert_eq!(report.label_histogram[0].key, "Ping");
    assert_eq!(report.label_histogram[0].count, 9);
    assert_eq!(db.stats().acquire_calls, 10);
    assert_eq!(db.stats().live, 0);
}
