//! In-memory stand-in for a database server.
//!
//! [`FakeDatabase`] implements [`DatabaseHandle`] directly and can also hand out a
//! [`FakeConnector`] for use behind a real [`ConnectionPool`](querypilot::ConnectionPool).
//! Failures, panics and latency are injected through predicates; every call is counted.
use metrics::counter;
use querypilot::{
    AcquisitionError, ConnectError, Connection, Connector, DatabaseHandle, ExecutionError, Query,
};
use rand_distr::{Distribution, Normal};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

type AcquirePredicate = Arc<dyn Fn(usize) -> bool + Send + Sync>;
type QueryFailure = Arc<dyn Fn(&Query) -> Option<String> + Send + Sync>;
type QueryPredicate = Arc<dyn Fn(&Query) -> bool + Send + Sync>;

pub const ACQUIRE_FAILURE: &str = "simulated connection failure";

#[derive(Clone, Default)]
struct Behavior {
    fail_acquire: Option<AcquirePredicate>,
    panic_acquire: Option<AcquirePredicate>,
    fail_query: Option<QueryFailure>,
    panic_query: Option<QueryPredicate>,
    latency: Option<Normal<f64>>,
    rows: usize,
}

#[derive(Default)]
struct Counters {
    acquire_calls: AtomicUsize,
    queries: AtomicUsize,
    live: AtomicUsize,
    high_water: AtomicUsize,
    released: AtomicUsize,
    discarded: AtomicUsize,
    refuse_connect: AtomicBool,
    executed: Mutex<Vec<Query>>,
}

/// Snapshot of a [`FakeDatabase`]'s counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FakeStats {
    /// Calls to [`DatabaseHandle::acquire`], failed ones included.
    pub acquire_calls: usize,
    pub queries: usize,
    /// Connections currently alive.
    pub live: usize,
    /// Most connections ever alive at once.
    pub high_water: usize,
    pub released: usize,
    pub discarded: usize,
}

#[derive(Clone, Default)]
pub struct FakeDatabase {
    behavior: Arc<Behavior>,
    counters: Arc<Counters>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the n-th acquisition (1-based) whenever `predicate(n)` holds.
    pub fn fail_acquire_when(
        mut self,
        predicate: impl Fn(usize) -> bool + Send + Sync + 'static,
    ) -> Self {
        Arc::make_mut(&mut self.behavior).fail_acquire = Some(Arc::new(predicate));
        self
    }

    /// Panics inside the n-th acquisition (1-based) whenever `predicate(n)` holds.
    pub fn panic_acquire_when(
        mut self,
        predicate: impl Fn(usize) -> bool + Send + Sync + 'static,
    ) -> Self {
        Arc::make_mut(&mut self.behavior).panic_acquire = Some(Arc::new(predicate));
        self
    }

    /// Fails a query with the returned message.
    pub fn fail_query_when(
        mut self,
        failure: impl Fn(&Query) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Arc::make_mut(&mut self.behavior).fail_query = Some(Arc::new(failure));
        self
    }

    pub fn panic_query_when(
        mut self,
        predicate: impl Fn(&Query) -> bool + Send + Sync + 'static,
    ) -> Self {
        Arc::make_mut(&mut self.behavior).panic_query = Some(Arc::new(predicate));
        self
    }

    /// Normally distributed query latency, clamped at zero.
    pub fn latency(mut self, mean: Duration, std_dev: Duration) -> Self {
        let normal = Normal::new(mean.as_secs_f64(), std_dev.as_secs_f64()).ok();
        Arc::make_mut(&mut self.behavior).latency = normal;
        self
    }

    /// Rows returned by every successful query.
    pub fn rows(mut self, rows: usize) -> Self {
        Arc::make_mut(&mut self.behavior).rows = rows;
        self
    }

    /// Connector sharing this database's behavior and counters.
    pub fn connector(&self) -> FakeConnector {
        FakeConnector { db: self.clone() }
    }

    pub fn stats(&self) -> FakeStats {
        let c = &self.counters;
        FakeStats {
            acquire_calls: c.acquire_calls.load(Ordering::SeqCst),
            queries: c.queries.load(Ordering::SeqCst),
            live: c.live.load(Ordering::SeqCst),
            high_water: c.high_water.load(Ordering::SeqCst),
            released: c.released.load(Ordering::SeqCst),
            discarded: c.discarded.load(Ordering::SeqCst),
        }
    }

    /// Every query that reached the database, in arrival order.
    pub fn executed(&self) -> Vec<Query> {
        self.counters
            .executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn open(&self) -> FakeConnection {
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.high_water.fetch_max(live, Ordering::SeqCst);
        FakeConnection {
            db: self.clone(),
            broken: false,
        }
    }
}

impl DatabaseHandle for FakeDatabase {
    type Connection = FakeConnection;

    async fn acquire(&self, _timeout: Duration) -> Result<FakeConnection, AcquisitionError> {
        let call = self.counters.acquire_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(panics) = &self.behavior.panic_acquire {
            if panics(call) {
                panic!("simulated pool panic on acquisition #{call}");
            }
        }
        if let Some(fail) = &self.behavior.fail_acquire {
            if fail(call) {
                debug!("Refusing acquisition #{call}");
                return Err(ConnectError(ACQUIRE_FAILURE.to_string()).into());
            }
        }
        Ok(self.open())
    }

    fn release(&self, conn: FakeConnection) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        drop(conn);
    }

    fn discard(&self, conn: FakeConnection) {
        self.counters.discarded.fetch_add(1, Ordering::SeqCst);
        drop(conn);
    }
}

/// Opens [`FakeConnection`]s for a [`ConnectionPool`](querypilot::ConnectionPool).
#[derive(Clone)]
pub struct FakeConnector {
    db: FakeDatabase,
}

impl FakeConnector {
    /// Makes subsequent connects fail until reset.
    pub fn refuse(&self, refuse: bool) {
        self.db.counters.refuse_connect.store(refuse, Ordering::SeqCst);
    }
}

impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self) -> Result<FakeConnection, ConnectError> {
        if self.db.counters.refuse_connect.load(Ordering::SeqCst) {
            return Err(ConnectError("connection refused".to_string()));
        }
        Ok(self.db.open())
    }
}

pub struct FakeConnection {
    db: FakeDatabase,
    broken: bool,
}

impl Connection for FakeConnection {
    type Rows = Vec<usize>;

    async fn execute(&mut self, query: &Query) -> Result<Vec<usize>, ExecutionError> {
        let counters = &self.db.counters;
        counters.queries.fetch_add(1, Ordering::SeqCst);
        counters
            .executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());
        counter!("mock-db.queries").increment(1);

        let behavior = self.db.behavior.clone();
        if let Some(normal) = behavior.latency {
            let secs = normal.sample(&mut rand::thread_rng()).max(0.);
            tokio::time::sleep(Duration::from_secs_f64(secs)).await;
        }

        if let Some(panics) = &behavior.panic_query {
            if panics(query) {
                self.broken = true;
                panic!("simulated driver panic");
            }
        }
        if let Some(fail) = &behavior.fail_query {
            if let Some(message) = fail(query) {
                return Err(ExecutionError::Database(message));
            }
        }
        Ok((0..behavior.rows).collect())
    }

    async fn drain(&mut self, rows: Vec<usize>) -> Result<usize, ExecutionError> {
        Ok(rows.into_iter().count())
    }

    fn is_healthy(&self) -> bool {
        !self.broken
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.db.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}
