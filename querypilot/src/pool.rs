//! Bounded pool of reusable connections.
//!
//! Capacity is enforced with semaphore slots: a connection is only opened while holding a slot
//! and only when no idle connection is available, so idle plus checked-out connections never
//! exceed the configured capacity.
use crate::database::{Connection, Connector, DatabaseHandle};
use querypilot_core::{AcquisitionError, ExecutionError, PoolCreationError, Query};
use std::future::Future;
use std::num::NonZeroUsize;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{timeout, timeout_at, Instant};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

pub struct ConnectionPool<C: Connector> {
    connector: C,
    capacity: usize,
    idle: Mutex<Vec<C::Connection>>,
    slots: Arc<Semaphore>,
    opened: AtomicUsize,
    discarded: AtomicUsize,
    high_water: AtomicUsize,
}

/// Point-in-time counters for a [`ConnectionPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub idle: usize,
    pub checked_out: usize,
    /// Most connections ever checked out at once.
    pub high_water: usize,
    pub opened: usize,
    pub discarded: usize,
}

impl<C: Connector> ConnectionPool<C> {
    /// Creates the pool and opens its first connection to prove the database is reachable.
    #[instrument(name = "pool", skip_all, fields(capacity = capacity.get()))]
    pub async fn connect(
        connector: C,
        capacity: NonZeroUsize,
        connect_timeout: Duration,
    ) -> Result<Self, PoolCreationError> {
        let first = match timeout(connect_timeout, connector.connect()).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(err)) => {
                error!("Unable to open the first connection: {err}");
                return Err(err.into());
            }
            Err(_) => {
                error!("Timed out opening the first connection");
                return Err(PoolCreationError::Timeout(connect_timeout));
            }
        };
        info!("Connection pool ready");

        Ok(Self {
            connector,
            capacity: capacity.get(),
            idle: Mutex::new(vec![first]),
            slots: Arc::new(Semaphore::new(capacity.get())),
            opened: AtomicUsize::new(1),
            discarded: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            idle: self.idle().len(),
            checked_out: self.checked_out(),
            high_water: self.high_water.load(Ordering::Relaxed),
            opened: self.opened.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

    /// Rejects all further acquisitions and drops idle connections.
    pub fn close(&self) {
        self.slots.close();
        self.idle().clear();
        debug!("Connection pool closed");
    }

    fn checked_out(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }

    fn idle(&self) -> std::sync::MutexGuard<'_, Vec<C::Connection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Connector> DatabaseHandle for ConnectionPool<C> {
    type Connection = Pooled<C::Connection>;

    async fn acquire(&self, wait: Duration) -> Result<Self::Connection, AcquisitionError> {
        // The slot wait and a possible connect share one deadline.
        let deadline = Instant::now() + wait;

        let slot = match timeout_at(deadline, self.slots.clone().acquire_owned()).await {
            Ok(Ok(slot)) => slot,
            Ok(Err(_)) => return Err(AcquisitionError::Closed),
            Err(_) => return Err(AcquisitionError::Timeout(wait)),
        };
        self.high_water
            .fetch_max(self.checked_out(), Ordering::Relaxed);

        let reused = self.idle().pop();
        let conn = match reused {
            Some(conn) => conn,
            None => match timeout_at(deadline, self.connector.connect()).await {
                Ok(Ok(conn)) => {
                    let opened = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!("Opened connection #{opened}");
                    conn
                }
                Ok(Err(err)) => return Err(err.into()),
                Err(_) => return Err(AcquisitionError::Timeout(wait)),
            },
        };

        Ok(Pooled { conn, slot })
    }

    fn release(&self, conn: Self::Connection) {
        let Pooled { conn, slot } = conn;
        if self.slots.is_closed() {
            trace!("Pool closed, dropping returned connection");
            drop(conn);
        } else if conn.is_healthy() {
            self.idle().push(conn);
        } else {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            debug!("Discarding unhealthy connection");
        }
        drop(slot);
    }

    fn discard(&self, conn: Self::Connection) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
        trace!("Discarding connection");
        drop(conn);
    }
}

/// A connection checked out of a [`ConnectionPool`].
///
/// Holds one capacity slot until released. Dropping it without releasing discards the connection.
#[derive(Debug)]
pub struct Pooled<T> {
    conn: T,
    slot: OwnedSemaphorePermit,
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.conn
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.conn
    }
}

impl<T: Connection> Connection for Pooled<T> {
    type Rows = T::Rows;

    fn execute(
        &mut self,
        query: &Query,
    ) -> impl Future<Output = Result<Self::Rows, ExecutionError>> + Send {
        self.conn.execute(query)
    }

    fn drain(
        &mut self,
        rows: Self::Rows,
    ) -> impl Future<Output = Result<usize, ExecutionError>> + Send {
        self.conn.drain(rows)
    }

    fn is_healthy(&self) -> bool {
        self.conn.is_healthy()
    }
}
