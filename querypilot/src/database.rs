//! The capabilities the engine needs from a database.
//!
//! A [`DatabaseHandle`] lends out [`Connection`]s, one per request. The engine never talks to a
//! driver directly; [`ConnectionPool`](crate::ConnectionPool) turns any [`Connector`] into a
//! bounded handle, and tests can implement the handle themselves.
use querypilot_core::{AcquisitionError, ConnectError, ExecutionError, Query};
use std::future::Future;
use std::time::Duration;

pub trait Connection: Send + 'static {
    /// Result set produced by [`execute`](Self::execute) and consumed by [`drain`](Self::drain).
    type Rows: Send;

    fn execute(
        &mut self,
        query: &Query,
    ) -> impl Future<Output = Result<Self::Rows, ExecutionError>> + Send;

    /// Consumes every row so the full transfer cost is paid. Returns the row count.
    fn drain(
        &mut self,
        rows: Self::Rows,
    ) -> impl Future<Output = Result<usize, ExecutionError>> + Send;

    /// Whether the connection can be handed to another request.
    fn is_healthy(&self) -> bool {
        true
    }
}

pub trait DatabaseHandle: Send + Sync + 'static {
    type Connection: Connection;

    fn acquire(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Connection, AcquisitionError>> + Send;

    /// Returns a connection after use. Unhealthy connections must not be handed out again.
    fn release(&self, conn: Self::Connection);

    /// Drops a connection whose state is unknown.
    fn discard(&self, conn: Self::Connection) {
        drop(conn);
    }
}

/// Opens new connections for a [`ConnectionPool`](crate::ConnectionPool).
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, ConnectError>> + Send;
}
