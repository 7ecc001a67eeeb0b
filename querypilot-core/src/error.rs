use std::time::Duration;
use thiserror::Error;

/// Invalid run settings. Fatal; raised before any connection is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("total requests must be greater than zero")]
    ZeroRequests,

    #[error("concurrency must be greater than zero")]
    ZeroConcurrency,

    #[error("employee id range {0}..={1} is empty")]
    EmptyIdRange(i64, i64),

    #[error("year window {0}..={1} is empty")]
    EmptyYearWindow(i32, i32),

    #[error("no values configured for {0}")]
    EmptyCategory(&'static str),
}

/// Failure to open a single connection.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConnectError(pub String);

/// The pool could not be established. Fatal; raised before dispatch.
#[derive(Debug, Error)]
pub enum PoolCreationError {
    #[error("unable to reach the database: {0}")]
    Connect(#[from] ConnectError),

    #[error("timed out after {} opening the first connection", human(.0))]
    Timeout(Duration),
}

/// No connection could be handed out for a request.
#[derive(Debug, Clone, Error)]
pub enum AcquisitionError {
    #[error("timed out after {} waiting for a connection", human(.0))]
    Timeout(Duration),

    #[error("failed to open connection: {0}")]
    Connect(#[from] ConnectError),

    #[error("connection pool is closed")]
    Closed,
}

/// A query failed once it reached the database.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("{0}")]
    Database(String),

    #[error("query timed out after {}", human(.0))]
    Timeout(Duration),
}

/// The dispatcher lost a worker outside the request boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("worker task terminated unexpectedly: {0}")]
    WorkerLost(String),

    #[error("run finished with {completed} of {total} outcomes")]
    Incomplete { completed: usize, total: usize },
}

/// A run could not start or did not finish.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

fn human(duration: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*duration)
}
