#![cfg_attr(docsrs, feature(doc_cfg))]
//! Synthetic read workloads for relational databases.
//!
//! A [`Workload`] dispatches a fixed number of requests over a fixed number of concurrent
//! workers. Each request leases one connection from a [`DatabaseHandle`], runs a randomly
//! chosen, freshly parameterized [`QueryTemplate`] and records an [`Outcome`]. Once every
//! request has completed the outcomes are folded into a [`Report`].
//!
//! Any driver can be plugged in by implementing [`Connector`] and wrapping it in a
//! [`ConnectionPool`]. A MySQL connector is available with the `mysql` feature.

mod database;
mod dispatcher;
mod executor;
mod pool;
mod report;
mod sampler;
mod template;
mod workload;

#[cfg(feature = "mysql")]
#[cfg_attr(docsrs, doc(cfg(feature = "mysql")))]
pub mod mysql;

pub use database::{Connection, Connector, DatabaseHandle};
pub use dispatcher::{Dispatcher, LogProgress, Progress, ProgressSink};
pub use executor::Executor;
pub use pool::{ConnectionPool, PoolStats, Pooled};
pub use report::summarize;
pub use sampler::{DateRange, Sampler};
pub use template::{QueryTemplate, Registry};
pub use workload::Workload;

pub use querypilot_core::{
    AcquisitionError, ActiveRecord, ConfigError, ConnectError, DispatchError, Domain,
    ExecutionError, HistogramEntry, Outcome, Param, PoolCreationError, Query, Report, RunConfig,
    RunError, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_ACTIVE_DATE, DEFAULT_MAX_EMPLOYEE_ID,
    DEFAULT_MIN_EMPLOYEE_ID, UNKNOWN_LABEL,
};

pub mod prelude {
    pub use crate::database::{Connection, Connector, DatabaseHandle};
    pub use crate::pool::ConnectionPool;
    pub use crate::template::Registry;
    pub use crate::workload::Workload;

    pub use querypilot_core::{
        AcquisitionError, ActiveRecord, ConnectError, Domain, ExecutionError, Query, Report,
        RunConfig, RunError,
    };
}
