//! The run entry point: configure a workload, then `.await` it for a [`Report`].
use crate::database::DatabaseHandle;
use crate::dispatcher::{Dispatcher, LogProgress, ProgressSink};
use crate::executor::Executor;
use crate::report::summarize;
use crate::template::Registry;
use querypilot_core::{ActiveRecord, Domain, Report, RunConfig, RunError};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// A configured run against a [`DatabaseHandle`].
///
/// Nothing happens until the workload is polled. It then dispatches
/// `total_requests` requests and resolves to the [`Report`].
///
/// # Example
/// ```no_run
/// use querypilot::prelude::*;
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// # struct Db;
/// # struct Conn;
/// # impl Connection for Conn {
/// #     type Rows = ();
/// #     async fn execute(&mut self, _: &Query) -> Result<(), ExecutionError> { Ok(()) }
/// #     async fn drain(&mut self, _: ()) -> Result<usize, ExecutionError> { Ok(0) }
/// # }
/// # impl DatabaseHandle for Db {
/// #     type Connection = Conn;
/// #     async fn acquire(&self, _: Duration) -> Result<Conn, AcquisitionError> { Ok(Conn) }
/// #     fn release(&self, _: Conn) {}
/// # }
///
/// #[tokio::main]
/// async fn main() -> Result<(), RunError> {
///     let config = RunConfig::new(1_000, 16)?;
///     let report = Workload::new(Arc::new(Db), config)
///         .active(ActiveRecord::Current)
///         .seed(7)
///         .await?;
///     println!("{report}");
///     Ok(())
/// }
/// ```
#[pin_project::pin_project]
pub struct Workload<H> {
    settings: Settings<H>,
    runner_fut: Option<Pin<Box<dyn Future<Output = Result<Report, RunError>> + Send>>>,
}

struct Settings<H> {
    handle: Arc<H>,
    config: RunConfig,
    registry: Registry,
    domain: Domain,
    active: ActiveRecord,
    progress: Arc<dyn ProgressSink>,
}

impl<H> Clone for Settings<H> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            config: self.config.clone(),
            registry: self.registry.clone(),
            domain: self.domain.clone(),
            active: self.active.clone(),
            progress: self.progress.clone(),
        }
    }
}

impl<H: DatabaseHandle> Workload<H> {
    /// Uses the employees registry, the default [`Domain`] and the sentinel active-record convention.
    pub fn new(handle: Arc<H>, config: RunConfig) -> Self {
        Self {
            settings: Settings {
                handle,
                config,
                registry: Registry::employees(),
                domain: Domain::default(),
                active: ActiveRecord::default(),
                progress: Arc::new(LogProgress),
            },
            runner_fut: None,
        }
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.settings.registry = registry;
        self
    }

    pub fn domain(mut self, domain: Domain) -> Self {
        self.settings.domain = domain;
        self
    }

    pub fn active(mut self, active: ActiveRecord) -> Self {
        self.settings.active = active;
        self
    }

    /// Makes parameter streams reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.settings.config.seed = Some(seed);
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.settings.config.acquire_timeout = timeout;
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.settings.config.query_timeout = Some(timeout);
        self
    }

    /// Replaces the default milestone logging.
    pub fn progress(mut self, sink: impl ProgressSink) -> Self {
        self.settings.progress = Arc::new(sink);
        self
    }
}

impl<H: DatabaseHandle> Future for Workload<H> {
    type Output = Result<Report, RunError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.runner_fut.is_none() {
            let settings = self.settings.clone();
            self.runner_fut = Some(Box::pin(run_workload(settings)));
        }

        if let Some(runner) = &mut self.runner_fut {
            runner.as_mut().poll(cx)
        } else {
            unreachable!()
        }
    }
}

#[instrument(name = "workload", skip_all, fields(
    total = settings.config.total_requests.get(),
    concurrency = settings.config.concurrency.get(),
))]
async fn run_workload<H: DatabaseHandle>(settings: Settings<H>) -> Result<Report, RunError> {
    let Settings {
        handle,
        config,
        registry,
        domain,
        active,
        progress,
    } = settings;
    domain.validate()?;

    info!(
        "Running {} requests over {} templates with concurrency {}",
        config.total_requests,
        registry.len(),
        config.concurrency
    );

    let executor = Executor::new(handle, registry)
        .domain(domain)
        .active(active)
        .acquire_timeout(config.acquire_timeout)
        .query_timeout(config.query_timeout);
    let dispatcher = Dispatcher::new(executor, &config).shared_progress(progress);

    let start = Instant::now();
    let outcomes = dispatcher.run().await?;
    let report = summarize(&outcomes, start.elapsed(), config.concurrency.get());

    info!("Workload complete: {report}");
    Ok(report)
}
