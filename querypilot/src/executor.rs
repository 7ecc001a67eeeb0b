use crate::database::{Connection, DatabaseHandle};
use crate::sampler::Sampler;
use crate::template::{QueryTemplate, Registry};
use futures_util::FutureExt;
use querypilot_core::{
    ActiveRecord, Domain, ExecutionError, Outcome, DEFAULT_ACQUIRE_TIMEOUT,
};
use rand::rngs::SmallRng;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

/// Runs one request end to end: lease a connection, pick and build a template, execute, drain.
///
/// Every failure, including a panic while building or running the query, comes back as an
/// [`Outcome::Failure`]. The leased connection is returned to the handle on every path.
pub struct Executor<H> {
    handle: Arc<H>,
    registry: Registry,
    domain: Domain,
    active: ActiveRecord,
    acquire_timeout: Duration,
    query_timeout: Option<Duration>,
}

impl<H: DatabaseHandle> Executor<H> {
    pub fn new(handle: Arc<H>, registry: Registry) -> Self {
        Self {
            handle,
            registry,
            domain: Domain::default(),
            active: ActiveRecord::default(),
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            query_timeout: None,
        }
    }

    pub fn domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    pub fn active(mut self, active: ActiveRecord) -> Self {
        self.active = active;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn execute(&self, rng: &mut SmallRng) -> Outcome {
        let start = Instant::now();

        let acquired = AssertUnwindSafe(self.handle.acquire(self.acquire_timeout))
            .catch_unwind()
            .await;
        let mut conn = match acquired {
            Ok(Ok(conn)) => conn,
            Ok(Err(err)) => {
                trace!("Acquisition failed: {err}");
                return record(Outcome::unknown_failure(err.to_string(), start.elapsed()));
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                warn!("Acquisition panicked: {message}");
                return record(Outcome::unknown_failure(
                    format!("unexpected error: {message}"),
                    start.elapsed(),
                ));
            }
        };

        let Some(template) = self.registry.choose(rng) else {
            self.give_back(conn, true);
            return record(Outcome::unknown_failure(
                "no query templates registered",
                start.elapsed(),
            ));
        };
        let label = template.label();

        let res = AssertUnwindSafe(self.run(&mut conn, template, rng))
            .catch_unwind()
            .await;

        let outcome = match res {
            Ok(Ok(rows)) => {
                self.give_back(conn, true);
                trace!(label, rows, "Request complete");
                Outcome::success(label, start.elapsed())
            }
            Ok(Err(err)) => {
                // A timed out statement may still be running on the server.
                self.give_back(conn, !matches!(err, ExecutionError::Timeout(_)));
                trace!(label, "Request failed: {err}");
                Outcome::failure(label, err.to_string(), start.elapsed())
            }
            Err(panic) => {
                self.give_back(conn, false);
                let message = panic_message(&*panic);
                warn!(label, "Request panicked: {message}");
                Outcome::failure(
                    label,
                    format!("unexpected error: {message}"),
                    start.elapsed(),
                )
            }
        };

        record(outcome)
    }

    /// Releases (or discards) the connection. A panicking handle only costs the connection.
    fn give_back(&self, conn: H::Connection, reusable: bool) {
        let res = panic::catch_unwind(AssertUnwindSafe(|| {
            if reusable {
                self.handle.release(conn)
            } else {
                self.handle.discard(conn)
            }
        }));
        if let Err(panic) = res {
            warn!("Returning a connection panicked: {}", panic_message(&*panic));
        }
    }

    async fn run(
        &self,
        conn: &mut H::Connection,
        template: &QueryTemplate,
        rng: &mut SmallRng,
    ) -> Result<usize, ExecutionError> {
        let query = {
            let mut sampler = Sampler::new(&self.domain, rng);
            template.build(&mut sampler, &self.active)
        };
        trace!(label = template.label(), %query, "Executing");

        let work = async {
            let rows = conn.execute(&query).await?;
            conn.drain(rows).await
        };

        match self.query_timeout {
            Some(limit) => timeout(limit, work)
                .await
                .unwrap_or(Err(ExecutionError::Timeout(limit))),
            None => work.await,
        }
    }
}

fn record(outcome: Outcome) -> Outcome {
    #[cfg(feature = "metrics")]
    {
        let template = outcome.label();
        metrics::histogram!("querypilot.request.latency", "template" => template)
            .record(outcome.elapsed().as_secs_f64());
        if outcome.is_success() {
            metrics::counter!("querypilot.request.success", "template" => template).increment(1);
        } else {
            metrics::counter!("querypilot.request.error", "template" => template).increment(1);
        }
    }
    outcome
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "panic"
    }
}
