//! Fans a fixed number of requests out over a fixed set of workers.
use crate::database::DatabaseHandle;
use crate::executor::Executor;
use crate::sampler::worker_rng;
use querypilot_core::{DispatchError, Outcome, RunConfig, PROGRESS_STEPS};
use rand::rngs::SmallRng;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// How far along a run is, reported at each milestone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> usize {
        self.completed * 100 / self.total.max(1)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} requests complete ({}%)",
            self.completed,
            self.total,
            self.percent()
        )
    }
}

/// Receives progress milestones. Called from worker tasks, possibly out of order.
pub trait ProgressSink: Send + Sync + 'static {
    fn milestone(&self, progress: Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Send + Sync + 'static,
{
    fn milestone(&self, progress: Progress) {
        self(progress)
    }
}

/// Logs each milestone at `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn milestone(&self, progress: Progress) {
        info!("{progress}");
    }
}

/// Decides which completion counts are worth reporting.
#[derive(Clone, Copy, Debug)]
struct Milestones {
    step: usize,
}

impl Milestones {
    fn new(total: usize) -> Self {
        let step = if total < PROGRESS_STEPS {
            1
        } else {
            total.div_ceil(PROGRESS_STEPS)
        };
        Self { step }
    }

    fn reached(&self, completed: usize) -> bool {
        completed % self.step == 0
    }
}

struct Shared {
    total: usize,
    tickets: AtomicUsize,
    completed: AtomicUsize,
    outcomes: Mutex<Vec<Outcome>>,
    milestones: Milestones,
}

impl Shared {
    fn claim(&self) -> bool {
        self.tickets.fetch_add(1, Ordering::Relaxed) < self.total
    }

    fn outcomes(&self) -> std::sync::MutexGuard<'_, Vec<Outcome>> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs exactly `total_requests` requests with `concurrency` workers, no retries.
pub struct Dispatcher<H> {
    executor: Arc<Executor<H>>,
    total: usize,
    concurrency: usize,
    seed: Option<u64>,
    progress: Arc<dyn ProgressSink>,
}

impl<H: DatabaseHandle> Dispatcher<H> {
    pub fn new(executor: Executor<H>, config: &RunConfig) -> Self {
        Self {
            executor: Arc::new(executor),
            total: config.total_requests.get(),
            concurrency: config.concurrency.get(),
            seed: config.seed,
            progress: Arc::new(LogProgress),
        }
    }

    pub fn progress(self, sink: impl ProgressSink) -> Self {
        self.shared_progress(Arc::new(sink))
    }

    pub(crate) fn shared_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// Returns once every worker has finished, with one outcome per request in completion order.
    #[instrument(name = "dispatch", skip_all, fields(total = self.total, concurrency = self.concurrency))]
    pub async fn run(&self) -> Result<Vec<Outcome>, DispatchError> {
        let shared = Arc::new(Shared {
            total: self.total,
            tickets: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            outcomes: Mutex::new(Vec::with_capacity(self.total)),
            milestones: Milestones::new(self.total),
        });

        let workers: Vec<JoinHandle<()>> = (0..self.concurrency)
            .map(|worker| {
                tokio::spawn(work(
                    self.executor.clone(),
                    shared.clone(),
                    self.progress.clone(),
                    worker_rng(self.seed, worker),
                )
                .in_current_span())
            })
            .collect();
        debug!("Spawned {} workers", workers.len());

        // Join every worker before reporting a lost one so nothing keeps running behind us.
        let mut lost = None;
        for handle in workers {
            if let Err(err) = handle.await {
                error!("Worker lost: {err}");
                lost.get_or_insert(err.to_string());
            }
        }
        if let Some(reason) = lost {
            return Err(DispatchError::WorkerLost(reason));
        }

        let outcomes = std::mem::take(&mut *shared.outcomes());
        if outcomes.len() != self.total {
            return Err(DispatchError::Incomplete {
                completed: outcomes.len(),
                total: self.total,
            });
        }
        Ok(outcomes)
    }
}

async fn work<H: DatabaseHandle>(
    executor: Arc<Executor<H>>,
    shared: Arc<Shared>,
    progress: Arc<dyn ProgressSink>,
    mut rng: SmallRng,
) {
    while shared.claim() {
        let outcome = executor.execute(&mut rng).await;
        shared.outcomes().push(outcome);

        let completed = shared.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if shared.milestones.reached(completed) {
            progress.milestone(Progress {
                completed,
                total: shared.total,
            });
        }
    }
}
