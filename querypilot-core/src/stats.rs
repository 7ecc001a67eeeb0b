use serde::Serialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::fmt;
use std::time::Duration;

/// One row of a histogram: a label or error message and how often it was seen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistogramEntry {
    pub key: String,
    pub count: usize,
}

/// Summary of a finished run.
///
/// `average_latency_ms` is the run duration divided evenly over all requests. It is a coarse
/// run-level approximation; the per-request distribution is in the `latency_p*` quantiles.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub total_requests: usize,
    pub concurrency: usize,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub duration: Duration,
    pub throughput: f64,
    pub average_latency_ms: f64,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p50: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p90: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p99: Duration,
    pub success_count: usize,
    pub failure_count: usize,
    /// Successful requests per template label, most frequent first.
    pub label_histogram: Vec<HistogramEntry>,
    /// The most frequent failure messages, most frequent first.
    pub error_histogram: Vec<HistogramEntry>,
}

impl Report {
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.
        } else {
            self.failure_count as f64 / self.total_requests as f64
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QPS={:.2}, ok={}, failed={}, elapsed={}, p50={:?}, p90={:?}, p99={:?}",
            self.throughput,
            self.success_count,
            self.failure_count,
            humantime::format_duration(self.duration),
            self.latency_p50,
            self.latency_p90,
            self.latency_p99,
        )
    }
}
