//! Turns the outcomes of a finished run into a [`Report`].
use pdatastructs::tdigest::{TDigest, K1};
use querypilot_core::{HistogramEntry, Outcome, Report, MAX_ERROR_ENTRIES};
use std::collections::HashMap;
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Summarizes a run. Pure: identical input always yields an identical report.
///
/// A zero `elapsed` is treated as one nanosecond so throughput stays finite.
pub fn summarize(outcomes: &[Outcome], elapsed: Duration, concurrency: usize) -> Report {
    let total = outcomes.len();
    let duration = elapsed.max(Duration::from_nanos(1));
    let secs = duration.as_secs_f64();

    let success_count = outcomes.iter().filter(|o| o.is_success()).count();
    let latency = Latency::new(outcomes);

    Report {
        total_requests: total,
        concurrency,
        duration,
        throughput: total as f64 / secs,
        average_latency_ms: if total == 0 {
            0.
        } else {
            secs * 1000. / total as f64
        },
        latency_p50: latency.quantile(0.5),
        latency_p90: latency.quantile(0.9),
        latency_p99: latency.quantile(0.99),
        success_count,
        failure_count: total - success_count,
        label_histogram: histogram(
            outcomes
                .iter()
                .filter(|o| o.is_success())
                .map(Outcome::label),
        ),
        error_histogram: histogram(outcomes.iter().filter_map(Outcome::message))
            .into_iter()
            .take(MAX_ERROR_ENTRIES)
            .collect(),
    }
}

/// Counts keys, most frequent first. Equal counts keep first-seen order.
fn histogram<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<HistogramEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<HistogramEntry> = vec![];
    for key in keys {
        match index.get(key) {
            Some(&i) => entries[i].count += 1,
            None => {
                index.insert(key, entries.len());
                entries.push(HistogramEntry {
                    key: key.to_string(),
                    count: 1,
                });
            }
        }
    }
    // Stable, so ties stay in first-seen order.
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

struct Latency {
    digest: Option<TDigest<K1>>,
}

impl Latency {
    fn new(outcomes: &[Outcome]) -> Self {
        if outcomes.is_empty() {
            return Self { digest: None };
        }
        let mut digest = TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE);
        for outcome in outcomes {
            digest.insert(outcome.elapsed().as_secs_f64());
        }
        Self {
            digest: Some(digest),
        }
    }

    fn quantile(&self, q: f64) -> Duration {
        let Some(digest) = &self.digest else {
            return Duration::ZERO;
        };
        let secs = digest.quantile(q);

        // TDigest can yield NaN for degenerate inputs.
        let secs = if secs.is_finite() && secs >= 0. {
            secs
        } else {
            error!("Non-finite latency quantile {q}: {secs}");
            0.
        };
        Duration::from_secs_f64(secs)
    }
}
