//! Randomized query parameters.
//!
//! Every worker owns its own [`SmallRng`]; a [`Sampler`] only borrows it for the duration of one
//! template build, so no generator is ever shared between concurrent requests.
use querypilot_core::{Domain, PREFIX_LEN};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A calendar year expanded to its first and last day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn year(year: i32) -> Self {
        Self {
            start: format!("{year:04}-01-01"),
            end: format!("{year:04}-12-31"),
        }
    }
}

pub struct Sampler<'a> {
    domain: &'a Domain,
    rng: &'a mut SmallRng,
}

impl<'a> Sampler<'a> {
    pub fn new(domain: &'a Domain, rng: &'a mut SmallRng) -> Self {
        Self { domain, rng }
    }

    /// An id in the dense part of the employee table.
    pub fn employee_id(&mut self) -> i64 {
        self.rng.gen_range(self.domain.employee_ids.clone())
    }

    pub fn year(&mut self) -> i32 {
        self.rng.gen_range(self.domain.years.clone())
    }

    pub fn year_range(&mut self) -> DateRange {
        DateRange::year(self.year())
    }

    /// A salary threshold for compensation reports.
    pub fn salary(&mut self) -> i64 {
        self.rng.gen_range(self.domain.salaries.clone())
    }

    pub fn month(&mut self) -> u32 {
        self.rng.gen_range(1..=12)
    }

    pub fn department(&mut self) -> &'a str {
        let domain = self.domain;
        pick(&domain.departments, self.rng)
    }

    pub fn last_name(&mut self) -> &'a str {
        let domain = self.domain;
        pick(&domain.last_names, self.rng)
    }

    pub fn title(&mut self) -> &'a str {
        let domain = self.domain;
        pick(&domain.titles, self.rng)
    }

    /// The first few letters of a last name followed by a `LIKE` wildcard.
    pub fn last_name_prefix(&mut self) -> String {
        let mut prefix: String = self.last_name().chars().take(PREFIX_LEN).collect();
        prefix.push('%');
        prefix
    }
}

fn pick<'a>(values: &'a [String], rng: &mut SmallRng) -> &'a str {
    // Empty sets are rejected by `Domain::validate` before a run starts.
    values.choose(rng).map(String::as_str).unwrap_or_default()
}

/// Generator for one worker. Seeded runs give each worker a distinct, reproducible stream.
pub(crate) fn worker_rng(seed: Option<u64>, worker: usize) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(worker as u64)),
        None => SmallRng::from_entropy(),
    }
}
