//! Query templates and the registry requests pick from.
use crate::sampler::Sampler;
use querypilot_core::{ActiveRecord, Query};
use rand::rngs::SmallRng;
use rand::Rng;
use std::fmt;

mod employees;

type BuildFn = fn(&mut Sampler<'_>, &ActiveRecord) -> Query;

/// One simulated user action: a label plus a function producing a freshly parameterized query.
#[derive(Clone, Copy)]
pub struct QueryTemplate {
    label: &'static str,
    build: BuildFn,
}

impl QueryTemplate {
    pub const fn new(label: &'static str, build: BuildFn) -> Self {
        Self { label, build }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn build(&self, sampler: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
        (self.build)(sampler, active)
    }
}

impl fmt::Debug for QueryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryTemplate")
            .field("label", &self.label)
            .finish()
    }
}

/// Fixed, ordered set of templates. Read-only for the duration of a run.
#[derive(Clone, Debug)]
pub struct Registry {
    templates: Vec<QueryTemplate>,
}

impl Registry {
    /// Listing a template more than once weights its selection accordingly.
    pub fn new(templates: Vec<QueryTemplate>) -> Self {
        Self { templates }
    }

    /// The HR workload against the MySQL "employees" sample schema.
    pub fn employees() -> Self {
        Self::new(employees::TEMPLATES.to_vec())
    }

    /// Uniform pick, independent per call.
    pub fn choose(&self, rng: &mut SmallRng) -> Option<&QueryTemplate> {
        if self.templates.is_empty() {
            None
        } else {
            self.templates.get(rng.gen_range(0..self.templates.len()))
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.templates.iter().map(QueryTemplate::label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels().any(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::employees()
    }
}
