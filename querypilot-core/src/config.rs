use crate::{
    ConfigError, Param, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_ACTIVE_DATE, DEFAULT_FIRST_YEAR,
    DEFAULT_LAST_YEAR, DEFAULT_MAX_EMPLOYEE_ID, DEFAULT_MAX_SALARY, DEFAULT_MIN_EMPLOYEE_ID,
    DEFAULT_MIN_SALARY, DEPARTMENTS, LAST_NAMES, TITLES,
};
use std::num::NonZeroUsize;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Settings for a single run, supplied once at start.
///
/// A concurrency larger than `total_requests` is legal; the extra workers simply find no work.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub total_requests: NonZeroUsize,
    pub concurrency: NonZeroUsize,
    pub acquire_timeout: Duration,
    pub query_timeout: Option<Duration>,
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn new(total_requests: usize, concurrency: usize) -> Result<Self, ConfigError> {
        let total_requests =
            NonZeroUsize::new(total_requests).ok_or(ConfigError::ZeroRequests)?;
        let concurrency = NonZeroUsize::new(concurrency).ok_or(ConfigError::ZeroConcurrency)?;
        Ok(Self {
            total_requests,
            concurrency,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            query_timeout: None,
            seed: None,
        })
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// How the schema marks a row as currently valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActiveRecord {
    /// Valid rows carry a far-future sentinel in their end-date column.
    Sentinel(String),
    /// Valid rows have an end date later than the server's current date.
    Current,
}

impl Default for ActiveRecord {
    fn default() -> Self {
        Self::Sentinel(DEFAULT_ACTIVE_DATE.to_string())
    }
}

impl ActiveRecord {
    /// SQL predicate selecting active rows through `column`.
    pub fn predicate(&self, column: &str) -> String {
        match self {
            Self::Sentinel(_) => format!("{column} = ?"),
            Self::Current => format!("{column} > CURRENT_DATE"),
        }
    }

    /// Parameter to bind for one [`predicate`](Self::predicate), if it has a placeholder.
    pub fn param(&self) -> Option<Param> {
        match self {
            Self::Sentinel(date) => Some(Param::Text(date.clone())),
            Self::Current => None,
        }
    }
}

/// Value ranges the parameter sampler draws from.
///
/// These are fixed up front and never derived from the live database.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    pub employee_ids: RangeInclusive<i64>,
    pub years: RangeInclusive<i32>,
    pub salaries: RangeInclusive<i64>,
    pub departments: Vec<String>,
    pub last_names: Vec<String>,
    pub titles: Vec<String>,
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            employee_ids: DEFAULT_MIN_EMPLOYEE_ID..=DEFAULT_MAX_EMPLOYEE_ID,
            years: DEFAULT_FIRST_YEAR..=DEFAULT_LAST_YEAR,
            salaries: DEFAULT_MIN_SALARY..=DEFAULT_MAX_SALARY,
            departments: owned(DEPARTMENTS),
            last_names: owned(LAST_NAMES),
            titles: owned(TITLES),
        }
    }
}

impl Domain {
    pub fn with_employee_ids(mut self, ids: RangeInclusive<i64>) -> Result<Self, ConfigError> {
        if ids.is_empty() {
            return Err(ConfigError::EmptyIdRange(*ids.start(), *ids.end()));
        }
        self.employee_ids = ids;
        Ok(self)
    }

    pub fn with_years(mut self, years: RangeInclusive<i32>) -> Result<Self, ConfigError> {
        if years.is_empty() {
            return Err(ConfigError::EmptyYearWindow(*years.start(), *years.end()));
        }
        self.years = years;
        Ok(self)
    }

    /// Checks that every categorical set has at least one value to pick.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.employee_ids.is_empty() {
            return Err(ConfigError::EmptyIdRange(
                *self.employee_ids.start(),
                *self.employee_ids.end(),
            ));
        }
        if self.years.is_empty() {
            return Err(ConfigError::EmptyYearWindow(
                *self.years.start(),
                *self.years.end(),
            ));
        }
        if self.salaries.is_empty() {
            return Err(ConfigError::EmptyCategory("salaries"));
        }
        for (name, values) in [
            ("departments", &self.departments),
            ("last_names", &self.last_names),
            ("titles", &self.titles),
        ] {
            if values.is_empty() {
                return Err(ConfigError::EmptyCategory(name));
            }
        }
        Ok(())
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
