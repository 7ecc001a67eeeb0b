use crate::{ActiveRecord, UNKNOWN_LABEL};
use std::fmt;
use std::time::Duration;

/// A bound query parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Param {
    Int(i64),
    Text(String),
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
        }
    }
}

/// A statement with positional `?` placeholders and the values bound to them, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: vec![],
        }
    }

    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Binds the value for one [`ActiveRecord::predicate`] placeholder, if the convention needs one.
    pub fn bind_active(mut self, active: &ActiveRecord) -> Self {
        if let Some(param) = active.param() {
            self.params.push(param);
        }
        self
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql.split_whitespace().collect::<Vec<_>>().join(" "))?;
        if !self.params.is_empty() {
            let params: Vec<_> = self.params.iter().map(Param::to_string).collect();
            write!(f, " [{}]", params.join(", "))?;
        }
        Ok(())
    }
}

/// The result of one dispatched request.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Success {
        label: &'static str,
        elapsed: Duration,
    },
    Failure {
        label: &'static str,
        message: String,
        elapsed: Duration,
    },
}

impl Outcome {
    pub fn success(label: &'static str, elapsed: Duration) -> Self {
        Self::Success { label, elapsed }
    }

    pub fn failure(label: &'static str, message: impl Into<String>, elapsed: Duration) -> Self {
        Self::Failure {
            label,
            message: message.into(),
            elapsed,
        }
    }

    /// Failure that happened before any template was picked.
    pub fn unknown_failure(message: impl Into<String>, elapsed: Duration) -> Self {
        Self::failure(UNKNOWN_LABEL, message, elapsed)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { label, .. } | Self::Failure { label, .. } => label,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message, .. } => Some(message),
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Success { elapsed, .. } | Self::Failure { elapsed, .. } => *elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_active_follows_convention() {
        let sentinel = Query::new("SELECT 1 WHERE a = ? AND to_date = ?")
            .bind(7_i64)
            .bind_active(&ActiveRecord::default());
        assert_eq!(sentinel.params.len(), 2);

        let live = Query::new("SELECT 1 WHERE a = ? AND to_date > CURRENT_DATE")
            .bind(7_i64)
            .bind_active(&ActiveRecord::Current);
        assert_eq!(live.params, vec![Param::Int(7)]);
    }

    #[test]
    fn display_collapses_whitespace() {
        let query = Query::new(
            "SELECT emp_no
             FROM employees
             WHERE last_name = ?",
        )
        .bind("Smith");
        assert_eq!(
            query.to_string(),
            "SELECT emp_no FROM employees WHERE last_name = ? ['Smith']"
        );
    }

    #[test]
    fn outcome_accessors() {
        let ok = Outcome::success("Sys: Heartbeat", Duration::from_millis(2));
        assert!(ok.is_success());
        assert_eq!(ok.message(), None);

        let failed = Outcome::unknown_failure("pool timed out", Duration::from_secs(5));
        assert!(!failed.is_success());
        assert_eq!(failed.label(), UNKNOWN_LABEL);
        assert_eq!(failed.message(), Some("pool timed out"));
        assert_eq!(failed.elapsed(), Duration::from_secs(5));
    }
}
