use clap::{Parser, ValueEnum};
use querypilot::mysql::MySqlConnector;
use querypilot::{
    ActiveRecord, ConfigError, Domain, RunConfig, DEFAULT_ACTIVE_DATE, DEFAULT_MAX_EMPLOYEE_ID,
    DEFAULT_MIN_EMPLOYEE_ID,
};
use std::num::NonZeroUsize;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Replays a synthetic HR read workload against a MySQL "employees" database.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Number of requests to dispatch
    pub total_requests: NonZeroUsize,

    /// Number of concurrent workers
    pub concurrency: NonZeroUsize,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 3306)]
    pub port: u16,

    #[arg(short, long, default_value = "root")]
    pub user: String,

    #[arg(long, env = "QUERYPILOT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(short, long, default_value = "employees")]
    pub database: String,

    /// Maximum open connections [default: concurrency]
    #[arg(long)]
    pub pool_size: Option<NonZeroUsize>,

    /// Longest a request waits for a connection
    #[arg(long, value_parser = humantime::parse_duration, default_value = "5s")]
    pub acquire_timeout: Duration,

    /// Per-query deadline; unbounded when omitted
    #[arg(long, value_parser = humantime::parse_duration)]
    pub query_timeout: Option<Duration>,

    /// Seed for reproducible parameter streams
    #[arg(long)]
    pub seed: Option<u64>,

    /// End date marking currently valid rows
    #[arg(long, default_value = DEFAULT_ACTIVE_DATE, conflicts_with = "active_live")]
    pub active_date: String,

    /// Treat rows ending after the server's current date as valid
    #[arg(long)]
    pub active_live: bool,

    #[arg(long, default_value_t = DEFAULT_MIN_EMPLOYEE_ID, allow_negative_numbers = true)]
    pub min_id: i64,

    #[arg(long, default_value_t = DEFAULT_MAX_EMPLOYEE_ID, allow_negative_numbers = true)]
    pub max_id: i64,

    /// Runtime worker threads [default: one per core]
    #[arg(long)]
    pub threads: Option<NonZeroUsize>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

impl Cli {
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let mut config = RunConfig::new(self.total_requests.get(), self.concurrency.get())?
            .with_acquire_timeout(self.acquire_timeout);
        if let Some(timeout) = self.query_timeout {
            config = config.with_query_timeout(timeout);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }

    pub fn domain(&self) -> Result<Domain, ConfigError> {
        Domain::default().with_employee_ids(self.min_id..=self.max_id)
    }

    pub fn active(&self) -> ActiveRecord {
        if self.active_live {
            ActiveRecord::Current
        } else {
            ActiveRecord::Sentinel(self.active_date.clone())
        }
    }

    pub fn pool_size(&self) -> NonZeroUsize {
        self.pool_size.unwrap_or(self.concurrency)
    }

    pub fn connector(&self) -> MySqlConnector {
        MySqlConnector::from_parts(
            &self.host,
            self.port,
            &self.user,
            self.password.as_deref(),
            &self.database,
        )
    }
}
