//! MySQL backend over `sqlx`.
use crate::database::{Connection, Connector};
use querypilot_core::{ConnectError, ExecutionError, Param, Query};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Connection as _, Row};
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

/// Opens plain MySQL connections; wrap it in a [`ConnectionPool`](crate::ConnectionPool).
#[derive(Clone, Debug)]
pub struct MySqlConnector {
    options: MySqlConnectOptions,
}

impl MySqlConnector {
    pub fn new(options: MySqlConnectOptions) -> Self {
        Self { options }
    }

    pub fn from_parts(
        host: &str,
        port: u16,
        user: &str,
        password: Option<&str>,
        database: &str,
    ) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(user)
            .database(database)
            .charset("utf8mb4");
        if let Some(password) = password {
            options = options.password(password);
        }
        Self::new(options)
    }
}

impl Connector for MySqlConnector {
    type Connection = MySqlSession;

    async fn connect(&self) -> Result<MySqlSession, ConnectError> {
        let conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(|err| ConnectError(err.to_string()))?;
        Ok(MySqlSession { conn, broken: false })
    }
}

/// One server connection. Marked broken after transport or protocol failures.
pub struct MySqlSession {
    conn: MySqlConnection,
    broken: bool,
}

impl MySqlSession {
    fn fail(&mut self, err: sqlx::Error) -> ExecutionError {
        if matches!(
            err,
            sqlx::Error::Io(_) | sqlx::Error::Protocol(_) | sqlx::Error::Tls(_)
        ) {
            debug!("Connection broken: {err}");
            self.broken = true;
        }
        ExecutionError::Database(err.to_string())
    }
}

impl Connection for MySqlSession {
    type Rows = Vec<MySqlRow>;

    async fn execute(&mut self, query: &Query) -> Result<Vec<MySqlRow>, ExecutionError> {
        let mut statement = sqlx::query(&query.sql);
        for param in &query.params {
            statement = match param {
                Param::Int(value) => statement.bind(*value),
                Param::Text(value) => statement.bind(value.as_str()),
            };
        }
        match statement.fetch_all(&mut self.conn).await {
            Ok(rows) => Ok(rows),
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn drain(&mut self, rows: Vec<MySqlRow>) -> Result<usize, ExecutionError> {
        for row in &rows {
            for column in 0..row.len() {
                if let Err(err) = row.try_get_raw(column) {
                    return Err(self.fail(err));
                }
            }
        }
        Ok(rows.len())
    }

    fn is_healthy(&self) -> bool {
        !self.broken
    }
}
