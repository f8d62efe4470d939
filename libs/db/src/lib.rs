#![cfg_attr(
    not(any(feature = "pg", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code, unreachable_code)
)]

//! Database handle for the user directory service.
//!
//! Builds one bounded sqlx pool per process (SQLite or PostgreSQL, chosen by
//! DSN scheme) and exposes it both as a raw sqlx pool and as a SeaORM
//! `DatabaseConnection` sharing the same connections.
//!
//! # Example
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> userdir_db::Result<()> {
//!     use userdir_db::{ConnectOpts, DbHandle};
//!
//!     let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//!     let conn = db.sea(); // hand this to repositories
//!     # let _ = conn;
//!     db.close().await;
//!     Ok(())
//! }
//! ```

mod pool_opts;
pub mod sqlite;

use std::time::Duration;

use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::pool_opts::ApplyPoolOpts;

#[cfg(feature = "pg")]
use sea_orm::SqlxPostgresConnector;
#[cfg(feature = "sqlite")]
use sea_orm::SqlxSqliteConnector;
#[cfg(feature = "pg")]
use sqlx::{postgres::PgPoolOptions, PgPool};
#[cfg(feature = "sqlite")]
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and helpers.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Connection options.
/// Each driver applies the subset of pool knobs it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool. Callers beyond this wait.
    pub max_conns: Option<u32>,
    /// Minimum number of connections kept open.
    pub min_conns: Option<u32>,
    /// How long a caller waits for a free connection before failing.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime for a connection.
    pub max_lifetime: Option<Duration>,
    /// Test connection health before acquire.
    pub test_before_acquire: bool,
    /// SQLite busy timeout.
    pub sqlite_busy_timeout: Option<Duration>,
    /// For SQLite file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            test_before_acquire: false,
            sqlite_busy_timeout: Some(Duration::from_millis(5000)),
            create_sqlite_dirs: true,
        }
    }
}

/// One concrete sqlx pool.
#[derive(Clone, Debug)]
pub enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Main handle. Construct once at startup and pass the SeaORM connection
/// (a cheap clone over the same pool) to whoever needs it.
#[derive(Debug)]
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    dsn: String,
    sea: DatabaseConnection,
}

impl DbHandle {
    /// Detect engine by DSN scheme.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(redact_credentials_in_dsn(dsn)))
        }
    }

    /// Connect and build handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        match engine {
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let pool = PgPoolOptions::new().apply(&opts).connect(dsn).await?;
                let sea = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
                tracing::debug!(dsn = %redact_credentials_in_dsn(dsn), "postgres pool ready");
                Ok(Self {
                    engine,
                    pool: DbPool::Postgres(pool),
                    dsn: dsn.to_string(),
                    sea,
                })
            }
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => {
                let in_memory = sqlite::is_memory_dsn(dsn);
                let mut conn_opts = if in_memory {
                    "sqlite::memory:".parse::<SqliteConnectOptions>()?
                } else {
                    if opts.create_sqlite_dirs {
                        sqlite::ensure_parent_dir(dsn)?;
                    }
                    dsn.parse::<SqliteConnectOptions>()?.create_if_missing(true)
                };
                if let Some(t) = opts.sqlite_busy_timeout {
                    conn_opts = conn_opts.busy_timeout(t);
                }

                let mut pool_opts = SqlitePoolOptions::new().apply(&opts);
                if in_memory {
                    // Every connection to :memory: is its own database; pin one forever.
                    pool_opts = pool_opts
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                }
                let pool = pool_opts.connect_with(conn_opts).await?;
                let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());
                tracing::debug!(dsn, in_memory, "sqlite pool ready");
                Ok(Self {
                    engine,
                    pool: DbPool::Sqlite(pool),
                    dsn: dsn.to_string(),
                    sea,
                })
            }
            #[allow(unreachable_patterns)]
            DbEngine::Postgres => Err(DbError::FeatureDisabled("PostgreSQL feature not enabled")),
            #[allow(unreachable_patterns)]
            DbEngine::Sqlite => Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        }
    }

    /// Get the backend.
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// DSN with any password masked; safe for logs.
    pub fn dsn(&self) -> String {
        redact_credentials_in_dsn(&self.dsn)
    }

    /// SeaORM connection over the shared pool.
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlx_sqlite(&self) -> Option<&SqlitePool> {
        match &self.pool {
            DbPool::Sqlite(p) => Some(p),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[cfg(feature = "pg")]
    pub fn sqlx_postgres(&self) -> Option<&PgPool> {
        match &self.pool {
            DbPool::Postgres(p) => Some(p),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// Close the underlying pool.
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
    }
}

/// Replace the password component of a DSN with `***`.
/// Strings that do not parse as URLs are returned unchanged.
pub fn redact_credentials_in_dsn(dsn: &str) -> String {
    match url::Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => dsn.to_string(),
    }
}
