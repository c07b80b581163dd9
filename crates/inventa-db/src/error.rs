//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / MigrateError          CoreError (inventa-core)           │
//! │       │                                   │                             │
//! │       ▼                                   │                             │
//! │  DbError ← categorized storage failure    │                             │
//! │       │                                   │                             │
//! │       └───────────────┬───────────────────┘                             │
//! │                       ▼                                                 │
//! │                   AppError ──► kind(): Validation | NotFound |          │
//! │                       │                Invariant  | Storage            │
//! │                       ▼                                                 │
//! │                 user_message()                                          │
//! │                                                                         │
//! │  Returning any of these from inside a transaction drops the            │
//! │  transaction, which rolls it back.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use inventa_core::{CoreError, ErrorKind, ValidationError};
use thiserror::Error;

// =============================================================================
// Database Error
// =============================================================================

/// Storage failures, classified from the SQLite result.
#[derive(Debug, Error)]
pub enum DbError {
    /// A row that the operation had just read or written is gone.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `UNIQUE constraint failed: <table>.<column>`.
    #[error("Unique constraint failed: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A schema `CHECK`, such as `stock >= 0`, rejected the write.
    #[error("Check constraint failed: {0}")]
    CheckViolation(String),

    /// `SQLITE_BUSY` / `SQLITE_LOCKED`: another writer held the lock past
    /// the busy timeout.
    #[error("Database is busy: {0}")]
    Busy(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Busy and pool errors clear up on their own; a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Busy(_) | DbError::PoolExhausted)
    }
}

/// Primary SQLite result codes for a held lock (extended codes keep the
/// primary code in the low byte).
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

fn is_lock_error(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .map(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind as SqlxKind;

        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    SqlxKind::UniqueViolation => DbError::UniqueViolation {
                        constraint: message
                            .strip_prefix("UNIQUE constraint failed: ")
                            .unwrap_or(&message)
                            .to_string(),
                    },
                    SqlxKind::ForeignKeyViolation => DbError::ForeignKeyViolation(message),
                    SqlxKind::CheckViolation => DbError::CheckViolation(message),
                    _ if is_lock_error(db_err.code().as_deref()) => DbError::Busy(message),
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Application Error
// =============================================================================

/// Error returned by catalog, ledger and report operations.
///
/// Wraps either a domain rejection or a storage failure.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl AppError {
    /// Classifies the error into the four operation-level categories.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Domain(err) => err.kind(),
            AppError::Db(DbError::NotFound { .. }) => ErrorKind::NotFound,
            AppError::Db(_) => ErrorKind::Storage,
        }
    }

    /// Message safe to show to an operator.
    ///
    /// Validation and invariant errors keep their specific reason. Storage
    /// failures are reported generically; the detail goes to the log.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Invariant | ErrorKind::NotFound => self.to_string(),
            ErrorKind::Storage => {
                "The operation could not be completed and was rolled back".to_string()
            }
        }
    }

    /// Returns the domain error, if this is one.
    pub fn as_domain(&self) -> Option<&CoreError> {
        match self {
            AppError::Domain(err) => Some(err),
            AppError::Db(_) => None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Db(err.into())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Domain(err.into())
    }
}

/// Result type for catalog, ledger and report operations.
pub type AppResult<T> = Result<T, AppError>;

// =============================================================================
// Unit Tests
// =============================================================================
