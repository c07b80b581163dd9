//! # inventa-db: Database Layer for Inventa
//!
//! SQLite storage for the catalog, the transactional sale/return ledger and
//! the aggregation queries behind the dashboard and reports.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Inventa Data Flow                              │
//! │                                                                         │
//! │  Caller (CLI, API handler, tests)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    inventa-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │   Database    │   │    Ledger     │   │    Reports    │    │   │
//! │  │   │   (pool.rs)   │   │  (ledger/)    │   │ (reports.rs)  │    │   │
//! │  │   │               │   │               │   │               │    │   │
//! │  │   │ SqlitePool    │◄──│ sales         │   │ dashboard     │    │   │
//! │  │   │ Migrations    │   │ returns       │   │ statistics    │    │   │
//! │  │   │ Repositories  │   │ totals        │   │ charts        │    │   │
//! │  │   └───────────────┘   └───────────────┘   └───────────────┘    │   │
//! │  │           │                   │                   │             │   │
//! │  │           └───────── rules from inventa-core ─────┘             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/inventa.db  (or :memory: in tests)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and application error types
//! - [`repository`] - Catalog and record repositories
//! - [`ledger`] - Sale and return operations, one transaction each
//! - [`reports`] - Read-only aggregation
//! - [`config`] - TOML configuration with environment overrides
//! - [`logging`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inventa_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/inventa.db")).await?;
//!
//! let detail = db.ledger().create_sale(new_sale).await?;
//! let today = db.reports().dashboard(Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod migrations;
pub mod pool;
pub mod reports;
pub mod repository;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{AppError, AppResult, DbError, DbResult};
pub use ledger::{Ledger, RecalculationFailure, RecalculationReport};
pub use pool::{Database, DbConfig};
pub use reports::{ReportSettings, Reports};

// Repository re-exports for convenience
pub use repository::{
    CategoryRepository, ProductRepository, ReturnRepository, SaleRepository, SupplierRepository,
};
