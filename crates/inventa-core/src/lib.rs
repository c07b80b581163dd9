//! # inventa-core: Pure Business Logic for Inventa
//!
//! Everything that decides *whether* a sale or a return is allowed, and *what*
//! it does to stock and money, lives here as plain functions over plain data.
//! The database crate only loads rows, calls into this crate, and writes the
//! result back inside one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Inventa Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Caller (API / CLI / UI)                      │   │
//! │  │      supplies acting user id + request payloads                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               inventa-db (transactions, SQL)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure calls                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ inventa-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │validation│ │ ledger │ │ report │  │   │
//! │  │   │ Product │ │  Money  │ │  inputs  │ │ stock  │ │ group  │  │   │
//! │  │   │  Sale   │ │         │ │          │ │ returns│ │ by day │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Sale, SaleLine, SaleReturn, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`ledger`] - Stock and return rules
//! - [`report`] - Aggregation projections for dashboards and reports
//!
//! ## Example Usage
//!
//! ```rust
//! use inventa_core::ledger::ReturnAvailability;
//!
//! // 3 sold, 2 already returned: one unit left
//! let availability = ReturnAvailability::new(3, 2);
//! assert_eq!(availability.available, 1);
//! assert!(availability.check(2).is_err());
//! assert!(availability.check(1).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default minimum stock level for new products.
///
/// Products at or below their minimum show up in the low-stock list.
pub const DEFAULT_STOCK_MINIMUM: i64 = 5;

/// Maximum line items accepted in a single sale.
pub const MAX_SALE_LINES: usize = 200;
