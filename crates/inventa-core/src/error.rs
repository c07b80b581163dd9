//! # Error Types
//!
//! Domain-specific error types for inventa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  inventa-core errors (this file)                                       │
//! │  ├── CoreError        - Domain errors (not found, invariants)          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  inventa-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── AppError         - CoreError | DbError, with ErrorKind            │
//! │                                                                         │
//! │  Every error rolls back the enclosing transaction.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Classification
//! | Kind       | Examples                                        |
//! |------------|-------------------------------------------------|
//! | Validation | missing field, empty sale, bad quantity         |
//! | NotFound   | sale / product / return id unknown              |
//! | Invariant  | insufficient stock, return exceeds availability |

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse error category, stable across crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// A referenced record does not exist.
    NotFound,
    /// The request is well-formed but would break a business rule.
    Invariant,
    /// Storage or transaction failure.
    Storage,
}

// =============================================================================
// Core Error
// =============================================================================

/// Failures raised by the ledger rules and lookups.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Category cannot be found.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Supplier cannot be found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Return cannot be found.
    #[error("Return not found: {0}")]
    ReturnNotFound(String),

    /// A sale was submitted with no line items.
    #[error("A sale must include at least one product")]
    EmptySale,

    /// Product exists but is deactivated.
    #[error("Product {product} is not active")]
    ProductInactive { product: String },

    /// Insufficient stock to complete a sale.
    ///
    /// `requested` is the total asked for this product across the whole
    /// sale, not just the failing line.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line: Widget × 5
    ///      │
    ///      ▼
    /// Check stock: available = 3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Widget", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A stock change would leave a product below zero.
    #[error("Stock for {product} cannot go below zero: current {current}, change {delta}")]
    NegativeStock {
        product: String,
        current: i64,
        delta: i64,
    },

    /// The product being returned was never sold on that sale.
    #[error("Product {product_id} is not part of sale {sale_id}")]
    ProductNotInSale { sale_id: String, product_id: String },

    /// Every sold unit of the product already has a return recorded.
    #[error("All {sold} units of this product have already been returned")]
    NothingLeftToReturn { sold: i64 },

    /// Return quantity exceeds what is still available to return.
    #[error(
        "Cannot return {requested} units: available {available}, already returned {already_returned}, sold {sold}"
    )]
    ReturnQuantityExceeded {
        requested: i64,
        available: i64,
        already_returned: i64,
        sold: i64,
    },

    /// Processing was attempted on a return that is not pending.
    #[error("Only pending returns can be processed (return is {status})")]
    ReturnNotPending { status: String },

    /// A processed return has already moved stock; it can be neither
    /// deleted nor moved to another status.
    #[error("Return {0} has been processed and can no longer be changed")]
    ProcessedReturnLocked(String),

    /// Sale deletion refused because returns reference the sale.
    #[error("Sale {sale_id} has {returns} recorded return(s) and cannot be deleted")]
    SaleHasReturns { sale_id: String, returns: i64 },

    /// The sale behind a return was deleted. Deleting it already put every
    /// sold unit back in stock, so the return cannot restock again.
    #[error("Return {return_id} cannot be processed: sale {sale_id} was deleted and its stock already restored")]
    ReturnSaleDeleted { return_id: String, sale_id: String },

    /// An amount or quantity sum overflowed.
    #[error("Amount out of range")]
    AmountOverflow,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::CategoryNotFound(_)
            | CoreError::SupplierNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::ReturnNotFound(_) => ErrorKind::NotFound,

            CoreError::EmptySale | CoreError::Validation(_) => ErrorKind::Validation,

            CoreError::ProductInactive { .. }
            | CoreError::InsufficientStock { .. }
            | CoreError::NegativeStock { .. }
            | CoreError::ProductNotInSale { .. }
            | CoreError::NothingLeftToReturn { .. }
            | CoreError::ReturnQuantityExceeded { .. }
            | CoreError::ReturnNotPending { .. }
            | CoreError::ProcessedReturnLocked(_)
            | CoreError::SaleHasReturns { .. }
            | CoreError::ReturnSaleDeleted { .. }
            | CoreError::AmountOverflow => ErrorKind::Invariant,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Rejected input, reported before anything touches storage.
///
/// `field` is the caller-facing name (`quantity`, `sale_id`, ...).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing, blank, or zero where a value is needed.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Prices and stock levels.
    #[error("{field} cannot be negative")]
    MustNotBeNegative { field: String },

    /// Unparseable ids, dates, emails and enum strings.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Unique name already taken.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Result of a pure domain check.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
