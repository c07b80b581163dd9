//! # Domain Types
//!
//! Records and request payloads used throughout Inventa.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                  Ledger                                        │
//! │  ───────                  ──────                                        │
//! │  ┌──────────┐             ┌──────────┐  1..N  ┌────────────┐           │
//! │  │ Category │◄──┐         │   Sale   │───────►│  SaleLine  │           │
//! │  └──────────┘   │         └────┬─────┘        └─────┬──────┘           │
//! │  ┌──────────┐   │              │ 0..N               │ product_id        │
//! │  │ Supplier │◄──┤              ▼                    ▼                   │
//! │  └──────────┘   │         ┌────────────┐      ┌──────────┐             │
//! │                 └─────────│  Product   │◄─────│SaleReturn│             │
//! │                           └────────────┘      └──────────┘             │
//! │                                                                         │
//! │  A SaleReturn matches its SaleLine(s) through (sale_id, product_id).   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All ids are UUID v4 strings. All amounts are `i64` cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

/// Generates a new record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    /// User who created the record.
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Partial update for a category. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

// =============================================================================
// Supplier
// =============================================================================

/// A product supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    /// Contact person.
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a supplier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Partial update for a supplier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,

    /// What the store pays per unit, in cents.
    pub purchase_price_cents: i64,

    /// Default selling price per unit, in cents.
    pub sale_price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Low-stock threshold.
    pub stock_minimum: i64,

    pub category_id: String,
    pub supplier_id: Option<String>,

    /// Inactive products cannot be sold (soft delete).
    pub active: bool,

    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// True when stock is at or below the configured minimum.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.stock_minimum
    }

    /// Compact view used in sale and return read models.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            sale_price_cents: self.sale_price_cents,
        }
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    /// Defaults to [`crate::DEFAULT_STOCK_MINIMUM`].
    #[serde(default)]
    pub stock_minimum: Option<i64>,
    pub category_id: String,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Partial update for a product (catalog edit).
///
/// Setting `stock` here is a direct stock edit; it bypasses the ledger but
/// is still subject to the non-negative rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub purchase_price_cents: Option<i64>,
    #[serde(default)]
    pub sale_price_cents: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub stock_minimum: Option<i64>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    /// Detach the current supplier. Ignored when `supplier_id` is set.
    #[serde(default)]
    pub clear_supplier: bool,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Product fields shown next to sale lines and returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub sale_price_cents: i64,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Recorded but not yet settled.
    Pending,
    /// Settled. Only completed sales count as revenue.
    Completed,
    /// Cancelled after the fact.
    Cancelled,
}

impl SaleStatus {
    /// Every status, in display order.
    pub const ALL: [SaleStatus; 3] = [
        SaleStatus::Pending,
        SaleStatus::Completed,
        SaleStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SaleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: SaleStatus::ALL.iter().map(|s| s.to_string()).collect(),
            })
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    /// Split across several methods.
    Mixed,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
        PaymentMethod::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Mixed => "mixed",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
///
/// `discount_cents` and `tax_cents` are stored for reference only; the
/// authoritative rule is `total == subtotal == Σ line.subtotal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,

    /// Acting user who recorded the sale.
    pub user_id: String,

    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    pub fn summary(&self) -> SaleSummary {
        SaleSummary {
            id: self.id.clone(),
            sold_at: self.sold_at,
            total_cents: self.total_cents,
            status: self.status,
        }
    }
}

/// A line item of a sale. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Zero-based order within the sale.
    pub position: i64,
    pub quantity: i64,
    /// Price captured at sale time.
    pub unit_price_cents: i64,
    /// `quantity × unit_price_cents`.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Sale fields shown next to returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleSummary {
    pub id: String,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
    pub total_cents: i64,
    pub status: SaleStatus,
}

/// A sale line joined with its product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineDetail {
    pub line: SaleLine,
    pub product: ProductSummary,
}

/// A sale with its lines, as returned by sale creation and lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub lines: Vec<SaleLineDetail>,
}

/// One requested line of a new sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
    /// Overrides the product's current sale price when set (zero included).
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

impl NewSaleLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        NewSaleLine {
            product_id: product_id.into(),
            quantity,
            unit_price_cents: None,
        }
    }

    pub fn with_price(mut self, unit_price_cents: i64) -> Self {
        self.unit_price_cents = Some(unit_price_cents);
        self
    }
}

/// Input for creating a sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    /// Acting user, supplied by the access gate.
    pub user_id: String,
    pub lines: Vec<NewSaleLine>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewSale {
    pub fn new(user_id: impl Into<String>, lines: Vec<NewSaleLine>) -> Self {
        NewSale {
            user_id: user_id.into(),
            lines,
            ..Default::default()
        }
    }
}

// =============================================================================
// Returns
// =============================================================================

/// Why an item came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    Defective,
    /// Customer did not ask for it.
    Unsolicited,
    Exchange,
    Other,
}

impl ReturnReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnReason::Defective => "defective",
            ReturnReason::Unsolicited => "unsolicited",
            ReturnReason::Exchange => "exchange",
            ReturnReason::Other => "other",
        }
    }
}

impl fmt::Display for ReturnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a return.
///
/// ```text
/// pending ──process──► processed   (stock restored, terminal)
///    │
///    └──status update──► approved / rejected / pending
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
    Processed,
}

impl ReturnStatus {
    pub const ALL: [ReturnStatus; 4] = [
        ReturnStatus::Pending,
        ReturnStatus::Approved,
        ReturnStatus::Rejected,
        ReturnStatus::Processed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "pending",
            ReturnStatus::Approved => "approved",
            ReturnStatus::Rejected => "rejected",
            ReturnStatus::Processed => "processed",
        }
    }
}

impl Default for ReturnStatus {
    fn default() -> Self {
        ReturnStatus::Pending
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReturnStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ReturnStatus::ALL.iter().map(|s| s.to_string()).collect(),
            })
    }
}

/// A product return against a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleReturn {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub reason: ReturnReason,
    pub description: Option<String>,
    pub return_amount_cents: i64,
    pub status: ReturnStatus,
    pub user_id: String,
    #[ts(as = "String")]
    pub returned_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A return joined with its sale and product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnDetail {
    pub sale_return: SaleReturn,
    /// `None` once the sale itself has been deleted.
    pub sale: Option<SaleSummary>,
    pub product: ProductSummary,
}

/// Raw return request as it arrives from a form or API.
///
/// Every field is optional here so that missing input is reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sale_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub reason: Option<ReturnReason>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A return request that passed field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReturn {
    pub user_id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub reason: ReturnReason,
    pub description: Option<String>,
}

/// Per-product return availability on a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnableLine {
    pub product_id: String,
    pub product_name: String,
    pub sold: i64,
    pub already_returned: i64,
    pub available: i64,
    /// Unit price a return of this product is refunded at under the
    /// ledger's return pricing.
    pub unit_price_cents: i64,
}

/// A sale together with what can still be returned from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnableSale {
    pub sale: Sale,
    pub lines: Vec<ReturnableLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_strings() {
        for status in ReturnStatus::ALL {
            assert_eq!(status.as_str().parse::<ReturnStatus>().unwrap(), status);
        }
        assert_eq!(" Completed ".parse::<SaleStatus>().unwrap(), SaleStatus::Completed);
        assert!("closed".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(SaleStatus::default(), SaleStatus::Completed);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
        assert_eq!(ReturnStatus::default(), ReturnStatus::Pending);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ReturnReason::Unsolicited).unwrap();
        assert_eq!(json, "\"unsolicited\"");

        let request: ReturnRequest =
            serde_json::from_str(r#"{"sale_id":"s1","quantity":2,"reason":"defective"}"#).unwrap();
        assert_eq!(request.reason, Some(ReturnReason::Defective));
        assert!(request.product_id.is_none());
    }

    #[test]
    fn test_new_sale_defaults_payment_method() {
        let sale: NewSale = serde_json::from_str(
            r#"{"user_id":"u1","lines":[{"product_id":"p1","quantity":1}]}"#,
        )
        .unwrap();
        assert_eq!(sale.payment_method, PaymentMethod::Cash);
        assert_eq!(sale.lines[0].unit_price_cents, None);
    }
}
