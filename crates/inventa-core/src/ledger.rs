//! # Ledger Rules
//!
//! Pure decision functions for sales and returns. The database layer loads
//! the rows involved, calls these functions, and writes their output back
//! inside one transaction. Nothing here touches storage.
//!
//! ## Sale Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewSale { lines: [A×3, B×1, A×1] }     catalog snapshot {A, B}          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plan_sale()                                                            │
//! │   ├── line 0: A exists? active? 3 ≤ stock(A)?                          │
//! │   ├── line 1: B exists? active? 1 ≤ stock(B)?                          │
//! │   └── line 2: A exists? active? 3+1 ≤ stock(A)?   (cumulative)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SalePlan { lines, subtotal, total, stock_changes: [A -4, B -1] }       │
//! │                                                                         │
//! │  First failing line wins; on failure nothing is written.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Return Bound
//! ```text
//! For each (sale, product):
//!
//!     Σ returns.quantity (any status)  ≤  Σ sale_lines.quantity
//!
//! available = sold − already_returned
//!   available == 0          → NothingLeftToReturn
//!   requested > available   → ReturnQuantityExceeded
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{NewSale, Product, ReturnStatus, Sale, SaleLine, SaleReturn};

// =============================================================================
// Stock
// =============================================================================

/// A signed stock movement for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: String,
    pub delta: i64,
}

/// Applies a stock delta, refusing to go below zero.
///
/// ## Example
/// ```rust
/// # use chrono::Utc;
/// # use inventa_core::types::Product;
/// use inventa_core::ledger::apply_stock_delta;
///
/// # let product = Product {
/// #     id: "p1".into(), name: "Widget".into(), description: None,
/// #     purchase_price_cents: 500, sale_price_cents: 1000, stock: 3,
/// #     stock_minimum: 5, category_id: "c1".into(), supplier_id: None,
/// #     active: true, created_by: None, created_at: Utc::now(), updated_at: Utc::now(),
/// # };
/// let updated = apply_stock_delta(&product, -3).unwrap();
/// assert_eq!(updated.stock, 0);
/// assert!(apply_stock_delta(&product, -4).is_err());
/// ```
pub fn apply_stock_delta(product: &Product, delta: i64) -> CoreResult<Product> {
    let next = product.stock.checked_add(delta).filter(|s| *s >= 0);

    match next {
        Some(stock) => Ok(Product {
            stock,
            ..product.clone()
        }),
        None => Err(CoreError::NegativeStock {
            product: product.name.clone(),
            current: product.stock,
            delta,
        }),
    }
}

/// Stock to put back when a sale is deleted, one entry per product.
pub fn restock_for_deletion(lines: &[SaleLine]) -> CoreResult<Vec<StockChange>> {
    let mut changes: Vec<StockChange> = Vec::new();
    for line in lines {
        match changes.iter_mut().find(|c| c.product_id == line.product_id) {
            Some(change) => {
                change.delta = change
                    .delta
                    .checked_add(line.quantity)
                    .ok_or(CoreError::AmountOverflow)?;
            }
            None => changes.push(StockChange {
                product_id: line.product_id.clone(),
                delta: line.quantity,
            }),
        }
    }
    Ok(changes)
}

// =============================================================================
// Sale Planning
// =============================================================================

/// A validated, priced sale line ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub position: i64,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// Everything needed to write a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    pub lines: Vec<PlannedLine>,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    /// Negative deltas, one per distinct product, in first-seen order.
    pub stock_changes: Vec<StockChange>,
}

/// Checks every line of a sale against a catalog snapshot and prices it.
///
/// `catalog` must contain every product the sale references that exists;
/// a missing key is reported as `ProductNotFound`.
pub fn plan_sale(input: &NewSale, catalog: &HashMap<String, Product>) -> CoreResult<SalePlan> {
    if input.lines.is_empty() {
        return Err(CoreError::EmptySale);
    }

    let mut lines = Vec::with_capacity(input.lines.len());
    let mut reserved: Vec<StockChange> = Vec::new();
    let mut subtotal = Money::zero();

    for (position, requested) in input.lines.iter().enumerate() {
        let product = catalog
            .get(&requested.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(requested.product_id.clone()))?;

        if !product.active {
            return Err(CoreError::ProductInactive {
                product: product.name.clone(),
            });
        }

        let already = reserved
            .iter()
            .find(|c| c.product_id == product.id)
            .map(|c| c.delta)
            .unwrap_or(0);
        let cumulative = already
            .checked_add(requested.quantity)
            .ok_or(CoreError::AmountOverflow)?;
        if cumulative > product.stock {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: cumulative,
            });
        }

        match reserved.iter_mut().find(|c| c.product_id == product.id) {
            Some(change) => change.delta = cumulative,
            None => reserved.push(StockChange {
                product_id: product.id.clone(),
                delta: cumulative,
            }),
        }

        let unit_price = requested
            .unit_price_cents
            .unwrap_or(product.sale_price_cents);
        let line_total = Money::from_cents(unit_price)
            .checked_mul_quantity(requested.quantity)
            .ok_or(CoreError::AmountOverflow)?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or(CoreError::AmountOverflow)?;

        lines.push(PlannedLine {
            position: position as i64,
            product_id: product.id.clone(),
            quantity: requested.quantity,
            unit_price_cents: unit_price,
            subtotal_cents: line_total.cents(),
        });
    }

    let stock_changes = reserved
        .into_iter()
        .map(|c| StockChange {
            product_id: c.product_id,
            delta: -c.delta,
        })
        .collect();

    Ok(SalePlan {
        lines,
        subtotal_cents: subtotal.cents(),
        total_cents: subtotal.cents(),
        stock_changes,
    })
}

// =============================================================================
// Totals
// =============================================================================

/// Derived monetary totals of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal_cents: i64,
    pub total_cents: i64,
}

/// Sums line subtotals. `total` equals `subtotal`.
pub fn sale_totals(lines: &[SaleLine]) -> CoreResult<SaleTotals> {
    let subtotal = lines.iter().try_fold(Money::zero(), |acc, line| {
        acc.checked_add(Money::from_cents(line.subtotal_cents))
            .ok_or(CoreError::AmountOverflow)
    })?;

    Ok(SaleTotals {
        subtotal_cents: subtotal.cents(),
        total_cents: subtotal.cents(),
    })
}

/// Returns the corrected totals when the stored ones drifted, else `None`.
///
/// Amounts are integer cents, so any difference is at least one cent and
/// is corrected.
pub fn totals_correction(sale: &Sale, lines: &[SaleLine]) -> CoreResult<Option<SaleTotals>> {
    let expected = sale_totals(lines)?;
    if expected.subtotal_cents == sale.subtotal_cents && expected.total_cents == sale.total_cents {
        Ok(None)
    } else {
        Ok(Some(expected))
    }
}

// =============================================================================
// Returns
// =============================================================================

/// Units of a product sold on a sale (summed over duplicate lines).
pub fn sold_quantity(lines: &[SaleLine], product_id: &str) -> CoreResult<i64> {
    lines
        .iter()
        .filter(|l| l.product_id == product_id)
        .try_fold(0i64, |acc, l| {
            acc.checked_add(l.quantity).ok_or(CoreError::AmountOverflow)
        })
}

/// How much of a sold product can still be returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnAvailability {
    pub sold: i64,
    pub already_returned: i64,
    pub available: i64,
}

impl ReturnAvailability {
    /// `already_returned` counts returns in every status.
    pub fn new(sold: i64, already_returned: i64) -> Self {
        ReturnAvailability {
            sold,
            already_returned,
            available: (sold - already_returned).max(0),
        }
    }

    /// Checks a requested return quantity against what is left.
    pub fn check(&self, requested: i64) -> CoreResult<()> {
        if self.available == 0 {
            return Err(CoreError::NothingLeftToReturn { sold: self.sold });
        }
        if requested > self.available {
            return Err(CoreError::ReturnQuantityExceeded {
                requested,
                available: self.available,
                already_returned: self.already_returned,
                sold: self.sold,
            });
        }
        Ok(())
    }
}

/// Which unit price a return is refunded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReturnPricing {
    /// The product's sale price at the time of the return.
    #[default]
    CurrentPrice,
    /// The unit price captured on the sale.
    ///
    /// When the sale has several lines for the product at different prices,
    /// the line with the lowest position sets the price for every returned
    /// unit. Lines are not split per return.
    SalePrice,
}

impl ReturnPricing {
    /// Picks the unit price for a return of `product` on a sale with `lines`.
    pub fn unit_price(&self, product: &Product, lines: &[SaleLine]) -> i64 {
        self.price_for(&product.id, product.sale_price_cents, lines)
    }

    /// Same as [`ReturnPricing::unit_price`] from a product id and its
    /// current sale price.
    pub fn price_for(&self, product_id: &str, current_price_cents: i64, lines: &[SaleLine]) -> i64 {
        match self {
            ReturnPricing::CurrentPrice => current_price_cents,
            ReturnPricing::SalePrice => lines
                .iter()
                .filter(|l| l.product_id == product_id)
                .min_by_key(|l| l.position)
                .map(|l| l.unit_price_cents)
                .unwrap_or(current_price_cents),
        }
    }
}

impl fmt::Display for ReturnPricing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnPricing::CurrentPrice => f.write_str("current_price"),
            ReturnPricing::SalePrice => f.write_str("sale_price"),
        }
    }
}

impl FromStr for ReturnPricing {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current_price" | "current" => Ok(ReturnPricing::CurrentPrice),
            "sale_price" | "sale" => Ok(ReturnPricing::SalePrice),
            _ => Err(ValidationError::NotAllowed {
                field: "return_pricing".to_string(),
                allowed: vec!["current_price".to_string(), "sale_price".to_string()],
            }),
        }
    }
}

/// `quantity × unit_price`, checked.
pub fn return_amount(quantity: i64, unit_price_cents: i64) -> CoreResult<i64> {
    Money::from_cents(unit_price_cents)
        .checked_mul_quantity(quantity)
        .map(|m| m.cents())
        .ok_or(CoreError::AmountOverflow)
}

/// Only pending returns can be processed.
pub fn ensure_processable(sale_return: &SaleReturn) -> CoreResult<()> {
    if sale_return.status != ReturnStatus::Pending {
        return Err(CoreError::ReturnNotPending {
            status: sale_return.status.to_string(),
        });
    }
    Ok(())
}

/// Processed returns are permanent.
pub fn ensure_deletable(sale_return: &SaleReturn) -> CoreResult<()> {
    if sale_return.status == ReturnStatus::Processed {
        return Err(CoreError::ProcessedReturnLocked(sale_return.id.clone()));
    }
    Ok(())
}

// =============================================================================
// Sale Deletion
// =============================================================================

/// What happens to a sale deletion when returns reference the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleDeletionPolicy {
    /// Delete anyway. Returns stay recorded against the removed sale id.
    #[default]
    Allow,
    /// Refuse while any return exists for the sale.
    RejectWithReturns,
}

impl SaleDeletionPolicy {
    pub fn check(&self, sale_id: &str, return_count: i64) -> CoreResult<()> {
        match self {
            SaleDeletionPolicy::RejectWithReturns if return_count > 0 => {
                Err(CoreError::SaleHasReturns {
                    sale_id: sale_id.to_string(),
                    returns: return_count,
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for SaleDeletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleDeletionPolicy::Allow => f.write_str("allow"),
            SaleDeletionPolicy::RejectWithReturns => f.write_str("reject_with_returns"),
        }
    }
}

impl FromStr for SaleDeletionPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(SaleDeletionPolicy::Allow),
            "reject_with_returns" | "reject" => Ok(SaleDeletionPolicy::RejectWithReturns),
            _ => Err(ValidationError::NotAllowed {
                field: "sale_deletion".to_string(),
                allowed: vec!["allow".to_string(), "reject_with_returns".to_string()],
            }),
        }
    }
}

/// Ledger behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerPolicy {
    #[serde(default)]
    pub return_pricing: ReturnPricing,
    #[serde(default)]
    pub sale_deletion: SaleDeletionPolicy,
}

// =============================================================================
// Unit Tests
// =============================================================================
