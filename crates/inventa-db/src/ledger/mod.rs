//! # Ledger
//!
//! The transactional write path for sales and returns.
//!
//! ## Transaction Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Operation = One Transaction                      │
//! │                                                                         │
//! │  Ledger::create_sale(input)                                            │
//! │       │                                                                 │
//! │       ├── pool.begin()                                                  │
//! │       ├── sales::create_sale(&mut tx, input)                            │
//! │       │      ├── read products             (checks in inventa-core)     │
//! │       │      ├── INSERT sale + lines                                    │
//! │       │      └── UPDATE stock ... WHERE stock >= n                      │
//! │       └── tx.commit()                                                   │
//! │                                                                         │
//! │  Any Err before commit drops `tx` → ROLLBACK. No partial writes.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The functions in [`sales`], [`returns`] and [`totals`] take an explicit
//! `&mut SqliteConnection`, so several operations can also be composed in a
//! caller-owned transaction.

pub mod returns;
pub mod sales;
pub mod totals;

use sqlx::SqlitePool;
use tracing::{info, warn};

use inventa_core::ledger::LedgerPolicy;
use inventa_core::report::DateRange;
use inventa_core::{
    CoreError, NewSale, ReturnDetail, ReturnRequest, ReturnStatus, ReturnableSale, Sale,
    SaleDetail, SaleStatus,
};

use crate::error::AppResult;
use crate::repository::{sale, SaleRepository};

pub use totals::{RecalculationFailure, RecalculationReport};

/// Entry point for ledger operations.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = db.ledger();
/// let detail = ledger.create_sale(NewSale::new(user_id, lines)).await?;
/// let ret = ledger.create_return(request).await?;
/// ledger.process_return(&ret.sale_return.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
    policy: LedgerPolicy,
}

impl Ledger {
    pub fn new(pool: SqlitePool, policy: LedgerPolicy) -> Self {
        Ledger { pool, policy }
    }

    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    // ===== Sales =====

    /// Records a sale and decrements stock for every line.
    pub async fn create_sale(&self, input: NewSale) -> AppResult<SaleDetail> {
        let mut tx = self.pool.begin().await?;
        let detail = sales::create_sale(&mut tx, &input).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Deletes a sale and restores its stock.
    pub async fn delete_sale(&self, sale_id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sales::delete_sale(&mut tx, sale_id, self.policy.sale_deletion).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn update_sale_status(&self, sale_id: &str, status: SaleStatus) -> AppResult<Sale> {
        let mut tx = self.pool.begin().await?;
        let updated = sales::update_sale_status(&mut tx, sale_id, status).await?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn sale_detail(&self, sale_id: &str) -> AppResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;
        sale::fetch_detail(&mut conn, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    // ===== Returns =====

    /// Records a pending return.
    pub async fn create_return(&self, request: ReturnRequest) -> AppResult<ReturnDetail> {
        let mut tx = self.pool.begin().await?;
        let detail = returns::create_return(&mut tx, &request, self.policy.return_pricing).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Processes a pending return, restoring its stock.
    pub async fn process_return(&self, return_id: &str) -> AppResult<ReturnDetail> {
        let mut tx = self.pool.begin().await?;
        let detail = returns::process_return(&mut tx, return_id).await?;
        tx.commit().await?;
        Ok(detail)
    }

    pub async fn update_return_status(
        &self,
        return_id: &str,
        status: ReturnStatus,
    ) -> AppResult<ReturnDetail> {
        let mut tx = self.pool.begin().await?;
        let detail = returns::update_return_status(&mut tx, return_id, status).await?;
        tx.commit().await?;
        Ok(detail)
    }

    pub async fn delete_return(&self, return_id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        returns::delete_return(&mut tx, return_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn return_detail(&self, return_id: &str) -> AppResult<ReturnDetail> {
        let mut conn = self.pool.acquire().await?;
        returns::fetch_return_detail(&mut conn, return_id)
            .await?
            .ok_or_else(|| CoreError::ReturnNotFound(return_id.to_string()).into())
    }

    /// What can still be returned from one sale.
    pub async fn returnable_sale(&self, sale_id: &str) -> AppResult<ReturnableSale> {
        let mut conn = self.pool.acquire().await?;
        returns::returnable_sale(&mut conn, sale_id, self.policy.return_pricing).await
    }

    /// Completed sales in `range` with at least one unit left to return,
    /// newest first.
    pub async fn returnable_sales(&self, range: &DateRange) -> AppResult<Vec<ReturnableSale>> {
        let mut conn = self.pool.acquire().await?;

        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM sales
            WHERE status = ?1 AND sold_at >= ?2 AND sold_at < ?3
            ORDER BY sold_at DESC, id
            "#,
        )
        .bind(SaleStatus::Completed)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&mut *conn)
        .await?;

        let mut found = Vec::new();
        for id in ids {
            let candidate = returns::returnable_sale(&mut conn, &id, self.policy.return_pricing).await?;
            if candidate.lines.iter().any(|l| l.available > 0) {
                found.push(candidate);
            }
        }
        Ok(found)
    }

    // ===== Maintenance =====

    /// Recomputes every sale's totals from its lines.
    ///
    /// Each sale is fixed in its own transaction. A sale that fails is
    /// logged and listed in the report; the rest are still processed.
    pub async fn recalculate_totals(&self) -> AppResult<RecalculationReport> {
        let ids = SaleRepository::new(self.pool.clone()).list_ids().await?;

        info!(sales = ids.len(), "Recalculating sale totals");

        let mut report = RecalculationReport::default();
        for sale_id in ids {
            report.examined += 1;

            let outcome = async {
                let mut tx = self.pool.begin().await?;
                let corrected = totals::recalculate_sale(&mut tx, &sale_id).await?;
                tx.commit().await?;
                AppResult::Ok(corrected)
            }
            .await;

            match outcome {
                Ok(Some(_)) => report.corrected.push(sale_id),
                Ok(None) => {}
                Err(err) => {
                    warn!(sale_id = %sale_id, error = %err, "Could not recalculate sale");
                    report.failures.push(RecalculationFailure {
                        sale_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            examined = report.examined,
            corrected = report.corrected.len(),
            failures = report.failures.len(),
            "Recalculation finished"
        );
        Ok(report)
    }
}
