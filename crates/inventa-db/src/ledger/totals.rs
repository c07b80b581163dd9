//! Totals recalculation: maintenance repair of `sales.subtotal/total`.
//!
//! Never part of the normal write path. Run it explicitly (see the
//! `recalculate-totals` binary) after manual data edits or imports.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::info;

use inventa_core::ledger::{totals_correction, SaleTotals};
use inventa_core::CoreError;

use crate::error::AppResult;
use crate::repository::sale;

/// Outcome of a recalculation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationReport {
    /// Sales looked at.
    pub examined: usize,
    /// Ids of sales whose stored totals were overwritten.
    pub corrected: Vec<String>,
    /// Sales that could not be checked; the run carried on past them.
    pub failures: Vec<RecalculationFailure>,
}

impl RecalculationReport {
    pub fn corrected_count(&self) -> usize {
        self.corrected.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationFailure {
    pub sale_id: String,
    pub error: String,
}

/// Recomputes one sale's totals from its lines and writes them back when
/// they differ from what is stored.
///
/// Returns the new totals when a correction was made.
pub async fn recalculate_sale(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> AppResult<Option<SaleTotals>> {
    let stored = sale::fetch_sale(&mut *conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
    let lines = sale::fetch_lines(&mut *conn, sale_id).await?;

    let Some(corrected) = totals_correction(&stored, &lines)? else {
        return Ok(None);
    };

    sale::update_totals(
        &mut *conn,
        sale_id,
        corrected.subtotal_cents,
        corrected.total_cents,
        Utc::now(),
    )
    .await?;

    info!(
        sale_id = %sale_id,
        old_total = stored.total_cents,
        new_total = corrected.total_cents,
        "Sale totals corrected"
    );
    Ok(Some(corrected))
}

// =============================================================================
// Unit Tests
// =============================================================================
