//! # Sale Repository
//!
//! Row-level access to `sales` and `sale_lines`.
//!
//! Writes happen only through the ledger, which calls the connection-level
//! functions below inside its own transaction. [`SaleRepository`] offers
//! read access for callers that just want to look.
//!
//! ## Sale Rows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales                         sale_lines                               │
//! │  ┌────────────────────┐  1..N  ┌─────────────────────────────┐          │
//! │  │ id                 │───────►│ sale_id, position           │          │
//! │  │ subtotal / total   │        │ product_id, quantity        │          │
//! │  │ status, payment    │        │ unit_price, subtotal        │          │
//! │  │ sold_at            │        └─────────────────────────────┘          │
//! │  └────────────────────┘                                                 │
//! │                                                                         │
//! │  total == subtotal == Σ sale_lines.subtotal                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use inventa_core::report::DateRange;
use inventa_core::{ProductSummary, Sale, SaleDetail, SaleLine, SaleLineDetail, SaleStatus};

use crate::error::DbResult;

const SELECT_SALE: &str = r#"
    SELECT
        id, subtotal_cents, discount_cents, tax_cents, total_cents,
        status, payment_method, customer_name, customer_phone, notes,
        user_id, sold_at, updated_at
    FROM sales
"#;

const SELECT_LINE: &str = r#"
    SELECT
        id, sale_id, product_id, position, quantity,
        unit_price_cents, subtotal_cents, created_at
    FROM sale_lines
"#;

/// Repository for reading sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, id).await
    }

    /// Gets a sale with its lines and their products.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<SaleDetail>> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, id).await
    }

    /// Lines of a sale in position order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let mut conn = self.pool.acquire().await?;
        fetch_lines(&mut conn, sale_id).await
    }

    /// Sales made inside `range`, newest first.
    pub async fn list_between(&self, range: &DateRange) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_SALE} WHERE sold_at >= ?1 AND sold_at < ?2 ORDER BY sold_at DESC"
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// Every sale id, oldest first.
    pub async fn list_ids(&self) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM sales ORDER BY sold_at, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Connection-level functions
// =============================================================================

pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(sale)
}

pub(crate) async fn fetch_lines(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleLine>> {
    let lines = sqlx::query_as::<_, SaleLine>(&format!(
        "{SELECT_LINE} WHERE sale_id = ?1 ORDER BY position"
    ))
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

/// A sale line joined with the product columns shown next to it.
#[derive(Debug, FromRow)]
struct LineWithProduct {
    id: String,
    sale_id: String,
    product_id: String,
    position: i64,
    quantity: i64,
    unit_price_cents: i64,
    subtotal_cents: i64,
    created_at: DateTime<Utc>,
    product_name: String,
    product_sale_price_cents: i64,
}

impl From<LineWithProduct> for SaleLineDetail {
    fn from(row: LineWithProduct) -> Self {
        SaleLineDetail {
            product: ProductSummary {
                id: row.product_id.clone(),
                name: row.product_name,
                sale_price_cents: row.product_sale_price_cents,
            },
            line: SaleLine {
                id: row.id,
                sale_id: row.sale_id,
                product_id: row.product_id,
                position: row.position,
                quantity: row.quantity,
                unit_price_cents: row.unit_price_cents,
                subtotal_cents: row.subtotal_cents,
                created_at: row.created_at,
            },
        }
    }
}

pub(crate) async fn fetch_detail(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<SaleDetail>> {
    let Some(sale) = fetch_sale(&mut *conn, id).await? else {
        return Ok(None);
    };

    let rows = sqlx::query_as::<_, LineWithProduct>(
        r#"
        SELECT
            l.id, l.sale_id, l.product_id, l.position, l.quantity,
            l.unit_price_cents, l.subtotal_cents, l.created_at,
            p.name AS product_name,
            p.sale_price_cents AS product_sale_price_cents
        FROM sale_lines l
        INNER JOIN products p ON p.id = l.product_id
        WHERE l.sale_id = ?1
        ORDER BY l.position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(SaleDetail {
        sale,
        lines: rows.into_iter().map(SaleLineDetail::from).collect(),
    }))
}

pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, total = sale.total_cents, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, subtotal_cents, discount_cents, tax_cents, total_cents,
            status, payment_method, customer_name, customer_phone, notes,
            user_id, sold_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&sale.id)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.status)
    .bind(sale.payment_method)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(&sale.notes)
    .bind(&sale.user_id)
    .bind(sale.sold_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_line(conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_lines (
            id, sale_id, product_id, position, quantity,
            unit_price_cents, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.product_id)
    .bind(line.position)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.subtotal_cents)
    .bind(line.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Removes a sale and its lines.
pub(crate) async fn delete_sale_rows(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    sqlx::query("DELETE FROM sale_lines WHERE sale_id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM sales WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn update_totals(
    conn: &mut SqliteConnection,
    id: &str,
    subtotal_cents: i64,
    total_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE sales SET subtotal_cents = ?2, total_cents = ?3, updated_at = ?4 WHERE id = ?1",
    )
    .bind(id)
    .bind(subtotal_cents)
    .bind(total_cents)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn update_status(
    conn: &mut SqliteConnection,
    id: &str,
    status: SaleStatus,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}
