//! # Return Repository
//!
//! Row-level access to `sale_returns`. As with sales, every write goes
//! through the ledger; [`ReturnRepository`] is read-only.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use inventa_core::{ReturnStatus, SaleReturn};

use crate::error::DbResult;

const SELECT_RETURN: &str = r#"
    SELECT
        id, sale_id, product_id, quantity, reason, description,
        return_amount_cents, status, user_id, returned_at, updated_at
    FROM sale_returns
"#;

/// Repository for reading returns.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleReturn>> {
        let mut conn = self.pool.acquire().await?;
        fetch_return(&mut conn, id).await
    }

    /// Returns recorded against a sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<SaleReturn>> {
        let returns = sqlx::query_as::<_, SaleReturn>(&format!(
            "{SELECT_RETURN} WHERE sale_id = ?1 ORDER BY returned_at, id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(returns)
    }

    /// Returns in a given status, newest first.
    pub async fn list_by_status(&self, status: ReturnStatus) -> DbResult<Vec<SaleReturn>> {
        let returns = sqlx::query_as::<_, SaleReturn>(&format!(
            "{SELECT_RETURN} WHERE status = ?1 ORDER BY returned_at DESC, id"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(returns)
    }

    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_returns WHERE status = ?1")
            .bind(ReturnStatus::Pending)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Connection-level functions
// =============================================================================

pub(crate) async fn fetch_return(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<SaleReturn>> {
    let sale_return = sqlx::query_as::<_, SaleReturn>(&format!("{SELECT_RETURN} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(sale_return)
}

/// Units of a product already returned on a sale, in any status.
pub(crate) async fn returned_quantity(
    conn: &mut SqliteConnection,
    sale_id: &str,
    product_id: &str,
) -> DbResult<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0) FROM sale_returns WHERE sale_id = ?1 AND product_id = ?2",
    )
    .bind(sale_id)
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(total)
}

pub(crate) async fn count_for_sale(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_returns WHERE sale_id = ?1")
        .bind(sale_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

pub(crate) async fn insert_return(conn: &mut SqliteConnection, sale_return: &SaleReturn) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_returns (
            id, sale_id, product_id, quantity, reason, description,
            return_amount_cents, status, user_id, returned_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&sale_return.id)
    .bind(&sale_return.sale_id)
    .bind(&sale_return.product_id)
    .bind(sale_return.quantity)
    .bind(sale_return.reason)
    .bind(&sale_return.description)
    .bind(sale_return.return_amount_cents)
    .bind(sale_return.status)
    .bind(&sale_return.user_id)
    .bind(sale_return.returned_at)
    .bind(sale_return.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn update_status(
    conn: &mut SqliteConnection,
    id: &str,
    status: ReturnStatus,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query("UPDATE sale_returns SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn delete_return_row(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    sqlx::query("DELETE FROM sale_returns WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
