//! # Product Repository
//!
//! Catalog operations for products, plus the connection-level stock helpers
//! the ledger runs inside its transactions.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ Read-modify-write (lost update under concurrency)                  │
//! │     SELECT stock → 7;  UPDATE products SET stock = 4                   │
//! │                                                                         │
//! │  ✅ Guarded delta                                                      │
//! │     UPDATE products SET stock = stock - 3                              │
//! │     WHERE id = ? AND stock >= 3                                        │
//! │                                                                         │
//! │  rows_affected == 0  →  someone else took the stock first              │
//! │  CHECK (stock >= 0)  →  last line of defence in the schema             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use inventa_core::ledger::apply_stock_delta;
use inventa_core::validation::{validate_new_product, validate_product_update};
use inventa_core::{new_id, CoreError, NewProduct, Product, ProductUpdate, DEFAULT_STOCK_MINIMUM};

use crate::error::{AppResult, DbResult};

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, name, description, purchase_price_cents, sale_price_cents,
        stock, stock_minimum, category_id, supplier_id, active,
        created_by, created_at, updated_at
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.create(new_product).await?;
/// let restocked = repo.adjust_stock(&product.id, 24).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product.
    ///
    /// ## Returns
    /// * `Err(CategoryNotFound)` - category missing or inactive
    /// * `Err(SupplierNotFound)` - supplier given but missing or inactive
    pub async fn create(&self, input: NewProduct) -> AppResult<Product> {
        validate_new_product(&input)?;

        let mut conn = self.pool.acquire().await?;
        ensure_category(&mut conn, &input.category_id).await?;
        if let Some(supplier_id) = &input.supplier_id {
            ensure_supplier(&mut conn, supplier_id).await?;
        }

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            name: input.name.trim().to_string(),
            description: input.description,
            purchase_price_cents: input.purchase_price_cents,
            sale_price_cents: input.sale_price_cents,
            stock: input.stock,
            stock_minimum: input.stock_minimum.unwrap_or(DEFAULT_STOCK_MINIMUM),
            category_id: input.category_id,
            supplier_id: input.supplier_id,
            active: true,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, purchase_price_cents, sale_price_cents,
                stock, stock_minimum, category_id, supplier_id, active,
                created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.stock)
        .bind(product.stock_minimum)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.active)
        .bind(&product.created_by)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        info!(id = %product.id, name = %product.name, stock = product.stock, "Product created");
        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Active products sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products =
            sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE active = 1 ORDER BY name"))
                .fetch_all(&self.pool)
                .await?;
        Ok(products)
    }

    /// Active products in a category.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE active = 1 AND category_id = ?1 ORDER BY name"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Applies a catalog edit.
    ///
    /// A `stock` value here overwrites the count directly; it is for
    /// physical inventory corrections, not for sales.
    pub async fn update(&self, id: &str, update: ProductUpdate) -> AppResult<Product> {
        validate_product_update(&update)?;

        let mut conn = self.pool.acquire().await?;
        let mut product = fetch_product(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        if let Some(category_id) = update.category_id {
            ensure_category(&mut conn, &category_id).await?;
            product.category_id = category_id;
        }
        if let Some(supplier_id) = update.supplier_id {
            ensure_supplier(&mut conn, &supplier_id).await?;
            product.supplier_id = Some(supplier_id);
        } else if update.clear_supplier {
            product.supplier_id = None;
        }
        if let Some(name) = update.name {
            product.name = name.trim().to_string();
        }
        if update.description.is_some() {
            product.description = update.description;
        }
        if let Some(price) = update.purchase_price_cents {
            product.purchase_price_cents = price;
        }
        if let Some(price) = update.sale_price_cents {
            product.sale_price_cents = price;
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
        }
        if let Some(minimum) = update.stock_minimum {
            product.stock_minimum = minimum;
        }
        if let Some(active) = update.active {
            product.active = active;
        }
        product.updated_at = Utc::now();

        debug!(id = %id, "Updating product");

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                purchase_price_cents = ?4,
                sale_price_cents = ?5,
                stock = ?6,
                stock_minimum = ?7,
                category_id = ?8,
                supplier_id = ?9,
                active = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.stock)
        .bind(product.stock_minimum)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.active)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Soft-deletes a product. Past sales keep referencing it.
    pub async fn deactivate(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE products SET active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        info!(id = %id, "Product deactivated");
        Ok(())
    }

    /// Adds (or with a negative `delta`, removes) stock outside the ledger,
    /// e.g. when a delivery arrives.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> AppResult<Product> {
        let mut tx = self.pool.begin().await?;

        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        let mut adjusted = apply_stock_delta(&product, delta)?;
        adjusted.updated_at = Utc::now();

        sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&adjusted.id)
            .bind(adjusted.stock)
            .bind(adjusted.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, delta = delta, stock = adjusted.stock, "Stock adjusted");
        Ok(adjusted)
    }

    /// Active products at or below their minimum, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE active = 1 AND stock <= stock_minimum ORDER BY stock, name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn count_low_stock(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE active = 1 AND stock <= stock_minimum",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Counts active products (for the dashboard).
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (used inside ledger transactions)
// =============================================================================

/// Loads a product on the given connection.
pub(crate) async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(product)
}

/// Takes `quantity` units out of stock if at least that many are on hand.
///
/// Returns `false` when the guard failed and nothing was changed.
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, quantity = quantity, "Decrementing stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Puts `quantity` units back into stock.
///
/// Returns `false` when the product row no longer exists.
pub(crate) async fn increment_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, quantity = quantity, "Restoring stock");

    let result = sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

async fn ensure_category(conn: &mut SqliteConnection, id: &str) -> AppResult<()> {
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?1 AND active = 1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    match exists {
        Some(_) => Ok(()),
        None => Err(CoreError::CategoryNotFound(id.to_string()).into()),
    }
}

async fn ensure_supplier(conn: &mut SqliteConnection, id: &str) -> AppResult<()> {
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM suppliers WHERE id = ?1 AND active = 1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    match exists {
        Some(_) => Ok(()),
        None => Err(CoreError::SupplierNotFound(id.to_string()).into()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
