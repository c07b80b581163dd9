//! Fixtures shared by the unit tests.

use std::path::Path;

use chrono::{DateTime, Utc};

use inventa_core::ledger::LedgerPolicy;
use inventa_core::{
    NewCategory, NewProduct, NewSale, NewSaleLine, Product, ReturnReason, ReturnRequest,
    SaleDetail,
};

use crate::{Database, DbConfig};

pub const CLERK: &str = "clerk-1";

/// Store with one category and two products:
/// A at 10.00 with 10 in stock, B at 5.00 with 5 in stock.
pub struct Shop {
    pub db: Database,
    pub category_id: String,
    pub a: Product,
    pub b: Product,
}

impl Shop {
    pub async fn open() -> Self {
        Self::with_policy(LedgerPolicy::default()).await
    }

    pub async fn with_policy(policy: LedgerPolicy) -> Self {
        let db = Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .with_ledger_policy(policy);
        Self::stock(db).await
    }

    /// File-backed store in `dir` with a multi-connection pool, so
    /// transactions can overlap.
    pub async fn on_disk(dir: &Path) -> Self {
        let db = Database::new(DbConfig::new(dir.join("inventa.db")).max_connections(4))
            .await
            .unwrap();
        Self::stock(db).await
    }

    async fn stock(db: Database) -> Self {
        let category = db
            .categories()
            .create(NewCategory {
                name: "General".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let a = db
            .products()
            .create(product(&category.id, "Product A", 1000, 10))
            .await
            .unwrap();
        let b = db
            .products()
            .create(product(&category.id, "Product B", 500, 5))
            .await
            .unwrap();

        Shop {
            db,
            category_id: category.id,
            a,
            b,
        }
    }

    /// Records a sale of the given `(product_id, quantity)` pairs.
    pub async fn sell<S: AsRef<str>>(&self, lines: &[(S, i64)]) -> SaleDetail {
        let lines = lines
            .iter()
            .map(|(id, qty)| NewSaleLine::new(id.as_ref(), *qty))
            .collect();
        self.db
            .ledger()
            .create_sale(NewSale::new(CLERK, lines))
            .await
            .unwrap()
    }

    pub async fn stock_of(&self, product_id: &str) -> i64 {
        self.db
            .products()
            .get_by_id(product_id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    /// Moves a sale to another timestamp, for date-bound reports.
    pub async fn backdate_sale(&self, sale_id: &str, sold_at: DateTime<Utc>) {
        sqlx::query("UPDATE sales SET sold_at = ?2 WHERE id = ?1")
            .bind(sale_id)
            .bind(sold_at)
            .execute(self.db.pool())
            .await
            .unwrap();
    }
}

pub fn product(category_id: &str, name: &str, price_cents: i64, stock: i64) -> NewProduct {
    NewProduct {
        name: name.into(),
        purchase_price_cents: price_cents / 2,
        sale_price_cents: price_cents,
        stock,
        category_id: category_id.to_string(),
        ..Default::default()
    }
}

pub fn return_request(sale_id: &str, product_id: &str, quantity: i64) -> ReturnRequest {
    ReturnRequest {
        user_id: Some(CLERK.into()),
        sale_id: Some(sale_id.into()),
        product_id: Some(product_id.into()),
        quantity: Some(quantity),
        reason: Some(ReturnReason::Defective),
        description: None,
    }
}
