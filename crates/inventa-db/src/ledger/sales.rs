//! Sale creation, deletion and status changes.
//!
//! Each function takes the connection of an open transaction. The caller
//! commits; any `Err` leaves the transaction to be dropped and rolled back.

use chrono::Utc;
use sqlx::SqliteConnection;
use std::collections::HashMap;
use tracing::{debug, info};

use inventa_core::ledger::{plan_sale, restock_for_deletion, SaleDeletionPolicy};
use inventa_core::validation::validate_new_sale;
use inventa_core::{new_id, CoreError, NewSale, Product, Sale, SaleDetail, SaleLine, SaleStatus};

use crate::error::{AppResult, DbError};
use crate::repository::{product, returns, sale};

/// Records a sale, its lines and the matching stock decrements.
///
/// ## Steps
/// ```text
/// validate input ─► load referenced products ─► plan_sale (all checks)
///       │
///       ▼
/// INSERT sale ─► INSERT lines ─► guarded stock decrement per product
///       │
///       ▼
/// read back SaleDetail
/// ```
pub async fn create_sale(conn: &mut SqliteConnection, input: &NewSale) -> AppResult<SaleDetail> {
    validate_new_sale(input)?;

    let mut catalog: HashMap<String, Product> = HashMap::new();
    for line in &input.lines {
        if catalog.contains_key(&line.product_id) {
            continue;
        }
        if let Some(found) = product::fetch_product(&mut *conn, &line.product_id).await? {
            catalog.insert(found.id.clone(), found);
        }
    }

    let plan = plan_sale(input, &catalog)?;
    let now = Utc::now();

    let record = Sale {
        id: new_id(),
        subtotal_cents: plan.subtotal_cents,
        discount_cents: 0,
        tax_cents: 0,
        total_cents: plan.total_cents,
        status: SaleStatus::Completed,
        payment_method: input.payment_method,
        customer_name: clean(input.customer_name.as_deref()),
        customer_phone: clean(input.customer_phone.as_deref()),
        notes: clean(input.notes.as_deref()),
        user_id: input.user_id.trim().to_string(),
        sold_at: now,
        updated_at: now,
    };

    sale::insert_sale(&mut *conn, &record).await?;

    for planned in &plan.lines {
        let line = SaleLine {
            id: new_id(),
            sale_id: record.id.clone(),
            product_id: planned.product_id.clone(),
            position: planned.position,
            quantity: planned.quantity,
            unit_price_cents: planned.unit_price_cents,
            subtotal_cents: planned.subtotal_cents,
            created_at: now,
        };
        sale::insert_line(&mut *conn, &line).await?;
    }

    for change in &plan.stock_changes {
        let quantity = -change.delta;
        if !product::decrement_stock(&mut *conn, &change.product_id, quantity, now).await? {
            // Stock moved between planning and writing.
            let current = product::fetch_product(&mut *conn, &change.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(change.product_id.clone()))?;
            return Err(CoreError::InsufficientStock {
                product: current.name,
                available: current.stock,
                requested: quantity,
            }
            .into());
        }
    }

    let detail = sale::fetch_detail(&mut *conn, &record.id)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", &record.id))?;

    info!(
        sale_id = %record.id,
        lines = detail.lines.len(),
        total = record.total_cents,
        user_id = %record.user_id,
        "Sale recorded"
    );
    Ok(detail)
}

/// Deletes a sale and its lines, putting every sold unit back into stock.
///
/// Under [`SaleDeletionPolicy::Allow`] returns recorded against the sale are
/// left in place.
pub async fn delete_sale(
    conn: &mut SqliteConnection,
    sale_id: &str,
    policy: SaleDeletionPolicy,
) -> AppResult<()> {
    let existing = sale::fetch_sale(&mut *conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

    let return_count = returns::count_for_sale(&mut *conn, sale_id).await?;
    policy.check(sale_id, return_count)?;

    let lines = sale::fetch_lines(&mut *conn, sale_id).await?;
    let now = Utc::now();

    for change in restock_for_deletion(&lines)? {
        debug!(product_id = %change.product_id, delta = change.delta, "Restocking for deleted sale");
        if !product::increment_stock(&mut *conn, &change.product_id, change.delta, now).await? {
            return Err(CoreError::ProductNotFound(change.product_id).into());
        }
    }

    sale::delete_sale_rows(&mut *conn, sale_id).await?;

    info!(
        sale_id = %sale_id,
        lines = lines.len(),
        total = existing.total_cents,
        returns_kept = return_count,
        "Sale deleted"
    );
    Ok(())
}

/// Changes a sale's status. Stock is not touched.
pub async fn update_sale_status(
    conn: &mut SqliteConnection,
    sale_id: &str,
    status: SaleStatus,
) -> AppResult<Sale> {
    if !sale::update_status(&mut *conn, sale_id, status, Utc::now()).await? {
        return Err(CoreError::SaleNotFound(sale_id.to_string()).into());
    }

    let updated = sale::fetch_sale(&mut *conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

    info!(sale_id = %sale_id, status = %status, "Sale status updated");
    Ok(updated)
}

/// Trims optional free text, dropping it when blank.
fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::testing::{Shop, CLERK};
    use inventa_core::ledger::{LedgerPolicy, SaleDeletionPolicy};
    use inventa_core::{CoreError, ErrorKind, NewSale, NewSaleLine, SaleStatus};

    #[tokio::test]
    async fn test_create_sale_prices_lines_and_decrements_stock() {
        let shop = Shop::open().await;

        let detail = shop.sell(&[(&shop.a.id, 3), (&shop.b.id, 1)]).await;

        assert_eq!(detail.sale.subtotal_cents, 3500);
        assert_eq!(detail.sale.total_cents, 3500);
        assert_eq!(detail.sale.status, SaleStatus::Completed);
        assert_eq!(detail.lines.len(), 2);
        assert_eq!(detail.lines[0].line.position, 0);
        assert_eq!(detail.lines[0].line.subtotal_cents, 3000);
        assert_eq!(detail.lines[0].product.name, "Product A");
        assert_eq!(detail.lines[1].line.unit_price_cents, 500);

        assert_eq!(shop.stock_of(&shop.a.id).await, 7);
        assert_eq!(shop.stock_of(&shop.b.id).await, 4);
    }

    #[tokio::test]
    async fn test_explicit_unit_price_is_kept() {
        let shop = Shop::open().await;

        let input = NewSale::new(
            CLERK,
            vec![
                NewSaleLine::new(shop.a.id.clone(), 2).with_price(900),
                NewSaleLine::new(shop.b.id.clone(), 1).with_price(0),
            ],
        );
        let detail = shop.db.ledger().create_sale(input).await.unwrap();

        assert_eq!(detail.lines[0].line.unit_price_cents, 900);
        assert_eq!(detail.lines[1].line.unit_price_cents, 0);
        assert_eq!(detail.sale.total_cents, 1800);
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let shop = Shop::open().await;

        let err = shop
            .db
            .ledger()
            .create_sale(NewSale::new(
                CLERK,
                vec![
                    NewSaleLine::new(shop.a.id.clone(), 2),
                    NewSaleLine::new(shop.b.id.clone(), 6),
                ],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Product B: available 5, requested 6"
        );
        assert_eq!(shop.db.sales().count().await.unwrap(), 0);
        assert_eq!(shop.stock_of(&shop.a.id).await, 10);
        assert_eq!(shop.stock_of(&shop.b.id).await, 5);
    }

    #[tokio::test]
    async fn test_overlapping_sales_cannot_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let shop = Shop::on_disk(dir.path()).await;
        let ledger = shop.db.ledger();
        let last_units = || NewSale::new(CLERK, vec![NewSaleLine::new(shop.b.id.clone(), 5)]);

        let (first, second) = tokio::join!(
            ledger.create_sale(last_units()),
            ledger.create_sale(last_units()),
        );
        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );
        assert_eq!(shop.stock_of(&shop.b.id).await, 0);
        assert_eq!(shop.db.sales().count().await.unwrap(), 1);

        shop.db.close().await;
    }

    #[tokio::test]
    async fn test_huge_repeated_quantities_are_rejected() {
        let shop = Shop::open().await;

        let err = shop
            .db
            .ledger()
            .create_sale(NewSale::new(
                CLERK,
                vec![
                    NewSaleLine::new(shop.a.id.clone(), 1),
                    NewSaleLine::new(shop.a.id.clone(), i64::MAX),
                ],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err.as_domain(), Some(CoreError::AmountOverflow)));
        assert_eq!(shop.stock_of(&shop.a.id).await, 10);
    }

    #[tokio::test]
    async fn test_repeated_product_checks_cumulative_stock() {
        let shop = Shop::open().await;

        let err = shop
            .db
            .ledger()
            .create_sale(NewSale::new(
                CLERK,
                vec![
                    NewSaleLine::new(shop.b.id.clone(), 3),
                    NewSaleLine::new(shop.b.id.clone(), 3),
                ],
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientStock { requested: 6, .. })
        ));

        let detail = shop.sell(&[(&shop.b.id, 2), (&shop.b.id, 3)]).await;
        assert_eq!(detail.lines.len(), 2);
        assert_eq!(shop.stock_of(&shop.b.id).await, 0);
    }

    #[tokio::test]
    async fn test_rejects_empty_unknown_and_inactive() {
        let shop = Shop::open().await;
        let ledger = shop.db.ledger();

        let err = ledger.create_sale(NewSale::new(CLERK, vec![])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ledger
            .create_sale(NewSale::new(CLERK, vec![NewSaleLine::new("ghost", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        shop.db.products().deactivate(&shop.b.id).await.unwrap();
        let err = ledger
            .create_sale(NewSale::new(CLERK, vec![NewSaleLine::new(shop.b.id.clone(), 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::ProductInactive { .. })));

        let err = ledger
            .create_sale(NewSale::new(CLERK, vec![NewSaleLine::new(shop.a.id.clone(), 0)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(shop.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_sale_restores_stock() {
        let shop = Shop::open().await;
        let detail = shop.sell(&[(&shop.a.id, 3), (&shop.b.id, 2), (&shop.a.id, 1)]).await;
        assert_eq!(shop.stock_of(&shop.a.id).await, 6);

        shop.db.ledger().delete_sale(&detail.sale.id).await.unwrap();

        assert_eq!(shop.stock_of(&shop.a.id).await, 10);
        assert_eq!(shop.stock_of(&shop.b.id).await, 5);
        assert!(shop.db.sales().get_by_id(&detail.sale.id).await.unwrap().is_none());
        assert!(shop.db.sales().get_lines(&detail.sale.id).await.unwrap().is_empty());

        let err = shop.db.ledger().delete_sale(&detail.sale.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_restores_stock_of_deactivated_product() {
        let shop = Shop::open().await;
        let detail = shop.sell(&[(&shop.a.id, 4)]).await;
        shop.db.products().deactivate(&shop.a.id).await.unwrap();

        shop.db.ledger().delete_sale(&detail.sale.id).await.unwrap();
        assert_eq!(shop.stock_of(&shop.a.id).await, 10);
    }

    #[tokio::test]
    async fn test_reject_with_returns_policy() {
        let shop = Shop::with_policy(LedgerPolicy {
            sale_deletion: SaleDeletionPolicy::RejectWithReturns,
            ..Default::default()
        })
        .await;
        let detail = shop.sell(&[(&shop.a.id, 2)]).await;
        let ret = shop
            .db
            .ledger()
            .create_return(crate::testing::return_request(&detail.sale.id, &shop.a.id, 1))
            .await
            .unwrap();

        let err = shop.db.ledger().delete_sale(&detail.sale.id).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::SaleHasReturns { returns: 1, .. })
        ));
        assert_eq!(shop.stock_of(&shop.a.id).await, 8);

        shop.db.ledger().delete_return(&ret.sale_return.id).await.unwrap();
        shop.db.ledger().delete_sale(&detail.sale.id).await.unwrap();
        assert_eq!(shop.stock_of(&shop.a.id).await, 10);
    }

    #[tokio::test]
    async fn test_update_sale_status_leaves_stock() {
        let shop = Shop::open().await;
        let detail = shop.sell(&[(&shop.a.id, 2)]).await;

        let updated = shop
            .db
            .ledger()
            .update_sale_status(&detail.sale.id, SaleStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(updated.status, SaleStatus::Cancelled);
        assert_eq!(shop.stock_of(&shop.a.id).await, 8);

        let err = shop
            .db
            .ledger()
            .update_sale_status("missing", SaleStatus::Completed)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
