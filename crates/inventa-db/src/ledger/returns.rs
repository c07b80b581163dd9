//! Return creation, processing, status changes and deletion.
//!
//! ## Return Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_return ──► pending ──process_return──► processed               │
//! │                      │  ▲                      (stock += quantity)      │
//! │                      ▼  │                      terminal: no status      │
//! │               approved / rejected              change, no deletion      │
//! │                                                                         │
//! │  delete_return: allowed while not processed, no stock effect           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;

use inventa_core::ledger::{
    ensure_deletable, ensure_processable, return_amount, sold_quantity, ReturnAvailability,
    ReturnPricing,
};
use inventa_core::validation::validate_return_request;
use inventa_core::{
    new_id, CoreError, ReturnDetail, ReturnRequest, ReturnStatus, ReturnableLine, ReturnableSale,
    SaleLine, SaleReturn,
};

use crate::error::{AppResult, DbError, DbResult};
use crate::repository::{product, returns, sale};

/// Records a pending return after checking it against what is left to
/// return on the sale.
///
/// Checks run in order and the first failure is reported: required fields,
/// sale exists, product exists, product is on the sale, quantity available.
pub async fn create_return(
    conn: &mut SqliteConnection,
    request: &ReturnRequest,
    pricing: ReturnPricing,
) -> AppResult<ReturnDetail> {
    let input = validate_return_request(request)?;

    let sold_on = sale::fetch_sale(&mut *conn, &input.sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(input.sale_id.clone()))?;
    let item = product::fetch_product(&mut *conn, &input.product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(input.product_id.clone()))?;

    let lines = sale::fetch_lines(&mut *conn, &sold_on.id).await?;
    let sold = sold_quantity(&lines, &item.id)?;
    if sold == 0 {
        return Err(CoreError::ProductNotInSale {
            sale_id: sold_on.id.clone(),
            product_id: item.id.clone(),
        }
        .into());
    }

    let already_returned = returns::returned_quantity(&mut *conn, &sold_on.id, &item.id).await?;
    ReturnAvailability::new(sold, already_returned).check(input.quantity)?;

    let unit_price = pricing.unit_price(&item, &lines);
    let now = Utc::now();
    let record = SaleReturn {
        id: new_id(),
        sale_id: sold_on.id.clone(),
        product_id: item.id.clone(),
        quantity: input.quantity,
        reason: input.reason,
        description: input.description,
        return_amount_cents: return_amount(input.quantity, unit_price)?,
        status: ReturnStatus::Pending,
        user_id: input.user_id,
        returned_at: now,
        updated_at: now,
    };

    returns::insert_return(&mut *conn, &record).await?;

    info!(
        return_id = %record.id,
        sale_id = %record.sale_id,
        product_id = %record.product_id,
        quantity = record.quantity,
        amount = record.return_amount_cents,
        pricing = %pricing,
        "Return recorded"
    );

    Ok(ReturnDetail {
        sale: Some(sold_on.summary()),
        product: item.summary(),
        sale_return: record,
    })
}

/// Moves a pending return to processed and puts its units back in stock.
///
/// Fails for a return whose sale was deleted: the deletion already restored
/// the sold units.
pub async fn process_return(conn: &mut SqliteConnection, return_id: &str) -> AppResult<ReturnDetail> {
    let existing = returns::fetch_return(&mut *conn, return_id)
        .await?
        .ok_or_else(|| CoreError::ReturnNotFound(return_id.to_string()))?;
    ensure_processable(&existing)?;

    if sale::fetch_sale(&mut *conn, &existing.sale_id).await?.is_none() {
        return Err(CoreError::ReturnSaleDeleted {
            return_id: return_id.to_string(),
            sale_id: existing.sale_id.clone(),
        }
        .into());
    }

    let now = Utc::now();
    if !product::increment_stock(&mut *conn, &existing.product_id, existing.quantity, now).await? {
        return Err(CoreError::ProductNotFound(existing.product_id.clone()).into());
    }
    returns::update_status(&mut *conn, return_id, ReturnStatus::Processed, now).await?;

    info!(
        return_id = %return_id,
        product_id = %existing.product_id,
        restocked = existing.quantity,
        "Return processed"
    );

    require_detail(conn, return_id).await
}

/// Sets a return's status.
///
/// Any non-processed return may move between pending, approved and
/// rejected. Asking for `processed` runs [`process_return`], so that status
/// always means the stock was restored. A processed return stays processed.
pub async fn update_return_status(
    conn: &mut SqliteConnection,
    return_id: &str,
    status: ReturnStatus,
) -> AppResult<ReturnDetail> {
    let existing = returns::fetch_return(&mut *conn, return_id)
        .await?
        .ok_or_else(|| CoreError::ReturnNotFound(return_id.to_string()))?;

    if existing.status == ReturnStatus::Processed {
        if status == ReturnStatus::Processed {
            return require_detail(conn, return_id).await;
        }
        return Err(CoreError::ProcessedReturnLocked(return_id.to_string()).into());
    }
    if status == ReturnStatus::Processed {
        return process_return(conn, return_id).await;
    }

    returns::update_status(&mut *conn, return_id, status, Utc::now()).await?;
    info!(return_id = %return_id, from = %existing.status, to = %status, "Return status updated");

    require_detail(conn, return_id).await
}

/// Deletes a return that has not been processed. No stock changes.
pub async fn delete_return(conn: &mut SqliteConnection, return_id: &str) -> AppResult<()> {
    let existing = returns::fetch_return(&mut *conn, return_id)
        .await?
        .ok_or_else(|| CoreError::ReturnNotFound(return_id.to_string()))?;
    ensure_deletable(&existing)?;

    returns::delete_return_row(&mut *conn, return_id).await?;

    info!(return_id = %return_id, status = %existing.status, "Return deleted");
    Ok(())
}

/// Loads a return with its sale and product summaries.
pub async fn fetch_return_detail(
    conn: &mut SqliteConnection,
    return_id: &str,
) -> DbResult<Option<ReturnDetail>> {
    let Some(sale_return) = returns::fetch_return(&mut *conn, return_id).await? else {
        return Ok(None);
    };

    let sold_on = sale::fetch_sale(&mut *conn, &sale_return.sale_id).await?;
    let item = product::fetch_product(&mut *conn, &sale_return.product_id)
        .await?
        .ok_or_else(|| DbError::not_found("Product", &sale_return.product_id))?;

    Ok(Some(ReturnDetail {
        sale: sold_on.map(|s| s.summary()),
        product: item.summary(),
        sale_return,
    }))
}

async fn require_detail(conn: &mut SqliteConnection, return_id: &str) -> AppResult<ReturnDetail> {
    fetch_return_detail(conn, return_id)
        .await?
        .ok_or_else(|| CoreError::ReturnNotFound(return_id.to_string()).into())
}

/// Per product on the sale: sold, already returned and still returnable
/// units, in line order, priced the way `pricing` would refund them.
pub async fn returnable_sale(
    conn: &mut SqliteConnection,
    sale_id: &str,
    pricing: ReturnPricing,
) -> AppResult<ReturnableSale> {
    let detail = sale::fetch_detail(&mut *conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
    let sale_lines: Vec<SaleLine> = detail.lines.iter().map(|e| e.line.clone()).collect();

    let mut lines: Vec<ReturnableLine> = Vec::new();
    for entry in &detail.lines {
        if let Some(existing) = lines.iter_mut().find(|l| l.product_id == entry.line.product_id) {
            existing.sold = existing
                .sold
                .checked_add(entry.line.quantity)
                .ok_or(CoreError::AmountOverflow)?;
            continue;
        }
        lines.push(ReturnableLine {
            product_id: entry.line.product_id.clone(),
            product_name: entry.product.name.clone(),
            sold: entry.line.quantity,
            already_returned: 0,
            available: 0,
            unit_price_cents: pricing.price_for(
                &entry.product.id,
                entry.product.sale_price_cents,
                &sale_lines,
            ),
        });
    }

    for line in &mut lines {
        line.already_returned =
            returns::returned_quantity(&mut *conn, sale_id, &line.product_id).await?;
        line.available = ReturnAvailability::new(line.sold, line.already_returned).available;
    }

    Ok(ReturnableSale {
        sale: detail.sale,
        lines,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::testing::{return_request, Shop};
    use chrono::{Duration, Utc};
    use inventa_core::ledger::{LedgerPolicy, ReturnPricing};
    use inventa_core::report::DateRange;
    use inventa_core::{
        CoreError, ErrorKind, NewSale, NewSaleLine, ProductUpdate, ReturnRequest, ReturnStatus,
        SaleStatus, ValidationError,
    };

    #[tokio::test]
    async fn test_partial_returns_are_bounded_by_sold_quantity() {
        let shop = Shop::open().await;
        let sale = shop.sell(&[(&shop.a.id, 3), (&shop.b.id, 1)]).await;
        let ledger = shop.db.ledger();

        let first = ledger
            .create_return(return_request(&sale.sale.id, &shop.a.id, 2))
            .await
            .unwrap();
        assert_eq!(first.sale_return.status, ReturnStatus::Pending);
        assert_eq!(first.sale_return.return_amount_cents, 2000);
        assert_eq!(first.sale.as_ref().unwrap().id, sale.sale.id);
        // Recording a return does not move stock.
        assert_eq!(shop.stock_of(&shop.a.id).await, 7);

        let err = ledger
            .create_return(return_request(&sale.sale.id, &shop.a.id, 2))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot return 2 units: available 1, already returned 2, sold 3"
        );

        ledger
            .create_return(return_request(&sale.sale.id, &shop.a.id, 1))
            .await
            .unwrap();
        let err = ledger
            .create_return(return_request(&sale.sale.id, &shop.a.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::NothingLeftToReturn { sold: 3 })
        ));
    }

    #[tokio::test]
    async fn test_rejected_returns_still_count_against_availability() {
        let shop = Shop::open().await;
        let sale = shop.sell(&[(&shop.b.id, 2)]).await;
        let ledger = shop.db.ledger();

        let ret = ledger
            .create_return(return_request(&sale.sale.id, &shop.b.id, 2))
            .await
            .unwrap();
        ledger
            .update_return_status(&ret.sale_return.id, ReturnStatus::Rejected)
            .await
            .unwrap();

        let err = ledger
            .create_return(return_request(&sale.sale.id, &shop.b.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NothingLeftToReturn { .. })));
    }

    #[tokio::test]
    async fn test_returnable_quantity_sums_repeated_lines() {
        let shop = Shop::open().await;
        let sale = shop.sell(&[(&shop.a.id, 1), (&shop.b.id, 1), (&shop.a.id, 2)]).await;

        shop.db
            .ledger()
            .create_return(return_request(&sale.sale.id, &shop.a.id, 3))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_return_check_order() {
        let shop = Shop::open().await;
        let sale = shop.sell(&[(&shop.a.id, 1)]).await;
        let ledger = shop.db.ledger();

        let err = ledger
            .create_return(ReturnRequest {
                quantity: Some(1),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::Validation(ValidationError::Required { field })) if field == "user_id"
        ));

        let mut request = return_request(&sale.sale.id, &shop.a.id, 1);
        request.reason = None;
        request.quantity = None;
        let err = ledger.create_return(request).await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: quantity is required");

        let mut request = return_request(&sale.sale.id, &shop.a.id, 0);
        request.reason = None;
        let err = ledger.create_return(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ledger
            .create_return(return_request("missing-sale", "missing-product", 1))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::SaleNotFound(_))));

        let err = ledger
            .create_return(return_request(&sale.sale.id, "missing-product", 1))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::ProductNotFound(_))));

        let err = ledger
            .create_return(return_request(&sale.sale.id, &shop.b.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::ProductNotInSale { .. })));

        assert_eq!(shop.db.returns().count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_return_pricing_policies() {
        for (pricing, expected) in [
            (ReturnPricing::CurrentPrice, 2400),
            (ReturnPricing::SalePrice, 1600),
        ] {
            let shop = Shop::with_policy(LedgerPolicy {
                return_pricing: pricing,
                ..Default::default()
            })
            .await;

            let sale = shop
                .db
                .ledger()
                .create_sale(NewSale::new(
                    "clerk-1",
                    vec![
                        NewSaleLine::new(shop.a.id.clone(), 1).with_price(800),
                        NewSaleLine::new(shop.a.id.clone(), 2).with_price(950),
                    ],
                ))
                .await
                .unwrap();

            shop.db
                .products()
                .update(
                    &shop.a.id,
                    ProductUpdate {
                        sale_price_cents: Some(1200),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();

            let ret = shop
                .db
                .ledger()
                .create_return(return_request(&sale.sale.id, &shop.a.id, 2))
                .await
                .unwrap();
            assert_eq!(ret.sale_return.return_amount_cents, expected, "{pricing}");

            let returnable = shop.db.ledger().returnable_sale(&sale.sale.id).await.unwrap();
            assert_eq!(returnable.lines.len(), 1);
            assert_eq!(returnable.lines[0].sold, 3);
            assert_eq!(returnable.lines[0].unit_price_cents * 2, expected, "{pricing}");
        }
    }

    #[tokio::test]
    async fn test_process_return_restocks_once() {
        let shop = Shop::open().await;
        let sale = shop.sell(&[(&shop.a.id, 3)]).await;
        let ledger = shop.db.ledger();

        let ret = ledger
            .create_return(return_request(&sale.sale.id, &shop.a.id, 2))
            .await
            .unwrap();
        let processed = ledger.process_return(&ret.sale_return.id).await.unwrap();
        assert_eq!(processed.sale_return.status, ReturnStatus::Processed);
        assert_eq!(shop.stock_of(&shop.a.id).await, 9);

        let err = ledger.process_return(&ret.sale_return.id).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only pending returns can be processed (return is processed)"
        );
        assert_eq!(shop.stock_of(&shop.a.id).await, 9);

        let err = ledger.delete_return(&ret.sale_return.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::ProcessedReturnLocked(_))));

        let err = ledger.process_return("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_only_pending_returns_process() {
        let shop = Shop::open().await;
        let sale = shop.sell(&[(&shop.a.id, 2)]).await;
        let ledger = shop.db.ledger();

        let ret = ledger
            .create_return(return_request(&sale.sale.id, &shop.a.id, 1))
            .await
            .unwrap();
        ledger
            .update_return_status(&ret.sale_return.id, ReturnStatus::Approved)
            .await
            .unwrap();

        let err = ledger.process_return(&ret.sale_return.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::ReturnNotPending { .. })));
        assert_eq!(shop.stock_of(&shop.a.id).await, 8);
    }

    #[tokio::test]
    async fn test_update_return_status_rules() {
        let shop = Shop::open().await;
        let sale = shop.sell(&[(&shop.a.id, 2)]).await;
        let ledger = shop.db.ledger();

        let ret = ledger
            .create_return(return_request(&sale.sale.id, &shop.a.id, 2))
            .await
            .unwrap();
        let id = ret.sale_return.id.clone();

        let approved = ledger.update_return_status(&id, ReturnStatus::Approved).await.unwrap();
        assert_eq!(approved.sale_return.status, ReturnStatus::Approved);
        let back = ledger.update_return_status(&id, ReturnStatus::Pending).await.unwrap();
        assert_eq!(back.sale_return.status, ReturnStatus::Pending);
        assert_eq!(shop.stock_of(&shop.a.id).await, 8);

        // Setting processed goes through processing.
        let processed = ledger.update_return_status(&id, ReturnStatus::Processed).await.unwrap();
        assert_eq!(processed.sale_return.status, ReturnStatus::Processed);
        assert_eq!(shop.stock_of(&shop.a.id).await, 10);

        let again = ledger.update_return_status(&id, ReturnStatus::Processed).await.unwrap();
        assert_eq!(again.sale_return.status, ReturnStatus::Processed);
        assert_eq!(shop.stock_of(&shop.a.id).await, 10);

        let err = ledger
            .update_return_status(&id, ReturnStatus::Rejected)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Return {id} has been processed and can no longer be changed")
        );
    }

    #[tokio::test]
    async fn test_delete_pending_return_frees_availability() {
        let shop = Shop::open().await;
        let sale = shop.sell(&[(&shop.b.id, 2)]).await;
        let ledger = shop.db.ledger();

        let ret = ledger
            .create_return(return_request(&sale.sale.id, &shop.b.id, 2))
            .await
            .unwrap();
        ledger.delete_return(&ret.sale_return.id).await.unwrap();
        assert_eq!(shop.stock_of(&shop.b.id).await, 3);

        ledger
            .create_return(return_request(&sale.sale.id, &shop.b.id, 2))
            .await
            .unwrap();

        let err = ledger.return_detail(&ret.sale_return.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_returns_survive_sale_deletion() {
        let shop = Shop::open().await;
        let sale = shop.sell(&[(&shop.a.id, 3)]).await;
        let ledger = shop.db.ledger();

        let ret = ledger
            .create_return(return_request(&sale.sale.id, &shop.a.id, 1))
            .await
            .unwrap();
        ledger.delete_sale(&sale.sale.id).await.unwrap();

        let orphan = ledger.return_detail(&ret.sale_return.id).await.unwrap();
        assert!(orphan.sale.is_none());
        assert_eq!(orphan.sale_return.sale_id, sale.sale.id);
        assert_eq!(orphan.product.id, shop.a.id);
        assert_eq!(shop.stock_of(&shop.a.id).await, 10);

        // The deletion already restocked the sold units.
        let err = ledger.process_return(&ret.sale_return.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::ReturnSaleDeleted { sale_id, .. }) if *sale_id == sale.sale.id
        ));
        let err = ledger
            .update_return_status(&ret.sale_return.id, ReturnStatus::Processed)
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::ReturnSaleDeleted { .. })));
        assert_eq!(shop.stock_of(&shop.a.id).await, 10);

        let rejected = ledger
            .update_return_status(&ret.sale_return.id, ReturnStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(rejected.sale_return.status, ReturnStatus::Rejected);
        ledger.delete_return(&ret.sale_return.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_overlapping_returns_cannot_over_return() {
        let dir = tempfile::tempdir().unwrap();
        let shop = Shop::on_disk(dir.path()).await;
        let sale = shop.sell(&[(&shop.a.id, 3)]).await;
        let ledger = shop.db.ledger();

        let (first, second) = tokio::join!(
            ledger.create_return(return_request(&sale.sale.id, &shop.a.id, 2)),
            ledger.create_return(return_request(&sale.sale.id, &shop.a.id, 2)),
        );
        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );

        let returnable = ledger.returnable_sale(&sale.sale.id).await.unwrap();
        assert_eq!(returnable.lines[0].already_returned, 2);
        assert_eq!(returnable.lines[0].available, 1);

        shop.db.close().await;
    }

    #[tokio::test]
    async fn test_stock_is_conserved_across_operations() {
        let shop = Shop::open().await;
        let ledger = shop.db.ledger();
        let initial = shop.stock_of(&shop.a.id).await;

        let first = shop.sell(&[(&shop.a.id, 4)]).await;
        let second = shop.sell(&[(&shop.a.id, 3), (&shop.b.id, 1)]).await;

        let r1 = ledger
            .create_return(return_request(&first.sale.id, &shop.a.id, 2))
            .await
            .unwrap();
        ledger.process_return(&r1.sale_return.id).await.unwrap();
        ledger
            .create_return(return_request(&second.sale.id, &shop.a.id, 1))
            .await
            .unwrap();
        ledger.delete_sale(&second.sale.id).await.unwrap();

        // initial - sold(live sales) + processed returns
        let sold_live = 4;
        let processed = 2;
        assert_eq!(shop.stock_of(&shop.a.id).await, initial - sold_live + processed);
    }

    #[tokio::test]
    async fn test_returnable_sales() {
        let shop = Shop::open().await;
        let ledger = shop.db.ledger();

        let older = shop.sell(&[(&shop.a.id, 2), (&shop.b.id, 1), (&shop.a.id, 1)]).await;
        let newer = shop.sell(&[(&shop.b.id, 1)]).await;
        let cancelled = shop.sell(&[(&shop.a.id, 1)]).await;
        shop.backdate_sale(&older.sale.id, Utc::now() - Duration::minutes(5))
            .await;
        ledger
            .update_sale_status(&cancelled.sale.id, SaleStatus::Cancelled)
            .await
            .unwrap();

        ledger
            .create_return(return_request(&older.sale.id, &shop.a.id, 1))
            .await
            .unwrap();
        ledger
            .create_return(return_request(&newer.sale.id, &shop.b.id, 1))
            .await
            .unwrap();

        let returnable = ledger.returnable_sale(&older.sale.id).await.unwrap();
        assert_eq!(returnable.lines.len(), 2);
        assert_eq!(returnable.lines[0].product_id, shop.a.id);
        assert_eq!(returnable.lines[0].sold, 3);
        assert_eq!(returnable.lines[0].already_returned, 1);
        assert_eq!(returnable.lines[0].available, 2);
        assert_eq!(returnable.lines[1].available, 1);

        let recent = DateRange::last_days(Utc::now(), 2).unwrap();
        let listed = ledger.returnable_sales(&recent).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|s| s.sale.id.as_str()).collect();
        assert_eq!(ids, vec![older.sale.id.as_str()]);
    }
}
