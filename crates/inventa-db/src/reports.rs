//! # Reports
//!
//! Read-only aggregation over committed ledger state.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQL (this module)                 inventa-core::report (pure)          │
//! │  ─────────────────                 ──────────────────────────           │
//! │  sales      ──► SaleFact[]   ──┐                                        │
//! │  sale_lines ──► LineFact[]   ──┼──► PeriodStatistics / ChartData /      │
//! │  sale_returns ► ReturnFact[] ──┘    StatusBreakdown / ReturnsReport     │
//! │                                                                         │
//! │  Rows are filtered by [start, end) on the stored RFC 3339 timestamps;  │
//! │  grouping by day, product and category happens in Rust.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Revenue figures count completed sales only. [`Reports::sales_by_status`]
//! is the one query that spans every status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use inventa_core::report::{
    by_payment_method, by_status, period_totals, ChartData, DashboardSummary, DateRange, LineFact,
    PeriodStatistics, ReturnFact, ReturnsReport, SaleFact, StatusBreakdown, StatusFilter,
};
use inventa_core::Product;

use crate::error::AppResult;
use crate::repository::{
    CategoryRepository, ProductRepository, ReturnRepository, SupplierRepository,
};

/// Products shown on the charts' best-seller series.
pub const CHART_TOP_PRODUCTS: usize = 5;

/// Tunables for the aggregation queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Length of the top-products list in period statistics.
    #[serde(default = "default_top_products")]
    pub top_products: usize,

    /// Days covered by the charts.
    #[serde(default = "default_chart_days")]
    pub chart_days: u32,
}

fn default_top_products() -> usize {
    10
}

fn default_chart_days() -> u32 {
    30
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            top_products: default_top_products(),
            chart_days: default_chart_days(),
        }
    }
}

/// Aggregation queries.
#[derive(Debug, Clone)]
pub struct Reports {
    pool: SqlitePool,
    settings: ReportSettings,
}

impl Reports {
    pub fn new(pool: SqlitePool, settings: ReportSettings) -> Self {
        Reports { pool, settings }
    }

    pub fn settings(&self) -> ReportSettings {
        self.settings
    }

    /// Headline numbers for the day containing `now`.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> AppResult<DashboardSummary> {
        let today = DateRange::day(now.date_naive())?;
        let sales = self.sale_facts(Some(&today)).await?;

        let products = ProductRepository::new(self.pool.clone());
        Ok(DashboardSummary {
            date: today.first_day(),
            sales_today: period_totals(&sales, StatusFilter::CompletedOnly),
            sales_by_payment_method: by_payment_method(&sales, StatusFilter::CompletedOnly),
            low_stock_products: products.count_low_stock().await?,
            pending_returns: ReturnRepository::new(self.pool.clone()).count_pending().await?,
            active_products: products.count_active().await?,
            active_categories: CategoryRepository::new(self.pool.clone()).count_active().await?,
            active_suppliers: SupplierRepository::new(self.pool.clone()).count_active().await?,
        })
    }

    /// Revenue, best sellers, category split and daily series for a range.
    pub async fn period_statistics(&self, range: &DateRange) -> AppResult<PeriodStatistics> {
        let sales = self.sale_facts(Some(range)).await?;
        let lines = self.line_facts(range).await?;
        Ok(PeriodStatistics::build(
            *range,
            &sales,
            &lines,
            self.settings.top_products,
        ))
    }

    /// Chart series for the last `chart_days` days up to `now`.
    pub async fn charts(&self, now: DateTime<Utc>) -> AppResult<ChartData> {
        let range = DateRange::last_days(now, self.settings.chart_days)?;
        let sales = self.sale_facts(Some(&range)).await?;
        let lines = self.line_facts(&range).await?;
        Ok(ChartData::build(range, &sales, &lines, CHART_TOP_PRODUCTS))
    }

    /// Count and total per status, over every status. Without a range,
    /// covers all sales.
    pub async fn sales_by_status(&self, range: Option<&DateRange>) -> AppResult<StatusBreakdown> {
        let sales = self.sale_facts(range).await?;
        Ok(by_status(&sales))
    }

    /// Returns recorded in `range`, newest first, with a summary.
    pub async fn returns_report(&self, range: &DateRange) -> AppResult<ReturnsReport> {
        let returns = sqlx::query_as::<_, ReturnFact>(
            r#"
            SELECT
                r.id AS return_id,
                r.sale_id,
                r.product_id,
                p.name AS product_name,
                r.quantity,
                r.reason,
                r.return_amount_cents,
                r.status,
                r.returned_at
            FROM sale_returns r
            INNER JOIN products p ON p.id = r.product_id
            WHERE r.returned_at >= ?1 AND r.returned_at < ?2
            ORDER BY r.returned_at DESC, r.id
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = returns.len(), "Loaded returns for report");
        Ok(ReturnsReport::build(*range, returns))
    }

    /// Active products at or below their minimum stock.
    pub async fn low_stock(&self) -> AppResult<Vec<Product>> {
        Ok(ProductRepository::new(self.pool.clone()).low_stock().await?)
    }

    // ===== Row fetches =====

    async fn sale_facts(&self, range: Option<&DateRange>) -> AppResult<Vec<SaleFact>> {
        const SELECT_FACTS: &str = r#"
            SELECT id AS sale_id, sold_at, status, payment_method, total_cents
            FROM sales
        "#;

        let facts = match range {
            Some(range) => {
                sqlx::query_as::<_, SaleFact>(&format!(
                    "{SELECT_FACTS} WHERE sold_at >= ?1 AND sold_at < ?2 ORDER BY sold_at"
                ))
                .bind(range.start)
                .bind(range.end)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SaleFact>(&format!("{SELECT_FACTS} ORDER BY sold_at"))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(count = facts.len(), "Loaded sales for aggregation");
        Ok(facts)
    }

    async fn line_facts(&self, range: &DateRange) -> AppResult<Vec<LineFact>> {
        let facts = sqlx::query_as::<_, LineFact>(
            r#"
            SELECT
                l.sale_id,
                s.sold_at,
                s.status,
                l.product_id,
                p.name AS product_name,
                c.id AS category_id,
                c.name AS category_name,
                l.quantity,
                l.subtotal_cents
            FROM sale_lines l
            INNER JOIN sales s ON s.id = l.sale_id
            INNER JOIN products p ON p.id = l.product_id
            INNER JOIN categories c ON c.id = p.category_id
            WHERE s.sold_at >= ?1 AND s.sold_at < ?2
            ORDER BY s.sold_at, l.position
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = facts.len(), "Loaded sale lines for aggregation");
        Ok(facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{product, return_request, Shop, CLERK};
    use chrono::{Duration, NaiveDate, TimeZone};
    use inventa_core::{NewCategory, NewSale, NewSaleLine, PaymentMethod, SaleStatus};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ReportSettings::default();
        assert_eq!(settings.top_products, 10);
        assert_eq!(settings.chart_days, 30);

        let parsed: ReportSettings = toml::from_str("chart_days = 7").unwrap();
        assert_eq!(parsed.chart_days, 7);
        assert_eq!(parsed.top_products, 10);
    }

    #[tokio::test]
    async fn test_dashboard_counts_completed_sales_today() {
        let shop = Shop::open().await;

        let cash = shop.sell(&[(&shop.a.id, 3), (&shop.b.id, 1)]).await;
        let mut card = NewSale::new(CLERK, vec![NewSaleLine::new(shop.a.id.clone(), 1)]);
        card.payment_method = PaymentMethod::Card;
        shop.db.ledger().create_sale(card).await.unwrap();
        let cancelled = shop.sell(&[(&shop.a.id, 1)]).await;
        shop.db
            .ledger()
            .update_sale_status(&cancelled.sale.id, SaleStatus::Cancelled)
            .await
            .unwrap();
        shop.db
            .ledger()
            .create_return(return_request(&cash.sale.id, &shop.b.id, 1))
            .await
            .unwrap();

        let summary = shop.db.reports().dashboard(Utc::now()).await.unwrap();

        assert_eq!(summary.sales_today.revenue_cents, 4500);
        assert_eq!(summary.sales_today.sale_count, 2);
        assert_eq!(summary.sales_today.average_ticket_cents, 2250);
        assert_eq!(summary.sales_by_payment_method.len(), 2);
        assert_eq!(summary.sales_by_payment_method[0].payment_method, PaymentMethod::Cash);
        assert_eq!(summary.sales_by_payment_method[0].revenue_cents, 3500);
        assert_eq!(summary.sales_by_payment_method[1].payment_method, PaymentMethod::Card);
        assert_eq!(summary.pending_returns, 1);
        // A: 10 - 5 = 5, B: 5 - 1 = 4; both at or under the default minimum.
        assert_eq!(summary.low_stock_products, 2);
        assert_eq!(summary.active_products, 2);
        assert_eq!(summary.active_categories, 1);
        assert_eq!(summary.active_suppliers, 0);
    }

    #[tokio::test]
    async fn test_period_statistics() {
        let shop = Shop::open().await;
        let drinks = shop
            .db
            .categories()
            .create(NewCategory {
                name: "Drinks".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let c = shop
            .db
            .products()
            .create(product(&drinks.id, "Product C", 300, 20))
            .await
            .unwrap();

        let s1 = shop.sell(&[(&shop.a.id, 2)]).await;
        let s2 = shop.sell(&[(&shop.b.id, 1), (&c.id, 1)]).await;
        let s3 = shop.sell(&[(&shop.a.id, 1)]).await;
        let s4 = shop.sell(&[(&shop.b.id, 2)]).await;
        shop.backdate_sale(&s1.sale.id, at(2024, 3, 1, 10, 0)).await;
        shop.backdate_sale(&s2.sale.id, at(2024, 3, 2, 15, 30)).await;
        shop.backdate_sale(&s3.sale.id, at(2024, 3, 2, 18, 0)).await;
        shop.backdate_sale(&s4.sale.id, at(2024, 2, 28, 12, 0)).await;
        shop.db
            .ledger()
            .update_sale_status(&s3.sale.id, SaleStatus::Cancelled)
            .await
            .unwrap();

        let range = DateRange::parse("2024-03-01", "2024-03-02").unwrap();
        let stats = shop.db.reports().period_statistics(&range).await.unwrap();

        assert_eq!(stats.totals.revenue_cents, 2800);
        assert_eq!(stats.totals.sale_count, 2);
        assert_eq!(stats.totals.average_ticket_cents, 1400);

        let names: Vec<&str> = stats.top_products.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(names, vec!["Product A", "Product B", "Product C"]);
        assert_eq!(stats.top_products[0].units, 2);

        assert_eq!(stats.by_category.len(), 2);
        assert_eq!(stats.by_category[0].category_name, "General");
        assert_eq!(stats.by_category[0].revenue_cents, 2500);
        assert_eq!(stats.by_category[0].units, 3);
        assert_eq!(stats.by_category[0].share_percent, 89.29);
        assert_eq!(stats.by_category[1].share_percent, 10.71);

        assert_eq!(stats.by_day.len(), 2);
        assert_eq!(stats.by_day[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(stats.by_day[0].revenue_cents, 2000);
        assert_eq!(stats.by_day[1].revenue_cents, 800);

        // Every status is counted here.
        let breakdown = shop.db.reports().sales_by_status(Some(&range)).await.unwrap();
        assert_eq!(breakdown.sale_count, 3);
        assert_eq!(breakdown.total_cents, 3800);
        assert_eq!(breakdown.by_status.len(), 2);
        assert_eq!(breakdown.by_status[0].status, SaleStatus::Completed);
        assert_eq!(breakdown.by_status[1].status, SaleStatus::Cancelled);
        assert_eq!(breakdown.by_status[1].total_cents, 1000);

        let everything = shop.db.reports().sales_by_status(None).await.unwrap();
        assert_eq!(everything.sale_count, 4);
        assert_eq!(everything.total_cents, 4800);
    }

    #[tokio::test]
    async fn test_period_bounds_include_whole_end_day() {
        let shop = Shop::open().await;
        let late = shop.sell(&[(&shop.a.id, 1)]).await;
        let next = shop.sell(&[(&shop.a.id, 1)]).await;
        shop.backdate_sale(&late.sale.id, at(2024, 3, 31, 23, 59)).await;
        shop.backdate_sale(&next.sale.id, at(2024, 4, 1, 0, 0)).await;

        let march = DateRange::parse("2024-03-01", "2024-03-31").unwrap();
        let stats = shop.db.reports().period_statistics(&march).await.unwrap();
        assert_eq!(stats.totals.sale_count, 1);
    }

    #[tokio::test]
    async fn test_charts_fill_missing_days() {
        let shop = Shop::open().await;
        let reports = Reports::new(
            shop.db.pool().clone(),
            ReportSettings {
                top_products: 10,
                chart_days: 7,
            },
        );
        let now = Utc::now();

        shop.sell(&[(&shop.a.id, 1)]).await;
        let earlier = shop.sell(&[(&shop.b.id, 2)]).await;
        let too_old = shop.sell(&[(&shop.b.id, 1)]).await;
        shop.backdate_sale(&earlier.sale.id, now - Duration::days(3)).await;
        shop.backdate_sale(&too_old.sale.id, now - Duration::days(10)).await;

        let charts = reports.charts(now).await.unwrap();

        assert_eq!(charts.by_day.len(), 7);
        assert_eq!(charts.by_day[0].date, (now - Duration::days(6)).date_naive());
        assert_eq!(charts.by_day[3].date, (now - Duration::days(3)).date_naive());
        assert_eq!(charts.by_day[3].sale_count, 1);
        assert_eq!(charts.by_day[3].revenue_cents, 1000);
        assert_eq!(charts.by_day.iter().map(|d| d.sale_count).sum::<i64>(), 2);
        assert_eq!(charts.top_products.len(), 2);
    }

    #[tokio::test]
    async fn test_returns_report() {
        let shop = Shop::open().await;
        let sale = shop.sell(&[(&shop.a.id, 3), (&shop.b.id, 2)]).await;
        let ledger = shop.db.ledger();

        let first = ledger
            .create_return(return_request(&sale.sale.id, &shop.a.id, 2))
            .await
            .unwrap();
        ledger
            .create_return(return_request(&sale.sale.id, &shop.b.id, 1))
            .await
            .unwrap();
        ledger.process_return(&first.sale_return.id).await.unwrap();

        let range = DateRange::last_days(Utc::now(), 2).unwrap();
        let report = shop.db.reports().returns_report(&range).await.unwrap();

        assert_eq!(report.summary.return_count, 2);
        assert_eq!(report.summary.total_amount_cents, 2500);
        assert_eq!(report.summary.processed, 1);
        assert_eq!(report.summary.pending, 1);
        assert!(report.returns.iter().any(|r| r.product_name == "Product A"));

        let old = DateRange::parse("2020-01-01", "2020-01-31").unwrap();
        let empty = shop.db.reports().returns_report(&old).await.unwrap();
        assert_eq!(empty.summary.return_count, 0);
    }

    #[tokio::test]
    async fn test_low_stock_report() {
        let shop = Shop::open().await;
        let low = shop.db.reports().low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, shop.b.id);

        shop.sell(&[(&shop.a.id, 6)]).await;
        let low = shop.db.reports().low_stock().await.unwrap();
        assert_eq!(low.len(), 2);
        assert_eq!(low[0].id, shop.a.id);
    }
}
