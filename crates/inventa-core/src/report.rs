//! # Report Projections
//!
//! Pure grouping and summing over rows the database layer has already
//! fetched. Every function here is deterministic given its input slice.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  inventa-db::reports                                                    │
//! │    SELECT ... WHERE sold_at >= range.start AND sold_at < range.end      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<SaleFact>, Vec<LineFact>, Vec<ReturnFact>                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  THIS MODULE                                                            │
//! │    period_totals · top_products · revenue_by_category                   │
//! │    daily_series · by_payment_method · by_status · returns_summary       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PeriodStatistics / ChartData / DashboardSummary / ReturnsReport        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Revenue counts completed sales only unless [`StatusFilter::AllStatuses`]
//! is passed explicitly.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, ReturnReason, ReturnStatus, SaleStatus};

// =============================================================================
// Date Range
// =============================================================================

/// A half-open UTC interval `[start, end)` covering whole days.
///
/// Built from calendar dates so that the end day is always included:
/// `2024-03-01 .. 2024-03-31` spans up to, not including, `2024-04-01 00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Range covering `from` through `to`, both inclusive.
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> CoreResult<Self> {
        if to < from {
            return Err(ValidationError::InvalidFormat {
                field: "date_range".to_string(),
                reason: format!("end date {} is before start date {}", to, from),
            }
            .into());
        }

        let after_end = to.succ_opt().ok_or_else(|| ValidationError::InvalidFormat {
            field: "date_range".to_string(),
            reason: "end date out of range".to_string(),
        })?;

        Ok(DateRange {
            start: start_of_day(from),
            end: start_of_day(after_end),
        })
    }

    /// Parses ISO-8601 dates (`2024-03-01`) or timestamps (only the date
    /// part of a timestamp is used).
    ///
    /// ## Example
    /// ```rust
    /// use inventa_core::report::DateRange;
    ///
    /// let range = DateRange::parse("2024-03-01", "2024-03-01").unwrap();
    /// assert_eq!(range.end.to_rfc3339(), "2024-03-02T00:00:00+00:00");
    /// ```
    pub fn parse(from: &str, to: &str) -> CoreResult<Self> {
        Self::from_dates(parse_day("from", from)?, parse_day("to", to)?)
    }

    /// A single calendar day.
    pub fn day(date: NaiveDate) -> CoreResult<Self> {
        Self::from_dates(date, date)
    }

    /// The last `days` calendar days up to and including `now`'s day.
    pub fn last_days(now: DateTime<Utc>, days: u32) -> CoreResult<Self> {
        let today = now.date_naive();
        let span = i64::from(days.max(1)) - 1;
        let from = today
            .checked_sub_signed(Duration::days(span))
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "days".to_string(),
                reason: "range out of bounds".to_string(),
            })?;
        Self::from_dates(from, today)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn last_day(&self) -> NaiveDate {
        (self.end - Duration::days(1)).date_naive()
    }

    /// Every calendar day in the range, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.first_day()
            .iter_days()
            .take_while(|d| *d <= self.last_day())
            .collect()
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn parse_day(field: &str, input: &str) -> CoreResult<NaiveDate> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }
    Err(ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("'{}' is not an ISO-8601 date", input),
    }
    .into())
}

/// Which sale statuses a revenue figure includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    CompletedOnly,
    AllStatuses,
}

impl StatusFilter {
    pub fn includes(&self, status: SaleStatus) -> bool {
        match self {
            StatusFilter::CompletedOnly => status == SaleStatus::Completed,
            StatusFilter::AllStatuses => true,
        }
    }
}

// =============================================================================
// Input Rows
// =============================================================================

/// One sale, reduced to what aggregations need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleFact {
    pub sale_id: String,
    pub sold_at: DateTime<Utc>,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
}

/// One sale line joined with its product, category and sale header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineFact {
    pub sale_id: String,
    pub sold_at: DateTime<Utc>,
    pub status: SaleStatus,
    pub product_id: String,
    pub product_name: String,
    pub category_id: String,
    pub category_name: String,
    pub quantity: i64,
    pub subtotal_cents: i64,
}

/// One return joined with its product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReturnFact {
    pub return_id: String,
    pub sale_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub reason: ReturnReason,
    pub return_amount_cents: i64,
    pub status: ReturnStatus,
    #[ts(as = "String")]
    pub returned_at: DateTime<Utc>,
}

// =============================================================================
// Output Rows
// =============================================================================

/// Revenue, count and average ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodTotals {
    pub revenue_cents: i64,
    pub sale_count: i64,
    pub average_ticket_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    pub product_name: String,
    pub category_name: String,
    pub units: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategorySales {
    pub category_id: String,
    pub category_name: String,
    pub units: i64,
    pub revenue_cents: i64,
    /// Share of the period's revenue, 0-100 with two decimals.
    pub share_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySales {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub sale_count: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentMethodSales {
    pub payment_method: PaymentMethod,
    pub sale_count: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusSales {
    pub status: SaleStatus,
    pub sale_count: i64,
    pub total_cents: i64,
}

/// Sales grouped by status, with overall figures across every status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusBreakdown {
    pub by_status: Vec<StatusSales>,
    pub sale_count: i64,
    pub total_cents: i64,
    pub average_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnsSummary {
    pub return_count: i64,
    pub total_amount_cents: i64,
    pub processed: i64,
    pub pending: i64,
}

// =============================================================================
// Projections
// =============================================================================

/// Sums revenue over sales passing `filter`.
pub fn period_totals(sales: &[SaleFact], filter: StatusFilter) -> PeriodTotals {
    let (revenue, count) = sales
        .iter()
        .filter(|s| filter.includes(s.status))
        .fold((Money::zero(), 0i64), |(sum, n), s| {
            (sum + Money::from_cents(s.total_cents), n + 1)
        });

    PeriodTotals {
        revenue_cents: revenue.cents(),
        sale_count: count,
        average_ticket_cents: revenue.average_over(count).cents(),
    }
}

/// Best sellers by units, ties broken by revenue then name.
pub fn top_products(lines: &[LineFact], filter: StatusFilter, limit: usize) -> Vec<ProductSales> {
    let mut grouped: BTreeMap<&str, ProductSales> = BTreeMap::new();

    for line in lines.iter().filter(|l| filter.includes(l.status)) {
        let entry = grouped
            .entry(line.product_id.as_str())
            .or_insert_with(|| ProductSales {
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                category_name: line.category_name.clone(),
                units: 0,
                revenue_cents: 0,
            });
        entry.units += line.quantity;
        entry.revenue_cents += line.subtotal_cents;
    }

    let mut ranked: Vec<ProductSales> = grouped.into_values().collect();
    ranked.sort_by(|a, b| {
        b.units
            .cmp(&a.units)
            .then(b.revenue_cents.cmp(&a.revenue_cents))
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked.truncate(limit);
    ranked
}

/// Revenue per category, largest first.
pub fn revenue_by_category(lines: &[LineFact], filter: StatusFilter) -> Vec<CategorySales> {
    let mut grouped: BTreeMap<&str, CategorySales> = BTreeMap::new();
    let mut period_revenue = 0i64;

    for line in lines.iter().filter(|l| filter.includes(l.status)) {
        let entry = grouped
            .entry(line.category_id.as_str())
            .or_insert_with(|| CategorySales {
                category_id: line.category_id.clone(),
                category_name: line.category_name.clone(),
                units: 0,
                revenue_cents: 0,
                share_percent: 0.0,
            });
        entry.units += line.quantity;
        entry.revenue_cents += line.subtotal_cents;
        period_revenue += line.subtotal_cents;
    }

    let mut rows: Vec<CategorySales> = grouped
        .into_values()
        .map(|mut row| {
            row.share_percent = percent(row.revenue_cents, period_revenue);
            row
        })
        .collect();
    rows.sort_by(|a, b| {
        b.revenue_cents
            .cmp(&a.revenue_cents)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });
    rows
}

/// Per-day counts and revenue, ascending by date.
///
/// With a `range`, days without sales appear with zeros.
pub fn daily_series(
    sales: &[SaleFact],
    filter: StatusFilter,
    range: Option<&DateRange>,
) -> Vec<DailySales> {
    let mut grouped: BTreeMap<NaiveDate, DailySales> = BTreeMap::new();

    if let Some(range) = range {
        for date in range.days() {
            grouped.insert(date, DailySales { date, sale_count: 0, revenue_cents: 0 });
        }
    }

    for sale in sales.iter().filter(|s| filter.includes(s.status)) {
        let date = sale.sold_at.date_naive();
        let entry = grouped
            .entry(date)
            .or_insert(DailySales { date, sale_count: 0, revenue_cents: 0 });
        entry.sale_count += 1;
        entry.revenue_cents += sale.total_cents;
    }

    grouped.into_values().collect()
}

/// Counts and revenue per payment method, in [`PaymentMethod::ALL`] order.
/// Methods without sales are omitted.
pub fn by_payment_method(sales: &[SaleFact], filter: StatusFilter) -> Vec<PaymentMethodSales> {
    PaymentMethod::ALL
        .into_iter()
        .filter_map(|method| {
            let (count, revenue) = sales
                .iter()
                .filter(|s| s.payment_method == method && filter.includes(s.status))
                .fold((0i64, 0i64), |(n, sum), s| (n + 1, sum + s.total_cents));
            (count > 0).then_some(PaymentMethodSales {
                payment_method: method,
                sale_count: count,
                revenue_cents: revenue,
            })
        })
        .collect()
}

/// Sales grouped by status, across every status.
pub fn by_status(sales: &[SaleFact]) -> StatusBreakdown {
    let by_status: Vec<StatusSales> = SaleStatus::ALL
        .into_iter()
        .filter_map(|status| {
            let (count, total) = sales
                .iter()
                .filter(|s| s.status == status)
                .fold((0i64, 0i64), |(n, sum), s| (n + 1, sum + s.total_cents));
            (count > 0).then_some(StatusSales {
                status,
                sale_count: count,
                total_cents: total,
            })
        })
        .collect();

    let overall = period_totals(sales, StatusFilter::AllStatuses);
    StatusBreakdown {
        by_status,
        sale_count: overall.sale_count,
        total_cents: overall.revenue_cents,
        average_cents: overall.average_ticket_cents,
    }
}

/// Count, amount and status split of a set of returns.
pub fn returns_summary(returns: &[ReturnFact]) -> ReturnsSummary {
    returns.iter().fold(ReturnsSummary::default(), |mut acc, r| {
        acc.return_count += 1;
        acc.total_amount_cents += r.return_amount_cents;
        match r.status {
            ReturnStatus::Processed => acc.processed += 1,
            ReturnStatus::Pending => acc.pending += 1,
            ReturnStatus::Approved | ReturnStatus::Rejected => {}
        }
        acc
    })
}

/// `part / whole` as a percentage rounded to two decimals.
pub fn percent(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 10_000.0).round() / 100.0
}

// =============================================================================
// Report Bundles
// =============================================================================

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub sales_today: PeriodTotals,
    pub sales_by_payment_method: Vec<PaymentMethodSales>,
    pub low_stock_products: i64,
    pub pending_returns: i64,
    pub active_products: i64,
    pub active_categories: i64,
    pub active_suppliers: i64,
}

/// Statistics over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodStatistics {
    pub range: DateRange,
    pub totals: PeriodTotals,
    pub top_products: Vec<ProductSales>,
    pub by_category: Vec<CategorySales>,
    pub by_day: Vec<DailySales>,
}

impl PeriodStatistics {
    pub fn build(range: DateRange, sales: &[SaleFact], lines: &[LineFact], top_n: usize) -> Self {
        let filter = StatusFilter::CompletedOnly;
        PeriodStatistics {
            range,
            totals: period_totals(sales, filter),
            top_products: top_products(lines, filter, top_n),
            by_category: revenue_by_category(lines, filter),
            by_day: daily_series(sales, filter, None),
        }
    }
}

/// Series backing the dashboard charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChartData {
    pub range: DateRange,
    pub by_day: Vec<DailySales>,
    pub by_payment_method: Vec<PaymentMethodSales>,
    pub top_products: Vec<ProductSales>,
}

impl ChartData {
    pub fn build(range: DateRange, sales: &[SaleFact], lines: &[LineFact], top_n: usize) -> Self {
        let filter = StatusFilter::CompletedOnly;
        ChartData {
            range,
            by_day: daily_series(sales, filter, Some(&range)),
            by_payment_method: by_payment_method(sales, filter),
            top_products: top_products(lines, filter, top_n),
        }
    }
}

/// Returns recorded in a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnsReport {
    pub range: DateRange,
    pub summary: ReturnsSummary,
    pub returns: Vec<ReturnFact>,
}

impl ReturnsReport {
    pub fn build(range: DateRange, returns: Vec<ReturnFact>) -> Self {
        ReturnsReport {
            range,
            summary: returns_summary(&returns),
            returns,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, hour: u32) -> DateTime<Utc> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        Utc.from_utc_datetime(&day.and_hms_opt(hour, 30, 0).unwrap())
    }

    fn sale(id: &str, date: &str, status: SaleStatus, method: PaymentMethod, total: i64) -> SaleFact {
        SaleFact {
            sale_id: id.to_string(),
            sold_at: at(date, 10),
            status,
            payment_method: method,
            total_cents: total,
        }
    }

    fn line_fact(product: &str, category: &str, status: SaleStatus, qty: i64, subtotal: i64) -> LineFact {
        LineFact {
            sale_id: "s".to_string(),
            sold_at: at("2024-03-01", 10),
            status,
            product_id: product.to_string(),
            product_name: format!("Product {}", product),
            category_id: category.to_string(),
            category_name: format!("Category {}", category),
            quantity: qty,
            subtotal_cents: subtotal,
        }
    }

    #[test]
    fn test_date_range_includes_whole_end_day() {
        let range = DateRange::parse("2024-03-01", "2024-03-02").unwrap();
        assert!(range.contains(at("2024-03-01", 0)));
        assert!(range.contains(at("2024-03-02", 23)));
        assert!(!range.contains(at("2024-03-03", 0)));
        assert_eq!(range.days().len(), 2);
        assert_eq!(range.last_day().to_string(), "2024-03-02");
    }

    #[test]
    fn test_date_range_rejects_inverted_and_garbage() {
        assert!(DateRange::parse("2024-03-02", "2024-03-01").is_err());
        assert!(DateRange::parse("yesterday", "2024-03-01").is_err());
        assert!(DateRange::parse("2024-03-01T15:00:00Z", "2024-03-01").is_ok());
    }

    #[test]
    fn test_last_days() {
        let range = DateRange::last_days(at("2024-03-30", 18), 30).unwrap();
        assert_eq!(range.first_day().to_string(), "2024-03-01");
        assert_eq!(range.last_day().to_string(), "2024-03-30");
        assert_eq!(range.days().len(), 30);
    }

    #[test]
    fn test_period_totals_counts_completed_only() {
        let sales = vec![
            sale("1", "2024-03-01", SaleStatus::Completed, PaymentMethod::Cash, 3500),
            sale("2", "2024-03-01", SaleStatus::Cancelled, PaymentMethod::Cash, 9900),
            sale("3", "2024-03-02", SaleStatus::Completed, PaymentMethod::Card, 1000),
        ];

        let totals = period_totals(&sales, StatusFilter::CompletedOnly);
        assert_eq!(totals.revenue_cents, 4500);
        assert_eq!(totals.sale_count, 2);
        assert_eq!(totals.average_ticket_cents, 2250);

        let all = period_totals(&sales, StatusFilter::AllStatuses);
        assert_eq!(all.revenue_cents, 14400);
    }

    #[test]
    fn test_top_products_ranking() {
        let lines = vec![
            line_fact("a", "x", SaleStatus::Completed, 3, 3000),
            line_fact("b", "x", SaleStatus::Completed, 5, 500),
            line_fact("a", "x", SaleStatus::Completed, 3, 3000),
            line_fact("c", "y", SaleStatus::Cancelled, 50, 5000),
        ];

        let top = top_products(&lines, StatusFilter::CompletedOnly, 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_id, "a");
        assert_eq!(top[0].units, 6);
        assert_eq!(top[1].product_id, "b");

        assert_eq!(top_products(&lines, StatusFilter::CompletedOnly, 1).len(), 1);
    }

    #[test]
    fn test_revenue_by_category_shares() {
        let lines = vec![
            line_fact("a", "x", SaleStatus::Completed, 1, 750),
            line_fact("b", "y", SaleStatus::Completed, 1, 250),
        ];

        let rows = revenue_by_category(&lines, StatusFilter::CompletedOnly);
        assert_eq!(rows[0].category_id, "x");
        assert_eq!(rows[0].share_percent, 75.0);
        assert_eq!(rows[1].share_percent, 25.0);
    }

    #[test]
    fn test_daily_series_fills_gaps() {
        let sales = vec![
            sale("1", "2024-03-03", SaleStatus::Completed, PaymentMethod::Cash, 100),
            sale("2", "2024-03-01", SaleStatus::Completed, PaymentMethod::Cash, 200),
            sale("3", "2024-03-01", SaleStatus::Completed, PaymentMethod::Card, 300),
        ];

        let sparse = daily_series(&sales, StatusFilter::CompletedOnly, None);
        assert_eq!(sparse.len(), 2);
        assert_eq!(sparse[0].revenue_cents, 500);

        let range = DateRange::parse("2024-03-01", "2024-03-03").unwrap();
        let filled = daily_series(&sales, StatusFilter::CompletedOnly, Some(&range));
        assert_eq!(filled.len(), 3);
        assert_eq!(filled[1].sale_count, 0);
    }

    #[test]
    fn test_by_payment_method_and_status() {
        let sales = vec![
            sale("1", "2024-03-01", SaleStatus::Completed, PaymentMethod::Card, 1000),
            sale("2", "2024-03-01", SaleStatus::Completed, PaymentMethod::Cash, 500),
            sale("3", "2024-03-01", SaleStatus::Pending, PaymentMethod::Cash, 700),
        ];

        let methods = by_payment_method(&sales, StatusFilter::CompletedOnly);
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].payment_method, PaymentMethod::Cash);
        assert_eq!(methods[0].revenue_cents, 500);

        let breakdown = by_status(&sales);
        assert_eq!(breakdown.by_status.len(), 2);
        assert_eq!(breakdown.sale_count, 3);
        assert_eq!(breakdown.total_cents, 2200);
        assert_eq!(breakdown.average_cents, 733);
    }

    #[test]
    fn test_returns_summary() {
        let fact = |status| ReturnFact {
            return_id: "r".into(),
            sale_id: "s".into(),
            product_id: "p".into(),
            product_name: "P".into(),
            quantity: 1,
            reason: ReturnReason::Other,
            return_amount_cents: 250,
            status,
            returned_at: at("2024-03-01", 9),
        };
        let summary = returns_summary(&[
            fact(ReturnStatus::Pending),
            fact(ReturnStatus::Processed),
            fact(ReturnStatus::Rejected),
        ]);
        assert_eq!(summary.return_count, 3);
        assert_eq!(summary.total_amount_cents, 750);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.pending, 1);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), 33.33);
        assert_eq!(percent(0, 0), 0.0);
    }
}
