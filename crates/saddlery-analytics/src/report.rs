//! Response shapes and the pure assembly step that turns query rows into them.
//!
//! The aggregator gathers rows into [`DashboardData`] / [`ExportData`]; nothing
//! in this module touches the database, so every derived figure is testable
//! from fixtures.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use saddlery_core::{OrderStatus, PaymentStatus};
use saddlery_db::{
    CustomerTotalsRow, MonthlyCountRow, MonthlyRevenueRow, OrderAggregateRow, OrderSummaryRow,
    ProductMetaRow, ProductSalesRow, ProductWithCountsRow, StatusCountRow,
};
use serde::Serialize;

use crate::activity::{activity_feed, ActivityEntry, RECENT_ACTIVITY_LIMIT};
use crate::comparison::{percentage_of, ComparisonResult};
use crate::period::{Period, PeriodWindows};
use crate::ranking::{rank_top_products, RankedProduct};

/// Revenue, order count, new customers and average order value for one period.
///
/// Revenue and average only include paid orders; the order count includes all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub revenue: Decimal,
    pub order_count: i64,
    pub customer_count: i64,
    pub average_order_value: Decimal,
}

impl MetricSnapshot {
    #[must_use]
    pub fn new(paid: &OrderAggregateRow, order_count: i64, customer_count: i64) -> Self {
        Self {
            revenue: paid.revenue,
            order_count,
            customer_count,
            average_order_value: paid.average_order_value,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Headline figures for the current period.
///
/// `total_customers` counts customers registered inside the period, and
/// `total_products` is the number of currently active products regardless of
/// period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub total_customers: i64,
    pub total_products: i64,
    pub average_order_value: Decimal,
    pub conversion_rate: Decimal,
    pub revenue_change: i64,
    pub orders_change: i64,
    pub customers_change: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparisons {
    pub revenue: ComparisonResult,
    pub orders: ComparisonResult,
    pub customers: ComparisonResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusShare {
    pub status: OrderStatus,
    pub count: i64,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Decimal,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCustomers {
    pub month: String,
    pub customers: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPerformance {
    pub product_id: i64,
    pub name: String,
    pub units_sold: i64,
    pub revenue: Decimal,
    pub favorites: i64,
    pub reviews: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub overview: Overview,
    pub comparisons: Comparisons,
    pub top_products: Vec<RankedProduct>,
    pub recent_activity: Vec<ActivityEntry>,
    pub order_status_distribution: Vec<StatusShare>,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub customer_growth: Vec<MonthlyCustomers>,
    pub product_performance: Vec<ProductPerformance>,
    pub period: Period,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: i64,
    pub order_number: String,
    pub customer_name: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&OrderSummaryRow> for RecentOrder {
    fn from(row: &OrderSummaryRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number.clone(),
            customer_name: row.customer_name.clone(),
            total_amount: row.total_amount,
            status: row.status,
            payment_status: row.payment_status,
            created_at: row.created_at,
        }
    }
}

/// Top-level figures read by the dashboard home widgets.
///
/// `all_time_customers` is the registered-customer total; `total_customers`
/// keeps the in-period meaning used by [`Overview`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardProjection {
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub total_products: i64,
    pub total_customers: i64,
    pub all_time_customers: i64,
    pub recent_orders: Vec<RecentOrder>,
}

/// Body of `GET /api/analytics`: the report and the projection merged into
/// one JSON object. The projection is written last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsResponse {
    #[serde(flatten)]
    pub report: DashboardReport,
    #[serde(flatten)]
    pub dashboard: DashboardProjection,
}

/// Rows gathered for a period that has at least one order.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub windows: PeriodWindows,
    pub now: DateTime<Utc>,
    pub current: MetricSnapshot,
    pub previous: MetricSnapshot,
    pub paid_order_count: i64,
    pub active_products: i64,
    pub all_time_customers: i64,
    pub status_counts: Vec<StatusCountRow>,
    pub recent_orders: Vec<OrderSummaryRow>,
    pub product_sales: Vec<ProductSalesRow>,
    pub product_meta: Vec<ProductMetaRow>,
    pub monthly_revenue: Vec<MonthlyRevenueRow>,
    pub monthly_customers: Vec<MonthlyCountRow>,
    pub performance_products: Vec<ProductWithCountsRow>,
}

#[must_use]
pub fn assemble_dashboard(data: &DashboardData) -> AnalyticsResponse {
    let current = data.current;
    let previous = data.previous;

    let comparisons = Comparisons {
        revenue: ComparisonResult::new(previous.revenue, current.revenue),
        orders: ComparisonResult::from_counts(previous.order_count, current.order_count),
        customers: ComparisonResult::from_counts(previous.customer_count, current.customer_count),
    };

    let overview = Overview {
        total_revenue: current.revenue,
        total_orders: current.order_count,
        total_customers: current.customer_count,
        total_products: data.active_products,
        average_order_value: current.average_order_value,
        conversion_rate: conversion_rate(data.paid_order_count, current.order_count),
        revenue_change: comparisons.revenue.percent_change,
        orders_change: comparisons.orders.percent_change,
        customers_change: comparisons.customers.percent_change,
    };

    let report = DashboardReport {
        overview,
        comparisons,
        top_products: rank_top_products(&data.product_sales, &data.product_meta),
        recent_activity: activity_feed(&data.recent_orders, data.now),
        order_status_distribution: status_distribution(&data.status_counts),
        revenue_by_month: revenue_series(&data.monthly_revenue),
        customer_growth: customer_series(&data.monthly_customers),
        product_performance: product_performance(&data.performance_products, &data.product_sales),
        period: data.windows.current,
    };

    let dashboard = DashboardProjection {
        total_revenue: current.revenue,
        total_orders: current.order_count,
        total_products: data.active_products,
        total_customers: current.customer_count,
        all_time_customers: data.all_time_customers,
        recent_orders: data
            .recent_orders
            .iter()
            .take(RECENT_ACTIVITY_LIMIT)
            .map(RecentOrder::from)
            .collect(),
    };

    AnalyticsResponse { report, dashboard }
}

/// Response for a period without orders: zeroed money and changes, empty
/// series, true customer and product counts, and product performance with no
/// sales.
#[must_use]
pub fn empty_dashboard(
    period: Period,
    new_customers: i64,
    active_products: i64,
    all_time_customers: i64,
    performance_products: &[ProductWithCountsRow],
) -> AnalyticsResponse {
    let report = DashboardReport {
        overview: Overview {
            total_customers: new_customers,
            total_products: active_products,
            ..Overview::default()
        },
        comparisons: Comparisons::default(),
        top_products: Vec::new(),
        recent_activity: Vec::new(),
        order_status_distribution: Vec::new(),
        revenue_by_month: Vec::new(),
        customer_growth: Vec::new(),
        product_performance: product_performance(performance_products, &[]),
        period,
    };

    let dashboard = DashboardProjection {
        total_revenue: Decimal::ZERO,
        total_orders: 0,
        total_products: active_products,
        total_customers: new_customers,
        all_time_customers,
        recent_orders: Vec::new(),
    };

    AnalyticsResponse { report, dashboard }
}

/// Paid orders as a share of all orders, to one decimal place.
#[must_use]
pub fn conversion_rate(paid_orders: i64, total_orders: i64) -> Decimal {
    if total_orders == 0 {
        return Decimal::ZERO;
    }

    Decimal::from(paid_orders)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(Decimal::from(total_orders)))
        .map_or(Decimal::ZERO, |rate| {
            rate.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        })
}

/// Status counts with each status's rounded share of the total.
#[must_use]
pub fn status_distribution(counts: &[StatusCountRow]) -> Vec<StatusShare> {
    let total: i64 = counts.iter().map(|row| row.order_count).sum();

    counts
        .iter()
        .map(|row| StatusShare {
            status: row.status,
            count: row.order_count,
            percentage: percentage_of(row.order_count, total),
        })
        .collect()
}

fn revenue_series(rows: &[MonthlyRevenueRow]) -> Vec<MonthlyRevenue> {
    rows.iter()
        .map(|row| MonthlyRevenue {
            month: row.month.clone(),
            revenue: row.revenue,
            orders: row.order_count,
        })
        .collect()
}

fn customer_series(rows: &[MonthlyCountRow]) -> Vec<MonthlyCustomers> {
    rows.iter()
        .map(|row| MonthlyCustomers {
            month: row.month.clone(),
            customers: row.count,
        })
        .collect()
}

/// Per-product sales joined onto the listed products; products without sales
/// in `sales` report zero.
fn product_performance(
    products: &[ProductWithCountsRow],
    sales: &[ProductSalesRow],
) -> Vec<ProductPerformance> {
    let by_id: HashMap<i64, &ProductSalesRow> = sales.iter().map(|s| (s.product_id, s)).collect();

    products
        .iter()
        .map(|product| {
            let sold = by_id.get(&product.id);
            ProductPerformance {
                product_id: product.id,
                name: product.name.clone(),
                units_sold: sold.map_or(0, |s| s.units_sold),
                revenue: sold.map_or(Decimal::ZERO, |s| s.revenue),
                favorites: product.favorite_count,
                reviews: product.review_count,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub total_customers: i64,
    pub total_products: i64,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOrder {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProduct {
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    pub active: bool,
    pub units_sold: i64,
    pub revenue: Decimal,
    pub favorites: i64,
    pub reviews: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCustomer {
    pub customer_id: i64,
    pub name: String,
    pub email: String,
    pub order_count: i64,
    pub total_spent: Decimal,
    pub created_at: DateTime<Utc>,
}

/// The flat dataset behind `GET /api/analytics/export`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub period: Period,
    pub generated_at: DateTime<Utc>,
    pub summary: ExportSummary,
    pub orders: Vec<ExportOrder>,
    pub products: Vec<ExportProduct>,
    pub customers: Vec<ExportCustomer>,
    pub top_products: Vec<RankedProduct>,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub customer_growth: Vec<MonthlyCustomers>,
    pub order_status_distribution: Vec<StatusShare>,
}

#[derive(Debug, Clone)]
pub struct ExportData {
    pub period: Period,
    pub generated_at: DateTime<Utc>,
    pub snapshot: MetricSnapshot,
    pub active_products: i64,
    pub orders: Vec<OrderSummaryRow>,
    pub products: Vec<ProductWithCountsRow>,
    pub customers: Vec<CustomerTotalsRow>,
    pub product_sales: Vec<ProductSalesRow>,
    pub product_meta: Vec<ProductMetaRow>,
    pub status_counts: Vec<StatusCountRow>,
    pub monthly_revenue: Vec<MonthlyRevenueRow>,
    pub monthly_customers: Vec<MonthlyCountRow>,
}

#[must_use]
pub fn assemble_export(data: &ExportData) -> ExportReport {
    let sales_by_id: HashMap<i64, &ProductSalesRow> =
        data.product_sales.iter().map(|s| (s.product_id, s)).collect();

    let products = data
        .products
        .iter()
        .map(|p| {
            let sold = sales_by_id.get(&p.id);
            ExportProduct {
                product_id: p.id,
                name: p.name.clone(),
                price: p.price,
                active: p.is_active,
                units_sold: sold.map_or(0, |s| s.units_sold),
                revenue: sold.map_or(Decimal::ZERO, |s| s.revenue),
                favorites: p.favorite_count,
                reviews: p.review_count,
            }
        })
        .collect();

    let orders = data
        .orders
        .iter()
        .map(|o| ExportOrder {
            order_number: o.order_number.clone(),
            customer_name: o.customer_name.clone(),
            customer_email: o.customer_email.clone(),
            status: o.status,
            payment_status: o.payment_status,
            total_amount: o.total_amount,
            item_count: o.item_count,
            created_at: o.created_at,
        })
        .collect();

    let customers = data
        .customers
        .iter()
        .map(|c| ExportCustomer {
            customer_id: c.id,
            name: format!("{} {}", c.first_name, c.last_name).trim().to_string(),
            email: c.email.clone(),
            order_count: c.order_count,
            total_spent: c.total_spent,
            created_at: c.created_at,
        })
        .collect();

    ExportReport {
        period: data.period,
        generated_at: data.generated_at,
        summary: ExportSummary {
            total_revenue: data.snapshot.revenue,
            total_orders: data.snapshot.order_count,
            total_customers: data.snapshot.customer_count,
            total_products: data.active_products,
            average_order_value: data.snapshot.average_order_value,
        },
        orders,
        products,
        customers,
        top_products: rank_top_products(&data.product_sales, &data.product_meta),
        revenue_by_month: revenue_series(&data.monthly_revenue),
        customer_growth: customer_series(&data.monthly_customers),
        order_status_distribution: status_distribution(&data.status_counts),
    }
}
