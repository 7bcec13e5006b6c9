//! Query fan-out for one analytics request.
//!
//! Queries that do not depend on each other are issued together with
//! `tokio::try_join!` and awaited jointly; the first failure aborts the
//! request. The previous-period snapshot is only fetched once the current
//! period is known to contain orders.

use std::time::Instant;

use chrono::{DateTime, Utc};
use saddlery_db::{
    aggregate_orders, aggregate_orders_by_month, aggregate_orders_by_status, count_active_products,
    count_orders, count_users, count_users_by_month, find_products_by_ids,
    group_order_items_by_product, list_products_with_counts, list_recent_orders,
    list_users_with_order_totals, ProductCountFilters, RangeFilter,
};
use sqlx::PgPool;
use tracing::debug;

use crate::activity::RECENT_ACTIVITY_LIMIT;
use crate::error::AnalyticsError;
use crate::period::{Period, PeriodWindows};
use crate::ranking::top_product_ids;
use crate::report::{
    assemble_dashboard, assemble_export, empty_dashboard, AnalyticsResponse, DashboardData,
    ExportData, ExportReport, MetricSnapshot,
};

/// Products listed in the dashboard's performance table, newest first.
pub const PERFORMANCE_PRODUCTS_LIMIT: i64 = 20;

/// Build the dashboard response for the `period_days` window ending at `now`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Query`] if any query fails.
#[tracing::instrument(skip(pool, now))]
pub async fn build_dashboard(
    pool: &PgPool,
    period_days: i64,
    now: DateTime<Utc>,
) -> Result<AnalyticsResponse, AnalyticsError> {
    let windows = PeriodWindows::ending_at(period_days, now);
    let current = windows.current.filter();
    let started = Instant::now();

    let (order_count, new_customers, active_products, all_time_customers, performance_products) =
        tokio::try_join!(
            count_orders(pool, current),
            count_users(pool, current),
            count_active_products(pool),
            count_users(pool, RangeFilter::default()),
            list_products_with_counts(
                pool,
                ProductCountFilters {
                    active_only: true,
                    limit: Some(PERFORMANCE_PRODUCTS_LIMIT),
                },
            ),
        )?;
    debug!(
        order_count,
        elapsed_ms = started.elapsed().as_millis(),
        "dashboard counts fetched"
    );

    if order_count == 0 {
        return Ok(empty_dashboard(
            windows.current,
            new_customers,
            active_products,
            all_time_customers,
            &performance_products,
        ));
    }

    let trailing = Period::trailing_months(now).filter();
    let previous = windows.previous.filter();
    let started = Instant::now();

    let (
        paid,
        status_counts,
        recent_orders,
        product_sales,
        monthly_revenue,
        monthly_customers,
        previous_paid,
        previous_orders,
        previous_customers,
    ) = tokio::try_join!(
        aggregate_orders(pool, current.paid()),
        aggregate_orders_by_status(pool, current),
        list_recent_orders(pool, current, Some(recent_limit())),
        group_order_items_by_product(pool, current.paid()),
        aggregate_orders_by_month(pool, trailing.paid()),
        count_users_by_month(pool, trailing),
        aggregate_orders(pool, previous.paid()),
        count_orders(pool, previous),
        count_users(pool, previous),
    )?;

    let product_meta = find_products_by_ids(pool, &top_product_ids(&product_sales)).await?;
    debug!(
        products_sold = product_sales.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "dashboard aggregates fetched"
    );

    Ok(assemble_dashboard(&DashboardData {
        windows,
        now,
        current: MetricSnapshot::new(&paid, order_count, new_customers),
        previous: MetricSnapshot::new(&previous_paid, previous_orders, previous_customers),
        paid_order_count: paid.order_count,
        active_products,
        all_time_customers,
        status_counts,
        recent_orders,
        product_sales,
        product_meta,
        monthly_revenue,
        monthly_customers,
        performance_products,
    }))
}

/// Build the flat export report for the `period_days` window ending at `now`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Query`] if any query fails.
#[tracing::instrument(skip(pool, now))]
pub async fn build_export(
    pool: &PgPool,
    period_days: i64,
    now: DateTime<Utc>,
) -> Result<ExportReport, AnalyticsError> {
    let period = PeriodWindows::ending_at(period_days, now).current;
    let current = period.filter();
    let trailing = Period::trailing_months(now).filter();
    let started = Instant::now();

    let (
        paid,
        order_count,
        new_customers,
        active_products,
        orders,
        products,
        customers,
        product_sales,
        status_counts,
        monthly_revenue,
        monthly_customers,
    ) = tokio::try_join!(
        aggregate_orders(pool, current.paid()),
        count_orders(pool, current),
        count_users(pool, current),
        count_active_products(pool),
        list_recent_orders(pool, current, None),
        list_products_with_counts(pool, ProductCountFilters::default()),
        list_users_with_order_totals(pool, current.paid()),
        group_order_items_by_product(pool, current.paid()),
        aggregate_orders_by_status(pool, current),
        aggregate_orders_by_month(pool, trailing.paid()),
        count_users_by_month(pool, trailing),
    )?;

    let product_meta = find_products_by_ids(pool, &top_product_ids(&product_sales)).await?;
    debug!(
        orders = orders.len(),
        products = products.len(),
        customers = customers.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "export rows fetched"
    );

    Ok(assemble_export(&ExportData {
        period,
        generated_at: now,
        snapshot: MetricSnapshot::new(&paid, order_count, new_customers),
        active_products,
        orders,
        products,
        customers,
        product_sales,
        product_meta,
        status_counts,
        monthly_revenue,
        monthly_customers,
    }))
}

fn recent_limit() -> i64 {
    i64::try_from(RECENT_ACTIVITY_LIMIT).unwrap_or(i64::MAX)
}
