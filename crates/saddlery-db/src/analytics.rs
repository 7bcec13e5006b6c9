//! Read-model queries backing the analytics dashboard and report export.
//!
//! Every query is read-only and scoped by a half-open `[from, to)` window on
//! the row's `created_at`. Aggregates are `COALESCE`d so callers never see
//! `NULL` for a sum, count or average.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use saddlery_core::{OrderStatus, PaymentStatus};
use sqlx::PgPool;

use crate::DbError;

/// Time-range and payment filter shared by the order and customer queries.
///
/// `None` bounds are open. `payment_status` only applies to queries that read
/// `orders`; customer counts ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub payment_status: Option<PaymentStatus>,
}

impl RangeFilter {
    #[must_use]
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            payment_status: None,
        }
    }

    /// Restrict to paid orders.
    #[must_use]
    pub fn paid(self) -> Self {
        Self {
            payment_status: Some(PaymentStatus::Paid),
            ..self
        }
    }

    fn payment_status_text(&self) -> Option<&'static str> {
        self.payment_status.map(PaymentStatus::as_str)
    }
}

/// Sum, count and average of `orders.total_amount` for one filter.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OrderAggregateRow {
    pub order_count: i64,
    pub revenue: Decimal,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StatusCountRow {
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub order_count: i64,
}

/// Revenue per calendar month; `month` is `YYYY-MM` in UTC.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MonthlyRevenueRow {
    pub month: String,
    pub revenue: Decimal,
    pub order_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MonthlyCountRow {
    pub month: String,
    pub count: i64,
}

/// An order with its line-item count, newest first.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderSummaryRow {
    pub id: i64,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Line items grouped by product. `product_id` may reference a deleted product.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProductSalesRow {
    pub product_id: i64,
    pub revenue: Decimal,
    pub units_sold: i64,
    pub order_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProductMetaRow {
    pub id: i64,
    pub name: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductWithCountsRow {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub is_active: bool,
    pub thumbnail_url: Option<String>,
    pub favorite_count: i64,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Input filters for product listing.
///
/// `limit` is `None` to return all products, or `Some(n)` to cap results.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductCountFilters {
    pub active_only: bool,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerTotalsRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub order_count: i64,
    pub total_spent: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Returns order count, revenue and average order value for the filter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn aggregate_orders(
    pool: &PgPool,
    filter: RangeFilter,
) -> Result<OrderAggregateRow, DbError> {
    let row = sqlx::query_as::<_, OrderAggregateRow>(
        "SELECT \
             COUNT(*) AS order_count, \
             COALESCE(SUM(total_amount), 0) AS revenue, \
             COALESCE(ROUND(AVG(total_amount), 2), 0) AS average_order_value \
         FROM orders \
         WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
           AND ($2::timestamptz IS NULL OR created_at < $2) \
           AND ($3::TEXT IS NULL OR payment_status = $3)",
    )
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.payment_status_text())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns order counts per fulfilment status, largest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn aggregate_orders_by_status(
    pool: &PgPool,
    filter: RangeFilter,
) -> Result<Vec<StatusCountRow>, DbError> {
    let rows = sqlx::query_as::<_, StatusCountRow>(
        "SELECT status, COUNT(*) AS order_count \
         FROM orders \
         WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
           AND ($2::timestamptz IS NULL OR created_at < $2) \
           AND ($3::TEXT IS NULL OR payment_status = $3) \
         GROUP BY status \
         ORDER BY order_count DESC, status",
    )
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.payment_status_text())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns revenue and order count per UTC calendar month, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn aggregate_orders_by_month(
    pool: &PgPool,
    filter: RangeFilter,
) -> Result<Vec<MonthlyRevenueRow>, DbError> {
    let rows = sqlx::query_as::<_, MonthlyRevenueRow>(
        "SELECT \
             to_char(date_trunc('month', created_at AT TIME ZONE 'UTC'), 'YYYY-MM') AS month, \
             COALESCE(SUM(total_amount), 0) AS revenue, \
             COUNT(*) AS order_count \
         FROM orders \
         WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
           AND ($2::timestamptz IS NULL OR created_at < $2) \
           AND ($3::TEXT IS NULL OR payment_status = $3) \
         GROUP BY 1 \
         ORDER BY 1",
    )
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.payment_status_text())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts orders in the window regardless of payment state unless the filter
/// names one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_orders(pool: &PgPool, filter: RangeFilter) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM orders \
         WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
           AND ($2::timestamptz IS NULL OR created_at < $2) \
           AND ($3::TEXT IS NULL OR payment_status = $3)",
    )
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.payment_status_text())
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Counts users registered inside the window.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_users(pool: &PgPool, filter: RangeFilter) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users \
         WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
           AND ($2::timestamptz IS NULL OR created_at < $2)",
    )
    .bind(filter.from)
    .bind(filter.to)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Returns new-user counts per UTC calendar month, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_users_by_month(
    pool: &PgPool,
    filter: RangeFilter,
) -> Result<Vec<MonthlyCountRow>, DbError> {
    let rows = sqlx::query_as::<_, MonthlyCountRow>(
        "SELECT \
             to_char(date_trunc('month', created_at AT TIME ZONE 'UTC'), 'YYYY-MM') AS month, \
             COUNT(*) AS count \
         FROM users \
         WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
           AND ($2::timestamptz IS NULL OR created_at < $2) \
         GROUP BY 1 \
         ORDER BY 1",
    )
    .bind(filter.from)
    .bind(filter.to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts products that are currently active. Not window scoped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_active_products(pool: &PgPool) -> Result<i64, DbError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE is_active = TRUE")
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Returns orders newest first with their line-item counts.
///
/// `limit` is `None` to return every order in the window.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_orders(
    pool: &PgPool,
    filter: RangeFilter,
    limit: Option<i64>,
) -> Result<Vec<OrderSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderSummaryRow>(
        "SELECT \
             o.id, o.order_number, o.customer_name, o.customer_email, \
             o.status, o.payment_status, o.total_amount, \
             (SELECT COUNT(*) FROM order_items oi WHERE oi.order_id = o.id) AS item_count, \
             o.created_at \
         FROM orders o \
         WHERE ($1::timestamptz IS NULL OR o.created_at >= $1) \
           AND ($2::timestamptz IS NULL OR o.created_at < $2) \
           AND ($3::TEXT IS NULL OR o.payment_status = $3) \
         ORDER BY o.created_at DESC, o.id DESC \
         LIMIT COALESCE($4, 9223372036854775807)",
    )
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.payment_status_text())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Groups line items by product for orders matching the filter.
///
/// Ordered by revenue descending, then `product_id` ascending so ties are
/// deterministic. Products deleted after purchase are still reported.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn group_order_items_by_product(
    pool: &PgPool,
    filter: RangeFilter,
) -> Result<Vec<ProductSalesRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductSalesRow>(
        "SELECT \
             oi.product_id, \
             COALESCE(SUM(oi.total), 0) AS revenue, \
             COALESCE(SUM(oi.quantity), 0)::BIGINT AS units_sold, \
             COUNT(oi.id) AS order_count \
         FROM order_items oi \
         JOIN orders o ON o.id = oi.order_id \
         WHERE ($1::timestamptz IS NULL OR o.created_at >= $1) \
           AND ($2::timestamptz IS NULL OR o.created_at < $2) \
           AND ($3::TEXT IS NULL OR o.payment_status = $3) \
         GROUP BY oi.product_id \
         ORDER BY revenue DESC, oi.product_id",
    )
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.payment_status_text())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Batch lookup of display metadata. Unknown ids are simply absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_products_by_ids(
    pool: &PgPool,
    ids: &[i64],
) -> Result<Vec<ProductMetaRow>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, ProductMetaRow>(
        "SELECT id, name, thumbnail_url FROM products WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns products newest first with favorite and review counts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_with_counts(
    pool: &PgPool,
    filters: ProductCountFilters,
) -> Result<Vec<ProductWithCountsRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductWithCountsRow>(
        "SELECT \
             p.id, p.name, p.price, p.is_active, p.thumbnail_url, \
             (SELECT COUNT(*) FROM favorites f WHERE f.product_id = p.id) AS favorite_count, \
             (SELECT COUNT(*) FROM reviews r WHERE r.product_id = p.id) AS review_count, \
             p.created_at \
         FROM products p \
         WHERE (NOT $1 OR p.is_active = TRUE) \
         ORDER BY p.created_at DESC, p.id DESC \
         LIMIT COALESCE($2, 9223372036854775807)",
    )
    .bind(filters.active_only)
    .bind(filters.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every user with order count and spend from orders inside the filter.
///
/// Users without matching orders are included with zero totals. Ordered by
/// spend descending, then id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_users_with_order_totals(
    pool: &PgPool,
    filter: RangeFilter,
) -> Result<Vec<CustomerTotalsRow>, DbError> {
    let rows = sqlx::query_as::<_, CustomerTotalsRow>(
        "SELECT \
             u.id, u.first_name, u.last_name, u.email, \
             COUNT(o.id) AS order_count, \
             COALESCE(SUM(o.total_amount), 0) AS total_spent, \
             u.created_at \
         FROM users u \
         LEFT JOIN orders o \
           ON o.user_id = u.id \
          AND ($1::timestamptz IS NULL OR o.created_at >= $1) \
          AND ($2::timestamptz IS NULL OR o.created_at < $2) \
          AND ($3::TEXT IS NULL OR o.payment_status = $3) \
         GROUP BY u.id \
         ORDER BY total_spent DESC, u.id",
    )
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.payment_status_text())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
