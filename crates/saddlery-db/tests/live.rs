//! Live integration tests for saddlery-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/saddlery-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use saddlery_core::OrderStatus;
use saddlery_db::{
    aggregate_orders, aggregate_orders_by_month, aggregate_orders_by_status,
    count_active_products, count_orders, count_users, find_products_by_ids,
    group_order_items_by_product, list_products_with_counts, list_recent_orders,
    list_users_with_order_totals, seed_demo_data, ProductCountFilters, RangeFilter,
    StatusCountRow,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn dollars(n: i64) -> Decimal {
    Decimal::new(n * 100, 2)
}

async fn insert_product(pool: &sqlx::PgPool, slug: &str, active: bool) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO products (name, slug, price, is_active, thumbnail_url) \
         VALUES ($1, $2, 50.00, $3, $4) RETURNING id",
    )
    .bind(format!("Product {slug}"))
    .bind(slug)
    .bind(active)
    .bind(format!("/img/{slug}.jpg"))
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_product failed for slug '{slug}': {e}"))
}

async fn insert_user(pool: &sqlx::PgPool, email: &str, created_at: DateTime<Utc>) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (first_name, last_name, email, created_at) \
         VALUES ('Test', 'User', $1, $2) RETURNING id",
    )
    .bind(email)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_user failed for '{email}': {e}"))
}

async fn insert_order(
    pool: &sqlx::PgPool,
    number: &str,
    user_id: Option<i64>,
    payment_status: &str,
    total: Decimal,
    created_at: DateTime<Utc>,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO orders \
             (order_number, user_id, customer_name, customer_email, status, \
              payment_status, total_amount, created_at) \
         VALUES ($1, $2, 'Jane Doe', 'jane@example.com', 'processing', $3, $4, $5) \
         RETURNING id",
    )
    .bind(number)
    .bind(user_id)
    .bind(payment_status)
    .bind(total)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_order failed for '{number}': {e}"))
}

async fn insert_item(pool: &sqlx::PgPool, order_id: i64, product_id: i64, qty: i32, total: Decimal) {
    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price, total) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(qty)
    .bind(total / Decimal::from(qty))
    .bind(total)
    .execute(pool)
    .await
    .expect("insert order item");
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn aggregate_orders_counts_only_paid_revenue(pool: sqlx::PgPool) {
    let day = at(2026, 3, 10);
    insert_order(&pool, "A-1", None, "paid", dollars(100), day).await;
    insert_order(&pool, "A-2", None, "paid", dollars(300), day).await;
    insert_order(&pool, "A-3", None, "pending", dollars(999), day).await;

    let window = RangeFilter::between(at(2026, 3, 1), at(2026, 4, 1));
    let paid = aggregate_orders(&pool, window.paid()).await.expect("aggregate");
    assert_eq!(paid.order_count, 2);
    assert_eq!(paid.revenue, dollars(400));
    assert_eq!(paid.average_order_value, dollars(200));

    assert_eq!(count_orders(&pool, window).await.expect("count"), 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn aggregate_orders_empty_window_is_zero_not_null(pool: sqlx::PgPool) {
    let window = RangeFilter::between(at(2026, 3, 1), at(2026, 4, 1)).paid();
    let row = aggregate_orders(&pool, window).await.expect("aggregate");
    assert_eq!(row.order_count, 0);
    assert_eq!(row.revenue, Decimal::ZERO);
    assert_eq!(row.average_order_value, Decimal::ZERO);
}

#[sqlx::test(migrations = "../../migrations")]
async fn window_is_half_open(pool: sqlx::PgPool) {
    let from = at(2026, 5, 1);
    let to = at(2026, 5, 31);
    insert_order(&pool, "B-start", None, "paid", dollars(10), from).await;
    insert_order(&pool, "B-end", None, "paid", dollars(20), to).await;

    let count = count_orders(&pool, RangeFilter::between(from, to))
        .await
        .expect("count");
    assert_eq!(count, 1, "start is inclusive, end is exclusive");
}

#[sqlx::test(migrations = "../../migrations")]
async fn status_and_month_groupings(pool: sqlx::PgPool) {
    insert_order(&pool, "C-1", None, "paid", dollars(10), at(2026, 1, 15)).await;
    insert_order(&pool, "C-2", None, "paid", dollars(15), at(2026, 1, 20)).await;
    insert_order(&pool, "C-3", None, "failed", dollars(40), at(2026, 2, 2)).await;
    sqlx::query("UPDATE orders SET status = 'delivered' WHERE order_number = 'C-1'")
        .execute(&pool)
        .await
        .expect("update status");

    let all = RangeFilter::between(at(2026, 1, 1), at(2026, 3, 1));
    let statuses = aggregate_orders_by_status(&pool, all).await.expect("statuses");
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].status, OrderStatus::Processing);
    assert_eq!(statuses[0].order_count, 2);
    assert_eq!(statuses[1].status, OrderStatus::Delivered);

    let months = aggregate_orders_by_month(&pool, all.paid()).await.expect("months");
    assert_eq!(months.len(), 1);
    assert_eq!(months[0].month, "2026-01");
    assert_eq!(months[0].revenue, dollars(25));
    assert_eq!(months[0].order_count, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_recent_orders_is_newest_first_with_item_counts(pool: sqlx::PgPool) {
    let product = insert_product(&pool, "wallet", true).await;
    let older = insert_order(&pool, "D-1", None, "paid", dollars(50), at(2026, 6, 1)).await;
    let newer = insert_order(&pool, "D-2", None, "pending", dollars(100), at(2026, 6, 2)).await;
    insert_item(&pool, older, product, 1, dollars(50)).await;
    insert_item(&pool, newer, product, 1, dollars(50)).await;
    insert_item(&pool, newer, product, 1, dollars(50)).await;

    let window = RangeFilter::between(at(2026, 6, 1), at(2026, 7, 1));
    let rows = list_recent_orders(&pool, window, Some(10)).await.expect("orders");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].order_number, "D-2");
    assert_eq!(rows[0].item_count, 2);
    assert_eq!(rows[1].order_number, "D-1");

    let limited = list_recent_orders(&pool, window, Some(1)).await.expect("orders");
    assert_eq!(limited.len(), 1);
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn grouped_items_keep_deleted_products(pool: sqlx::PgPool) {
    let kept = insert_product(&pool, "satchel", true).await;
    let doomed = insert_product(&pool, "duffel", true).await;
    let order = insert_order(&pool, "E-1", None, "paid", dollars(500), at(2026, 7, 4)).await;
    insert_item(&pool, order, kept, 1, dollars(100)).await;
    insert_item(&pool, order, doomed, 2, dollars(400)).await;
    let unpaid = insert_order(&pool, "E-2", None, "refunded", dollars(900), at(2026, 7, 4)).await;
    insert_item(&pool, unpaid, kept, 9, dollars(900)).await;

    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(doomed)
        .execute(&pool)
        .await
        .expect("delete product");

    let window = RangeFilter::between(at(2026, 7, 1), at(2026, 8, 1)).paid();
    let groups = group_order_items_by_product(&pool, window).await.expect("groups");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].product_id, doomed);
    assert_eq!(groups[0].revenue, dollars(400));
    assert_eq!(groups[0].units_sold, 2);
    assert_eq!(groups[1].product_id, kept);
    assert_eq!(groups[1].order_count, 1);

    let meta = find_products_by_ids(&pool, &[kept, doomed]).await.expect("lookup");
    assert_eq!(meta.len(), 1);
    assert_eq!(meta[0].id, kept);
}

#[sqlx::test(migrations = "../../migrations")]
async fn find_products_by_ids_with_empty_slice_skips_query(pool: sqlx::PgPool) {
    let rows = find_products_by_ids(&pool, &[]).await.expect("lookup");
    assert!(rows.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn products_with_counts_respects_active_filter(pool: sqlx::PgPool) {
    let active = insert_product(&pool, "belt", true).await;
    insert_product(&pool, "fob", false).await;
    let user = insert_user(&pool, "fan@example.com", at(2026, 1, 1)).await;
    sqlx::query("INSERT INTO favorites (user_id, product_id) VALUES ($1, $2)")
        .bind(user)
        .bind(active)
        .execute(&pool)
        .await
        .expect("favorite");
    sqlx::query("INSERT INTO reviews (product_id, user_id, rating) VALUES ($1, $2, 5)")
        .bind(active)
        .bind(user)
        .execute(&pool)
        .await
        .expect("review");

    assert_eq!(count_active_products(&pool).await.expect("count"), 1);

    let active_rows = list_products_with_counts(
        &pool,
        ProductCountFilters {
            active_only: true,
            limit: Some(20),
        },
    )
    .await
    .expect("products");
    assert_eq!(active_rows.len(), 1);
    assert_eq!(active_rows[0].favorite_count, 1);
    assert_eq!(active_rows[0].review_count, 1);

    let all_rows = list_products_with_counts(&pool, ProductCountFilters::default())
        .await
        .expect("products");
    assert_eq!(all_rows.len(), 2);
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn customers_are_counted_by_registration_window(pool: sqlx::PgPool) {
    insert_user(&pool, "old@example.com", at(2025, 12, 1)).await;
    insert_user(&pool, "new@example.com", at(2026, 2, 10)).await;

    let window = RangeFilter::between(at(2026, 2, 1), at(2026, 3, 1));
    assert_eq!(count_users(&pool, window).await.expect("count"), 1);
    assert_eq!(count_users(&pool, RangeFilter::default()).await.expect("count"), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn users_with_order_totals_include_zero_spend(pool: sqlx::PgPool) {
    let buyer = insert_user(&pool, "buyer@example.com", at(2026, 1, 1)).await;
    insert_user(&pool, "browser@example.com", at(2026, 1, 2)).await;
    insert_order(&pool, "F-1", Some(buyer), "paid", dollars(120), at(2026, 2, 1)).await;
    insert_order(&pool, "F-2", Some(buyer), "failed", dollars(80), at(2026, 2, 2)).await;

    let window = RangeFilter::between(at(2026, 1, 1), at(2026, 3, 1)).paid();
    let rows = list_users_with_order_totals(&pool, window).await.expect("customers");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].email, "buyer@example.com");
    assert_eq!(rows[0].order_count, 1);
    assert_eq!(rows[0].total_spent, dollars(120));
    assert_eq!(rows[1].order_count, 0);
    assert_eq!(rows[1].total_spent, Decimal::ZERO);
}

// ---------------------------------------------------------------------------
// Seed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_demo_data_is_idempotent(pool: sqlx::PgPool) {
    let now = Utc::now();
    let first = seed_demo_data(&pool, now).await.expect("first seed");
    assert_eq!(first.products, 6);
    assert_eq!(first.customers, 8);
    assert_eq!(first.orders_inserted, 36);

    let second = seed_demo_data(&pool, now).await.expect("second seed");
    assert_eq!(second.orders_inserted, 0);

    let total = count_orders(&pool, RangeFilter::default()).await.expect("count");
    assert_eq!(total, 36);

    let recent = RangeFilter::between(now - Duration::days(30), now + Duration::seconds(1));
    assert!(count_orders(&pool, recent).await.expect("count") > 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_status_text_fails_to_decode(pool: sqlx::PgPool) {
    let result = sqlx::query_as::<_, StatusCountRow>(
        "SELECT 'shipped'::TEXT AS status, 1::BIGINT AS order_count",
    )
    .fetch_one(&pool)
    .await;

    assert!(matches!(result, Err(sqlx::Error::ColumnDecode { .. })));
}
