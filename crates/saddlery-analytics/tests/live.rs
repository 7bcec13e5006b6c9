//! End-to-end report tests against a migrated Postgres via `#[sqlx::test]`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use saddlery_analytics::{
    build_dashboard, build_export, render_export, ExportFormat, UNKNOWN_PRODUCT_NAME,
};
use saddlery_core::{OrderStatus, PaymentStatus};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

fn dollars(n: i64) -> Decimal {
    Decimal::new(n * 100, 2)
}

async fn insert_product(pool: &sqlx::PgPool, slug: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO products (name, slug, price, is_active, created_at) \
         VALUES ($1, $2, 95.00, TRUE, $3) RETURNING id",
    )
    .bind(format!("Product {slug}"))
    .bind(slug)
    .bind(now() - Duration::days(400))
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_product failed for '{slug}': {e}"))
}

async fn insert_order(
    pool: &sqlx::PgPool,
    number: &str,
    payment: PaymentStatus,
    total: Decimal,
    created_at: DateTime<Utc>,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO orders \
             (order_number, customer_name, customer_email, status, payment_status, \
              total_amount, created_at) \
         VALUES ($1, 'Jane Doe', 'jane@example.com', $2, $3, $4, $5) RETURNING id",
    )
    .bind(number)
    .bind(OrderStatus::New.as_str())
    .bind(payment.as_str())
    .bind(total)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_order failed for '{number}': {e}"))
}

async fn insert_item(pool: &sqlx::PgPool, order_id: i64, product_id: i64, total: Decimal) {
    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price, total) \
         VALUES ($1, $2, 1, $3, $3)",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(total)
    .execute(pool)
    .await
    .expect("insert order item");
}

#[sqlx::test(migrations = "../../migrations")]
async fn three_paid_orders_with_empty_previous_period(pool: sqlx::PgPool) {
    for (i, amount) in [100, 200, 300].into_iter().enumerate() {
        let created = now() - Duration::days(i64::try_from(i).unwrap() + 1);
        insert_order(&pool, &format!("T-{i}"), PaymentStatus::Paid, dollars(amount), created).await;
    }

    let response = build_dashboard(&pool, 30, now()).await.expect("dashboard");
    let overview = &response.report.overview;
    assert_eq!(overview.total_revenue, dollars(600));
    assert_eq!(overview.total_orders, 3);
    assert_eq!(overview.average_order_value, dollars(200));
    assert_eq!(overview.revenue_change, 100);
    assert_eq!(response.report.recent_activity.len(), 3);
    assert_eq!(
        response.report.recent_activity[0].message,
        "New order #T-0 from Jane Doe"
    );
    assert_eq!(response.report.recent_activity[0].relative_time, "1 days ago");
    assert_eq!(response.report.order_status_distribution[0].percentage, 100);
    assert_eq!(response.dashboard.total_revenue, dollars(600));
}

#[sqlx::test(migrations = "../../migrations")]
async fn comparison_against_previous_window(pool: sqlx::PgPool) {
    insert_order(&pool, "P-1", PaymentStatus::Paid, dollars(100), now() - Duration::days(10)).await;
    insert_order(&pool, "P-2", PaymentStatus::Paid, dollars(100), now() - Duration::days(12)).await;
    insert_order(&pool, "C-1", PaymentStatus::Paid, dollars(300), now() - Duration::days(2)).await;

    let response = build_dashboard(&pool, 7, now()).await.expect("dashboard");
    let comparisons = &response.report.comparisons;
    assert_eq!(comparisons.revenue.previous_value, dollars(200));
    assert_eq!(comparisons.revenue.current_value, dollars(300));
    assert_eq!(comparisons.revenue.percent_change, 50);
    assert_eq!(comparisons.orders.percent_change, -50);
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_period_returns_zeroed_report(pool: sqlx::PgPool) {
    insert_product(&pool, "wallet").await;
    insert_order(&pool, "OLD-1", PaymentStatus::Paid, dollars(80), now() - Duration::days(90)).await;

    let response = build_dashboard(&pool, 30, now()).await.expect("dashboard");
    let report = &response.report;
    assert_eq!(report.overview.total_revenue, Decimal::ZERO);
    assert_eq!(report.overview.total_orders, 0);
    assert_eq!(report.overview.total_products, 1);
    assert!(report.top_products.is_empty());
    assert!(report.recent_activity.is_empty());
    assert!(report.order_status_distribution.is_empty());
    assert!(report.revenue_by_month.is_empty());
    assert!(report.customer_growth.is_empty());
    assert_eq!(report.product_performance.len(), 1);
    assert_eq!(report.product_performance[0].units_sold, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleted_product_is_ranked_as_unknown(pool: sqlx::PgPool) {
    let kept = insert_product(&pool, "belt").await;
    let gone = insert_product(&pool, "holster").await;
    let order = insert_order(&pool, "D-1", PaymentStatus::Paid, dollars(500), now() - Duration::days(1)).await;
    insert_item(&pool, order, kept, dollars(100)).await;
    insert_item(&pool, order, gone, dollars(400)).await;
    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(gone)
        .execute(&pool)
        .await
        .expect("delete product");

    let response = build_dashboard(&pool, 30, now()).await.expect("dashboard");
    let top = &response.report.top_products;
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].rank, 1);
    assert_eq!(top[0].product_id, gone);
    assert_eq!(top[0].name, UNKNOWN_PRODUCT_NAME);
    assert!(top[0].thumbnail.is_none());
    assert_eq!(top[1].name, "Product belt");
}

#[sqlx::test(migrations = "../../migrations")]
async fn export_summary_matches_paid_orders(pool: sqlx::PgPool) {
    insert_order(&pool, "E-1", PaymentStatus::Paid, dollars(120), now() - Duration::days(3)).await;
    insert_order(&pool, "E-2", PaymentStatus::Paid, dollars(80), now() - Duration::days(4)).await;
    insert_order(&pool, "E-3", PaymentStatus::Refunded, dollars(999), now() - Duration::days(5)).await;

    let report = build_export(&pool, 30, now()).await.expect("export");
    assert_eq!(report.orders.len(), 3);

    let json = render_export(&report, ExportFormat::Json).expect("json");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
    assert_eq!(parsed["summary"]["totalRevenue"], serde_json::json!(200.0));
    assert_eq!(parsed["summary"]["totalOrders"], 3);

    let csv = render_export(&report, ExportFormat::Csv).expect("csv");
    assert_eq!(csv.trim_end().split("\n\n").count(), 7);
    assert!(csv.contains("\"Total Revenue\",$200.00"));
}
