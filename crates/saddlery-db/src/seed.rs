//! Deterministic demo data for local development and report previews.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use saddlery_core::{OrderStatus, PaymentStatus};
use sqlx::PgPool;

use crate::DbError;

const DEMO_ORDER_COUNT: i64 = 36;

/// name, slug, price in cents, active, days since listing
const DEMO_PRODUCTS: [(&str, &str, i64, bool, i64); 6] = [
    ("Heritage Satchel", "heritage-satchel", 28_900, true, 400),
    ("Bifold Wallet", "bifold-wallet", 7_900, true, 380),
    ("Slim Card Holder", "slim-card-holder", 3_900, true, 300),
    ("Weekender Duffel", "weekender-duffel", 44_900, true, 200),
    ("Full Grain Belt", "full-grain-belt", 9_500, true, 90),
    ("Braided Key Fob", "braided-key-fob", 2_500, false, 60),
];

/// first name, last name, email, days since registration
const DEMO_CUSTOMERS: [(&str, &str, &str, i64); 8] = [
    ("Ada", "Marsh", "ada.marsh@example.com", 340),
    ("Bram", "Okafor", "bram.okafor@example.com", 250),
    ("Celia", "Nunez", "celia.nunez@example.com", 190),
    ("Dov", "Lindqvist", "dov.lindqvist@example.com", 120),
    ("Esme", "Hart", "esme.hart@example.com", 75),
    ("Farid", "Qureshi", "farid.qureshi@example.com", 40),
    ("Greta", "Ilves", "greta.ilves@example.com", 12),
    ("Hugo", "Brandt", "hugo.brandt@example.com", 3),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub products: usize,
    pub customers: usize,
    pub orders_inserted: usize,
}

/// Insert the demo catalogue, customers, favorites, reviews and orders.
///
/// Timestamps are placed relative to `now` so the data always falls inside
/// the default reporting windows. Re-running is safe: products and customers
/// are upserted by slug/email and existing order numbers are skipped. All
/// writes happen in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_demo_data(pool: &PgPool, now: DateTime<Utc>) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;

    let mut products: Vec<(i64, Decimal)> = Vec::with_capacity(DEMO_PRODUCTS.len());
    for (name, slug, cents, active, age_days) in DEMO_PRODUCTS {
        let price = Decimal::new(cents, 2);
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, slug, price, is_active, thumbnail_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 price = EXCLUDED.price, \
                 is_active = EXCLUDED.is_active, \
                 thumbnail_url = EXCLUDED.thumbnail_url, \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(name)
        .bind(slug)
        .bind(price)
        .bind(active)
        .bind(format!("/images/products/{slug}.jpg"))
        .bind(now - Duration::days(age_days))
        .fetch_one(&mut *tx)
        .await?;
        products.push((id, price));
    }

    let mut customers: Vec<(i64, String, String)> = Vec::with_capacity(DEMO_CUSTOMERS.len());
    for (first_name, last_name, email, age_days) in DEMO_CUSTOMERS {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (first_name, last_name, email, role, created_at) \
             VALUES ($1, $2, $3, 'customer', $4) \
             ON CONFLICT (email) DO UPDATE SET \
                 first_name = EXCLUDED.first_name, \
                 last_name = EXCLUDED.last_name, \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(now - Duration::days(age_days))
        .fetch_one(&mut *tx)
        .await?;
        customers.push((id, format!("{first_name} {last_name}"), email.to_string()));
    }

    for (index, (user_id, _, _)) in customers.iter().enumerate() {
        let (product_id, _) = products[index % products.len()];
        sqlx::query(
            "INSERT INTO favorites (user_id, product_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO reviews (product_id, user_id, rating, body) \
             SELECT $1, $2, $3, $4 \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM reviews WHERE product_id = $1 AND user_id = $2 \
             )",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(if index % 3 == 0 { 4_i16 } else { 5_i16 })
        .bind("Beautiful stitching, ages well.")
        .execute(&mut *tx)
        .await?;
    }

    let mut orders_inserted = 0usize;
    for n in 0..DEMO_ORDER_COUNT {
        let (user_id, customer_name, customer_email) = pick(&customers, n);
        let payment_status = demo_payment_status(n);
        let status = if payment_status == PaymentStatus::Paid {
            *pick(&OrderStatus::ALL[1..], n)
        } else {
            OrderStatus::New
        };
        let created_at = now - Duration::days((n * 5) % 180 + n % 3) - Duration::hours(n % 24);

        let mut lines = vec![(*pick(&products, n), 1 + n % 2)];
        if n % 3 == 0 {
            lines.push((*pick(&products, n + 2), 1));
        }
        let total_amount: Decimal = lines
            .iter()
            .map(|((_, price), quantity)| *price * Decimal::from(*quantity))
            .sum();

        let order_id: Option<i64> = sqlx::query_scalar(
            "INSERT INTO orders \
                 (order_number, user_id, customer_name, customer_email, status, \
                  payment_status, total_amount, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             ON CONFLICT (order_number) DO NOTHING \
             RETURNING id",
        )
        .bind(format!("SDL-{:05}", 1001 + n))
        .bind(user_id)
        .bind(customer_name)
        .bind(customer_email)
        .bind(status.as_str())
        .bind(payment_status.as_str())
        .bind(total_amount)
        .bind(created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order_id) = order_id else {
            continue;
        };

        for ((product_id, unit_price), quantity) in lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price, total) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order_id)
            .bind(product_id)
            .bind(i32::try_from(quantity).unwrap_or(1))
            .bind(unit_price)
            .bind(unit_price * Decimal::from(quantity))
            .execute(&mut *tx)
            .await?;
        }
        orders_inserted += 1;
    }

    tx.commit().await?;

    tracing::info!(
        products = products.len(),
        customers = customers.len(),
        orders_inserted,
        "demo data seeded"
    );

    Ok(SeedSummary {
        products: products.len(),
        customers: customers.len(),
        orders_inserted,
    })
}

fn demo_payment_status(n: i64) -> PaymentStatus {
    match n % 12 {
        5 => PaymentStatus::Pending,
        8 => PaymentStatus::Failed,
        11 => PaymentStatus::Refunded,
        _ => PaymentStatus::Paid,
    }
}

fn pick<T>(items: &[T], n: i64) -> &T {
    &items[usize::try_from(n).unwrap_or(0) % items.len()]
}
