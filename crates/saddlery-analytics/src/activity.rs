//! Recent-order activity feed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use saddlery_core::OrderStatus;
use saddlery_db::OrderSummaryRow;
use serde::Serialize;

pub const RECENT_ACTIVITY_LIMIT: usize = 10;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
    pub relative_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl ActivityEntry {
    fn from_order(order: &OrderSummaryRow, now: DateTime<Utc>) -> Self {
        Self {
            kind: "order",
            message: format!(
                "New order #{} from {}",
                order.order_number, order.customer_name
            ),
            relative_time: relative_time(now, order.created_at),
            amount: Some(order.total_amount),
            status: Some(order.status),
        }
    }
}

/// Human-readable age of `created_at` relative to `now`, floored to the
/// largest whole unit. Timestamps in the future read as "Just now".
#[must_use]
pub fn relative_time(now: DateTime<Utc>, created_at: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds().max(0);

    match seconds {
        s if s < MINUTE => "Just now".to_string(),
        s if s < HOUR => format!("{} minutes ago", s / MINUTE),
        s if s < DAY => format!("{} hours ago", s / HOUR),
        s => format!("{} days ago", s / DAY),
    }
}

/// One entry per order, preserving the newest-first order of the input and
/// keeping at most [`RECENT_ACTIVITY_LIMIT`].
#[must_use]
pub fn activity_feed(orders: &[OrderSummaryRow], now: DateTime<Utc>) -> Vec<ActivityEntry> {
    orders
        .iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|order| ActivityEntry::from_order(order, now))
        .collect()
}
