//! Top products by revenue.

use std::collections::HashMap;

use rust_decimal::Decimal;
use saddlery_db::{ProductMetaRow, ProductSalesRow};
use serde::Serialize;

pub const TOP_PRODUCTS_LIMIT: usize = 10;

/// Display name used when a sold product no longer exists in the catalogue.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedProduct {
    pub rank: usize,
    pub product_id: i64,
    pub name: String,
    pub revenue: Decimal,
    pub units_sold: i64,
    pub order_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Product ids of the rows that will make the top list, for the batch lookup.
#[must_use]
pub fn top_product_ids(sales: &[ProductSalesRow]) -> Vec<i64> {
    sorted_by_revenue(sales)
        .into_iter()
        .take(TOP_PRODUCTS_LIMIT)
        .map(|row| row.product_id)
        .collect()
}

/// Rank grouped sales by revenue (descending, stable on input order), keep
/// the first [`TOP_PRODUCTS_LIMIT`] and attach display metadata.
///
/// Rows whose product is missing from `products` are kept under
/// [`UNKNOWN_PRODUCT_NAME`] without a thumbnail.
#[must_use]
pub fn rank_top_products(
    sales: &[ProductSalesRow],
    products: &[ProductMetaRow],
) -> Vec<RankedProduct> {
    let by_id: HashMap<i64, &ProductMetaRow> = products.iter().map(|p| (p.id, p)).collect();

    sorted_by_revenue(sales)
        .into_iter()
        .take(TOP_PRODUCTS_LIMIT)
        .enumerate()
        .map(|(index, row)| {
            let meta = by_id.get(&row.product_id);
            RankedProduct {
                rank: index + 1,
                product_id: row.product_id,
                name: meta.map_or_else(|| UNKNOWN_PRODUCT_NAME.to_string(), |p| p.name.clone()),
                revenue: row.revenue,
                units_sold: row.units_sold,
                order_count: row.order_count,
                thumbnail: meta.and_then(|p| p.thumbnail_url.clone()),
            }
        })
        .collect()
}

fn sorted_by_revenue(sales: &[ProductSalesRow]) -> Vec<&ProductSalesRow> {
    let mut rows: Vec<&ProductSalesRow> = sales.iter().collect();
    // sort_by is stable, so equal revenue keeps query order
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows
}
