//! Export serialization: pretty JSON or a sectioned CSV document.
//!
//! The CSV document is seven sections separated by one blank line. Each
//! section is a label line, a header row and zero or more data rows. Text
//! cells are always quoted; counts are bare; money is `$` with two decimals.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::AnalyticsError;
use crate::report::ExportReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// Parse the `format` query value. Anything other than `json` is CSV.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

/// `analytics-report-YYYY-MM-DD.{csv|json}` for the UTC date of `now`.
#[must_use]
pub fn export_filename(format: ExportFormat, now: DateTime<Utc>) -> String {
    format!(
        "analytics-report-{}.{}",
        now.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Render the export report in the requested format.
///
/// # Errors
///
/// Returns [`AnalyticsError::Serialize`] if JSON serialization fails.
pub fn render_export(report: &ExportReport, format: ExportFormat) -> Result<String, AnalyticsError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        ExportFormat::Csv => Ok(render_csv(report)),
    }
}

enum Cell<'a> {
    Text(&'a str),
    Int(i64),
    Money(Decimal),
    Flag(bool),
    Time(DateTime<Utc>),
}

impl Cell<'_> {
    fn render(&self) -> String {
        match self {
            Cell::Text(value) => quote(value),
            Cell::Int(value) => value.to_string(),
            Cell::Money(value) => money(*value),
            Cell::Flag(value) => quote(if *value { "Yes" } else { "No" }),
            Cell::Time(value) => quote(&timestamp(*value)),
        }
    }
}

struct Section {
    body: String,
}

impl Section {
    fn new(label: &str, header: &[&str]) -> Self {
        let mut body = String::new();
        body.push_str(label);
        body.push('\n');
        body.push_str(&header.join(","));
        Self { body }
    }

    fn row(&mut self, cells: &[Cell<'_>]) {
        let rendered: Vec<String> = cells.iter().map(Cell::render).collect();
        self.body.push('\n');
        self.body.push_str(&rendered.join(","));
    }

    fn line(&mut self, text: &str) {
        self.body.push('\n');
        self.body.push_str(text);
    }
}

fn render_csv(report: &ExportReport) -> String {
    let sections = [
        summary_section(report),
        orders_section(report),
        products_section(report),
        top_products_section(report),
        revenue_section(report),
        customer_growth_section(report),
        status_section(report),
    ];

    let mut out = sections
        .iter()
        .map(|s| s.body.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

fn summary_section(report: &ExportReport) -> Section {
    let period = &report.period;
    let period_label = format!(
        "Last {} days ({} to {})",
        period.length_days,
        period.start.format("%Y-%m-%d"),
        period.end.format("%Y-%m-%d")
    );

    let summary = &report.summary;
    let mut section = Section {
        body: "ANALYTICS REPORT SUMMARY".to_string(),
    };
    section.line(&format!("Period,{}", quote(&period_label)));
    section.line(&format!("Generated At,{}", quote(&timestamp(report.generated_at))));
    section.line("SUMMARY METRICS");
    section.line("Metric,Value");
    section.row(&[Cell::Text("Total Revenue"), Cell::Money(summary.total_revenue)]);
    section.row(&[Cell::Text("Total Orders"), Cell::Int(summary.total_orders)]);
    section.row(&[Cell::Text("Total Customers"), Cell::Int(summary.total_customers)]);
    section.row(&[Cell::Text("Total Products"), Cell::Int(summary.total_products)]);
    section.row(&[
        Cell::Text("Average Order Value"),
        Cell::Money(summary.average_order_value),
    ]);
    section
}

fn orders_section(report: &ExportReport) -> Section {
    let mut section = Section::new(
        "ORDERS",
        &[
            "Order Number",
            "Customer Name",
            "Customer Email",
            "Status",
            "Payment Status",
            "Total Amount",
            "Items",
            "Created At",
        ],
    );
    for order in &report.orders {
        section.row(&[
            Cell::Text(&order.order_number),
            Cell::Text(&order.customer_name),
            Cell::Text(&order.customer_email),
            Cell::Text(order.status.as_str()),
            Cell::Text(order.payment_status.as_str()),
            Cell::Money(order.total_amount),
            Cell::Int(order.item_count),
            Cell::Time(order.created_at),
        ]);
    }
    section
}

fn products_section(report: &ExportReport) -> Section {
    let mut section = Section::new(
        "PRODUCTS",
        &[
            "Product ID",
            "Name",
            "Price",
            "Active",
            "Units Sold",
            "Revenue",
            "Favorites",
            "Reviews",
        ],
    );
    for product in &report.products {
        section.row(&[
            Cell::Int(product.product_id),
            Cell::Text(&product.name),
            Cell::Money(product.price),
            Cell::Flag(product.active),
            Cell::Int(product.units_sold),
            Cell::Money(product.revenue),
            Cell::Int(product.favorites),
            Cell::Int(product.reviews),
        ]);
    }
    section
}

fn top_products_section(report: &ExportReport) -> Section {
    let mut section = Section::new(
        "TOP PRODUCTS",
        &["Rank", "Product ID", "Name", "Units Sold", "Orders", "Revenue"],
    );
    for product in &report.top_products {
        section.row(&[
            Cell::Int(i64::try_from(product.rank).unwrap_or(i64::MAX)),
            Cell::Int(product.product_id),
            Cell::Text(&product.name),
            Cell::Int(product.units_sold),
            Cell::Int(product.order_count),
            Cell::Money(product.revenue),
        ]);
    }
    section
}

fn revenue_section(report: &ExportReport) -> Section {
    let mut section = Section::new("REVENUE BY MONTH", &["Month", "Revenue", "Orders"]);
    for month in &report.revenue_by_month {
        section.row(&[
            Cell::Text(&month.month),
            Cell::Money(month.revenue),
            Cell::Int(month.orders),
        ]);
    }
    section
}

fn customer_growth_section(report: &ExportReport) -> Section {
    let mut section = Section::new("CUSTOMER GROWTH", &["Month", "New Customers"]);
    for month in &report.customer_growth {
        section.row(&[Cell::Text(&month.month), Cell::Int(month.customers)]);
    }
    section
}

fn status_section(report: &ExportReport) -> Section {
    let mut section = Section::new(
        "ORDER STATUS DISTRIBUTION",
        &["Status", "Count", "Percentage"],
    );
    for share in &report.order_status_distribution {
        section.row(&[
            Cell::Text(share.status.as_str()),
            Cell::Int(share.count),
            Cell::Int(share.percentage),
        ]);
    }
    section
}

/// Quote a text cell, doubling embedded quotes. Line breaks become spaces so a
/// cell never ends a section. Values that a spreadsheet would evaluate as a
/// formula get a leading `'`.
fn quote(field: &str) -> String {
    let escaped = field.replace(['\r', '\n'], " ").replace('"', "\"\"");
    if escaped.starts_with(['=', '+', '-', '@']) {
        format!("\"'{escaped}\"")
    } else {
        format!("\"{escaped}\"")
    }
}

fn money(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}")
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}
