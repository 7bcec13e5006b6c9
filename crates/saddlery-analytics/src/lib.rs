//! Analytics reporting for the storefront back-office.
//!
//! Resolves reporting windows, drives the read-model queries in
//! `saddlery-db`, and shapes the results into the dashboard response and the
//! downloadable export report.

pub mod activity;
pub mod aggregator;
pub mod comparison;
pub mod error;
pub mod export;
pub mod period;
pub mod ranking;
pub mod report;

pub use activity::{activity_feed, relative_time, ActivityEntry};
pub use aggregator::{build_dashboard, build_export};
pub use comparison::{percent_change, ComparisonResult};
pub use error::AnalyticsError;
pub use export::{export_filename, render_export, ExportFormat};
pub use period::{parse_period_days, Period, PeriodWindows, DEFAULT_PERIOD_DAYS};
pub use ranking::{rank_top_products, RankedProduct, UNKNOWN_PRODUCT_NAME};
pub use report::{AnalyticsResponse, DashboardProjection, DashboardReport, ExportReport};
