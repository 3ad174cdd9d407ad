//! # Sales Report Builder
//!
//! A library for turning the product sales entered during a single session
//! into a daily profit/loss snapshot and an earnings forecast.
//!
//! ## Core Concepts
//!
//! - **Record**: one sale of a product with its date, quantity, cost and selling price
//! - **Aggregator**: realized profit and loss for an as-of date, split by sign
//! - **Forecaster**: a day-of-year/year linear regression projected over a horizon
//! - **Horizon**: number of future days whose predictions are summed
//! - **Report**: snapshot, month/year projections and best-selling products in one payload
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_report_builder::*;
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
//! let mut ledger = SalesLedger::new();
//! ledger.push(ProductRecord::new(1, "A", 10.0, 15.0, 2.0, MeasurementUnit::Piece, today)?)?;
//! ledger.push(ProductRecord::new(2, "B", 5.0, 3.0, 1.0, MeasurementUnit::Piece, today)?)?;
//!
//! let report = ledger.report(today, &ReportConfig::default())?;
//! assert_eq!(report.snapshot.total_earnings, 8.0);
//! println!("{}", report.to_markdown());
//! ```

pub mod aggregator;
pub mod error;
pub mod forecast;
pub mod ingestion;
pub mod ledger;
pub mod report;
pub mod schema;
pub mod utils;

pub use aggregator::{
    aggregate, aggregate_today, top_products_by_quantity, FinancialSnapshot, ProductQuantity,
};
pub use error::{Result, SalesReportError};
pub use forecast::{fit, project, FitDiagnostics, FitStrategy, ForecastModel, TrendForecaster};
pub use ingestion::*;
pub use ledger::SalesLedger;
pub use report::{
    generate_report, generate_report_today, validate_records, ForecastSummary, ReportBuilder,
    SalesReport,
};
pub use schema::*;
pub use utils::*;
