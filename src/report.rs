use crate::aggregator::{aggregate, top_products_by_quantity, FinancialSnapshot, ProductQuantity};
use crate::error::{Result, SalesReportError};
use crate::forecast::{FitDiagnostics, TrendForecaster};
use crate::schema::{ProductRecord, ProjectionPolicy, ReportConfig};
use crate::utils::today;
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub policy: ProjectionPolicy,
    pub month_projection: f64,
    pub year_projection: f64,
    /// Present for regression projections only
    pub diagnostics: Option<FitDiagnostics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub as_of_date: NaiveDate,
    #[serde(flatten)]
    pub snapshot: FinancialSnapshot,
    /// Serialized at the top level: `month_projection`, `year_projection`, ...
    #[serde(flatten)]
    pub forecast: Option<ForecastSummary>,
    /// Why `forecast` is missing, worded for the person who asked for the report
    pub forecast_error: Option<String>,
    #[serde(rename = "top_n_products_by_quantity")]
    pub top_products: Vec<ProductQuantity>,
    #[serde(skip)]
    currency_symbol: String,
}

pub struct ReportBuilder<'a> {
    config: &'a ReportConfig,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, records: &[ProductRecord], as_of_date: NaiveDate) -> Result<SalesReport> {
        self.config.validate()?;
        validate_records(records)?;

        info!(
            "Generating sales report for {} from {} records",
            as_of_date,
            records.len()
        );

        let snapshot = aggregate(records, as_of_date);
        let top_products = top_products_by_quantity(records, self.config.top_n);

        let (forecast, forecast_error) = match self.forecast(records, as_of_date, &snapshot) {
            Ok(summary) => (Some(summary), None),
            Err(SalesReportError::InsufficientData(reason)) => {
                warn!("Skipping forecast: {}", reason);
                (
                    None,
                    Some(format!(
                        "The data is insufficient for training the model ({}). Please add more sales data.",
                        reason
                    )),
                )
            }
            Err(e) => return Err(e),
        };

        Ok(SalesReport {
            as_of_date,
            snapshot,
            forecast,
            forecast_error,
            top_products,
            currency_symbol: self.config.currency_symbol.clone(),
        })
    }

    fn forecast(
        &self,
        records: &[ProductRecord],
        as_of_date: NaiveDate,
        snapshot: &FinancialSnapshot,
    ) -> Result<ForecastSummary> {
        let month = self.config.month_horizon_days;
        let year = self.config.year_horizon_days;

        match self.config.projection {
            ProjectionPolicy::FlatRate => Ok(ForecastSummary {
                policy: ProjectionPolicy::FlatRate,
                month_projection: snapshot.total_earnings * f64::from(month),
                year_projection: snapshot.total_earnings * f64::from(year),
                diagnostics: None,
            }),
            ProjectionPolicy::Regression => {
                let model = TrendForecaster::new(self.config.forecast.clone()).fit(records)?;
                Ok(ForecastSummary {
                    policy: ProjectionPolicy::Regression,
                    month_projection: model.project(month, as_of_date)?,
                    year_projection: model.project(year, as_of_date)?,
                    diagnostics: Some(model.diagnostics),
                })
            }
        }
    }
}

/// Checks every record and that no two records share an id.
pub fn validate_records(records: &[ProductRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        record.validate()?;
        if !seen.insert(record.id) {
            return Err(SalesReportError::DuplicateRecordId(record.id));
        }
    }
    Ok(())
}

pub fn generate_report(
    records: &[ProductRecord],
    as_of_date: NaiveDate,
    config: &ReportConfig,
) -> Result<SalesReport> {
    ReportBuilder::new(config).build(records, as_of_date)
}

pub fn generate_report_today(records: &[ProductRecord], config: &ReportConfig) -> Result<SalesReport> {
    generate_report(records, today(), config)
}

impl SalesReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn money(&self, value: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, value)
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Sales Report - {}\n\n", self.as_of_date));

        output.push_str("## Sales Prediction\n\n");
        match (&self.forecast, &self.forecast_error) {
            (Some(forecast), _) => {
                output.push_str(&format!(
                    "- **Sales after a month:** {}\n",
                    self.money(forecast.month_projection)
                ));
                output.push_str(&format!(
                    "- **Sales after a year:** {}\n",
                    self.money(forecast.year_projection)
                ));
                if let Some(diagnostics) = &forecast.diagnostics {
                    if let Some(mse) = diagnostics.holdout_mse {
                        output.push_str(&format!("- **Holdout MSE:** {:.4}\n", mse));
                    }
                    for warning in &diagnostics.warnings {
                        output.push_str(&format!("- _Note: {}_\n", warning));
                    }
                }
            }
            (None, Some(reason)) => output.push_str(&format!("_{}_\n", reason)),
            (None, None) => output.push_str("_No forecast available._\n"),
        }
        output.push('\n');

        output.push_str("## Financials\n\n");
        output.push_str(&format!(
            "- **Today's Total Profit:** {}\n",
            self.money(self.snapshot.total_profit)
        ));
        output.push_str(&format!(
            "- **Today's Total Loss:** {}\n",
            self.money(self.snapshot.total_loss)
        ));
        output.push_str(&format!(
            "- **Today's Total Earnings:** {}\n\n",
            self.money(self.snapshot.total_earnings)
        ));

        output.push_str("### Per Product Earnings\n\n");
        for (name, profit) in &self.snapshot.per_product_totals {
            output.push_str(&format!("- {}: {}\n", name, self.money(*profit)));
        }
        output.push('\n');

        output.push_str(&format!("## Top {} Products\n\n", self.top_products.len()));
        output.push_str("| Product Name | Total Quantity Sold |\n");
        output.push_str("|---|---|\n");
        for product in &self.top_products {
            output.push_str(&format!(
                "| {} | {:.2} |\n",
                product.name, product.total_quantity
            ));
        }

        output
    }
}
