use crate::error::{Result, SalesReportError};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum MeasurementUnit {
    #[schemars(description = "Countable items sold one by one")]
    Piece,

    #[schemars(description = "Weight in kilograms")]
    Kilogram,

    #[schemars(description = "Weight in grams")]
    Gram,

    #[schemars(description = "Volume in litres")]
    Litre,

    #[schemars(description = "Volume in millilitres")]
    Millilitre,

    #[schemars(description = "Length in metres")]
    Metre,

    #[schemars(description = "Pre-packed boxes or cartons")]
    Box,
}

impl Default for MeasurementUnit {
    fn default() -> Self {
        Self::Piece
    }
}

/// The value a forecast model is trained to predict for each record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum ForecastTarget {
    #[schemars(
        description = "Net earnings per record: quantity * (selling_price - cost_price). The default."
    )]
    NetEarnings,

    #[schemars(description = "Gross revenue per record: quantity * selling_price.")]
    GrossRevenue,
}

impl Default for ForecastTarget {
    fn default() -> Self {
        Self::NetEarnings
    }
}

/// How month/year projections are produced for a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum ProjectionPolicy {
    #[schemars(
        description = "Fit the day-of-year/year regression and sum its predictions over each future day of the horizon. The default."
    )]
    Regression,

    #[schemars(
        description = "Multiply the as-of date's total earnings by the number of horizon days. Ignores any trained model."
    )]
    FlatRate,
}

impl Default for ProjectionPolicy {
    fn default() -> Self {
        Self::Regression
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ProductRecord {
    #[schemars(description = "Positive identifier, unique per entry")]
    pub id: u64,

    #[schemars(description = "Product name as entered on the sales form. Must not be empty.")]
    pub name: String,

    #[schemars(description = "Unit cost price. Non-negative.")]
    pub cost_price: f64,

    #[schemars(description = "Unit selling price. Non-negative.")]
    pub selling_price: f64,

    #[schemars(description = "Quantity sold, expressed in `unit`. Non-negative.")]
    pub quantity: f64,

    #[serde(default)]
    #[schemars(description = "Measurement unit of `quantity`. Defaults to Piece.")]
    pub unit: MeasurementUnit,

    #[schemars(description = "Date of the sale in YYYY-MM-DD format")]
    pub date: NaiveDate,
}

impl ProductRecord {
    /// Builds a record and rejects it unless every field is in range.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        cost_price: f64,
        selling_price: f64,
        quantity: f64,
        unit: MeasurementUnit,
        date: NaiveDate,
    ) -> Result<Self> {
        let record = Self {
            id,
            name: name.into(),
            cost_price,
            selling_price,
            quantity,
            unit,
            date,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |details: String| SalesReportError::ValidationError {
            record: format!("#{} {}", self.id, self.name),
            details,
        };

        if self.id == 0 {
            return Err(invalid("id must be a positive integer".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }

        for (field, value) in [
            ("cost_price", self.cost_price),
            ("selling_price", self.selling_price),
            ("quantity", self.quantity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{} must be a finite non-negative number (got {})",
                    field, value
                )));
            }
        }

        Ok(())
    }

    /// `quantity * (selling_price - cost_price)`. Negative for a loss-making sale.
    pub fn profit(&self) -> f64 {
        self.quantity * (self.selling_price - self.cost_price)
    }

    pub fn revenue(&self) -> f64 {
        self.quantity * self.selling_price
    }

    pub fn target_value(&self, target: ForecastTarget) -> f64 {
        match target {
            ForecastTarget::NetEarnings => self.profit(),
            ForecastTarget::GrossRevenue => self.revenue(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct ForecastSettings {
    #[schemars(description = "Per-record value the regression is trained on")]
    pub target: ForecastTarget,

    #[schemars(
        description = "Below this many records the model is fitted on the whole dataset with a warning instead of a train/holdout split"
    )]
    pub min_split_records: usize,

    #[schemars(description = "Share of records held out when splitting. Must be in (0, 1).")]
    pub test_fraction: f64,

    #[schemars(description = "Seed for the reproducible train/holdout partition")]
    pub split_seed: u64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            target: ForecastTarget::NetEarnings,
            min_split_records: 5,
            test_fraction: 0.2,
            split_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct ReportConfig {
    #[schemars(description = "Number of best-selling products listed by summed quantity")]
    pub top_n: usize,

    #[schemars(description = "Horizon of the short-term projection, in days")]
    pub month_horizon_days: u32,

    #[schemars(description = "Horizon of the long-term projection, in days")]
    pub year_horizon_days: u32,

    pub projection: ProjectionPolicy,

    #[schemars(description = "Symbol prefixed to monetary amounts in rendered reports")]
    pub currency_symbol: String,

    pub forecast: ForecastSettings,
}

/// Longest accepted projection horizon, roughly a century.
pub const MAX_HORIZON_DAYS: u32 = 36_600;

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            month_horizon_days: 30,
            year_horizon_days: 365,
            projection: ProjectionPolicy::Regression,
            currency_symbol: "₹".to_string(),
            forecast: ForecastSettings::default(),
        }
    }
}

impl ReportConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fraction = self.forecast.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(SalesReportError::InvalidConfig(format!(
                "test_fraction must be between 0 and 1 exclusive (got {})",
                fraction
            )));
        }

        for (name, days) in [
            ("month_horizon_days", self.month_horizon_days),
            ("year_horizon_days", self.year_horizon_days),
        ] {
            if days > MAX_HORIZON_DAYS {
                return Err(SalesReportError::InvalidConfig(format!(
                    "{} must be at most {} (got {})",
                    name, MAX_HORIZON_DAYS, days
                )));
            }
        }

        if self.forecast.min_split_records < 2 {
            return Err(SalesReportError::InvalidConfig(format!(
                "min_split_records must be at least 2 (got {})",
                self.forecast.min_split_records
            )));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
