use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesReportError {
    #[error("Insufficient data for forecasting: {0}")]
    InsufficientData(String),

    #[error("Invalid record '{record}': {details}")]
    ValidationError { record: String, details: String },

    #[error("Duplicate record id {0}: ids must be unique per entry")]
    DuplicateRecordId(u64),

    #[error("Invalid report configuration: {0}")]
    InvalidConfig(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SalesReportError>;
