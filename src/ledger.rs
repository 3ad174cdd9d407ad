use crate::error::{Result, SalesReportError};
use crate::report::{generate_report, SalesReport};
use crate::schema::{ProductRecord, ReportConfig};
use chrono::NaiveDate;
use log::debug;
use std::collections::HashSet;

/// Caller-owned collection of the records entered during one session.
#[derive(Debug, Clone, Default)]
pub struct SalesLedger {
    records: Vec<ProductRecord>,
    ids: HashSet<u64>,
}

impl SalesLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = ProductRecord>) -> Result<Self> {
        let mut ledger = Self::new();
        for record in records {
            ledger.push(record)?;
        }
        Ok(ledger)
    }

    pub fn push(&mut self, record: ProductRecord) -> Result<()> {
        record.validate()?;
        if !self.ids.insert(record.id) {
            return Err(SalesReportError::DuplicateRecordId(record.id));
        }

        debug!("Recorded sale #{} of {} on {}", record.id, record.name, record.date);
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn on_date(&self, date: NaiveDate) -> impl Iterator<Item = &ProductRecord> {
        self.records.iter().filter(move |r| r.date == date)
    }

    pub fn report(&self, as_of_date: NaiveDate, config: &ReportConfig) -> Result<SalesReport> {
        generate_report(&self.records, as_of_date, config)
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }
}
