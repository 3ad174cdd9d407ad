use crate::schema::ProductRecord;
use crate::utils::today;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Realized profit and loss for a single day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// Sum of every positive per-record profit
    pub total_profit: f64,
    /// Sum of every negative per-record profit (never positive)
    pub total_loss: f64,
    pub total_earnings: f64,
    /// Product name -> summed profit of that product's records
    pub per_product_totals: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductQuantity {
    pub name: String,
    pub total_quantity: f64,
}

pub fn aggregate(records: &[ProductRecord], as_of_date: NaiveDate) -> FinancialSnapshot {
    let mut snapshot = FinancialSnapshot::default();
    let mut matched = 0usize;

    for record in records.iter().filter(|r| r.date == as_of_date) {
        matched += 1;
        let profit = record.profit();

        if profit > 0.0 {
            snapshot.total_profit += profit;
        } else if profit < 0.0 {
            snapshot.total_loss += profit;
        }

        *snapshot
            .per_product_totals
            .entry(record.name.clone())
            .or_insert(0.0) += profit;
    }

    snapshot.total_earnings = snapshot.total_profit + snapshot.total_loss;

    debug!(
        "Aggregated {} of {} records for {}: profit {:.2}, loss {:.2}",
        matched,
        records.len(),
        as_of_date,
        snapshot.total_profit,
        snapshot.total_loss
    );

    snapshot
}

pub fn aggregate_today(records: &[ProductRecord]) -> FinancialSnapshot {
    aggregate(records, today())
}

/// The `n` products with the highest summed quantity over all records.
///
/// Sorting is stable, so products with equal totals keep the order in which
/// they first appear in `records`.
pub fn top_products_by_quantity(records: &[ProductRecord], n: usize) -> Vec<ProductQuantity> {
    let mut totals: Vec<ProductQuantity> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match positions.get(record.name.as_str()) {
            Some(&idx) => totals[idx].total_quantity += record.quantity,
            None => {
                positions.insert(record.name.as_str(), totals.len());
                totals.push(ProductQuantity {
                    name: record.name.clone(),
                    total_quantity: record.quantity,
                });
            }
        }
    }

    totals.sort_by(|a, b| b.total_quantity.total_cmp(&a.total_quantity));
    totals.truncate(n);
    totals
}
