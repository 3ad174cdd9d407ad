use crate::error::{Result, SalesReportError};
use crate::schema::{MeasurementUnit, ProductRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A product as entered on the catalog form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub name: String,
    pub cost_price: f64,
    pub quantity_available: f64,
    #[serde(default)]
    pub unit: MeasurementUnit,
}

/// A sale as entered on the sales form. The cost price comes from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleEntry {
    pub date: NaiveDate,
    pub product_name: String,
    pub quantity_sold: f64,
    pub selling_price: f64,
}

/// Joins sales against the catalog by product name.
///
/// Records are numbered `1..=sales.len()` in sale order.
pub fn convert_sales_to_records(
    catalog: &[CatalogEntry],
    sales: &[SaleEntry],
) -> Result<Vec<ProductRecord>> {
    let mut by_name: HashMap<&str, &CatalogEntry> = HashMap::new();
    for entry in catalog {
        if entry.id == 0 {
            return Err(SalesReportError::ValidationError {
                record: entry.name.clone(),
                details: "catalog id must be a positive integer".to_string(),
            });
        }
        if by_name.insert(entry.name.as_str(), entry).is_some() {
            return Err(SalesReportError::ValidationError {
                record: entry.name.clone(),
                details: format!("catalog lists '{}' more than once", entry.name),
            });
        }
    }

    sales
        .iter()
        .enumerate()
        .map(|(idx, sale)| {
            let product = by_name.get(sale.product_name.as_str()).ok_or_else(|| {
                SalesReportError::ValidationError {
                    record: sale.product_name.clone(),
                    details: format!(
                        "sale #{} on {} refers to a product missing from the catalog",
                        idx + 1,
                        sale.date
                    ),
                }
            })?;

            ProductRecord::new(
                idx as u64 + 1,
                sale.product_name.clone(),
                product.cost_price,
                sale.selling_price,
                sale.quantity_sold,
                product.unit,
                sale.date,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry {
                id: 10,
                name: "Sugar".to_string(),
                cost_price: 40.0,
                quantity_available: 100.0,
                unit: MeasurementUnit::Kilogram,
            },
            CatalogEntry {
                id: 11,
                name: "Juice".to_string(),
                cost_price: 25.0,
                quantity_available: 30.0,
                unit: MeasurementUnit::Litre,
            },
        ]
    }

    fn sale(name: &str, qty: f64, price: f64) -> SaleEntry {
        SaleEntry {
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            product_name: name.to_string(),
            quantity_sold: qty,
            selling_price: price,
        }
    }

    #[test]
    fn test_join_uses_catalog_cost_and_unit() {
        let records =
            convert_sales_to_records(&catalog(), &[sale("Juice", 2.0, 30.0), sale("Sugar", 1.0, 35.0)])
                .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].cost_price, 25.0);
        assert_eq!(records[0].unit, MeasurementUnit::Litre);
        assert_eq!(records[0].profit(), 10.0);
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].profit(), -5.0);
    }

    #[test]
    fn test_unknown_product_is_rejected() {
        let err = convert_sales_to_records(&catalog(), &[sale("Salt", 1.0, 5.0)]).unwrap_err();
        assert!(err.to_string().contains("missing from the catalog"));
    }

    #[test]
    fn test_duplicate_catalog_name_is_rejected() {
        let mut entries = catalog();
        entries.push(entries[0].clone());
        assert!(convert_sales_to_records(&entries, &[]).is_err());
    }

    #[test]
    fn test_zero_catalog_id_is_rejected() {
        let mut entries = catalog();
        entries[1].id = 0;
        let err = convert_sales_to_records(&entries, &[sale("Sugar", 1.0, 45.0)]).unwrap_err();
        assert!(matches!(err, SalesReportError::ValidationError { ref record, .. } if record == "Juice"));
        assert!(err.to_string().contains("positive integer"));
    }

    #[test]
    fn test_invalid_sale_values_are_rejected() {
        let result = convert_sales_to_records(&catalog(), &[sale("Sugar", -2.0, 35.0)]);
        assert!(matches!(
            result,
            Err(SalesReportError::ValidationError { .. })
        ));
    }
}
