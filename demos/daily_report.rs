use chrono::Days;
use sales_report_builder::*;

fn main() -> Result<()> {
    println!("📊 Daily Sales Report Demo\n");

    let catalog = vec![
        CatalogEntry {
            id: 1,
            name: "Masala Chai".to_string(),
            cost_price: 12.0,
            quantity_available: 500.0,
            unit: MeasurementUnit::Piece,
        },
        CatalogEntry {
            id: 2,
            name: "Samosa".to_string(),
            cost_price: 9.0,
            quantity_available: 300.0,
            unit: MeasurementUnit::Piece,
        },
        CatalogEntry {
            id: 3,
            name: "Jalebi".to_string(),
            cost_price: 180.0,
            quantity_available: 20.0,
            unit: MeasurementUnit::Kilogram,
        },
    ];

    let today = today();
    let mut sales = Vec::new();
    for days_ago in (0..14u64).rev() {
        let date = today - Days::new(days_ago);
        let trend = (14 - days_ago) as f64;
        sales.push(SaleEntry {
            date,
            product_name: "Masala Chai".to_string(),
            quantity_sold: 20.0 + trend * 2.0,
            selling_price: 15.0,
        });
        sales.push(SaleEntry {
            date,
            product_name: "Samosa".to_string(),
            quantity_sold: 15.0 + trend,
            selling_price: 12.0,
        });
        if days_ago % 3 == 0 {
            sales.push(SaleEntry {
                date,
                product_name: "Jalebi".to_string(),
                quantity_sold: 1.5,
                selling_price: 170.0,
            });
        }
    }

    let ledger = SalesLedger::with_records(convert_sales_to_records(&catalog, &sales)?)?;
    println!("📋 Loaded {} sales across 14 days\n", ledger.len());

    let regression = ledger.report(today, &ReportConfig::default())?;
    println!("{}", regression.to_markdown());

    let flat_rate = ReportConfig {
        projection: ProjectionPolicy::FlatRate,
        ..ReportConfig::default()
    };
    let flat = ledger.report(today, &flat_rate)?;
    if let Some(forecast) = &flat.forecast {
        println!("🔄 Flat-rate comparison:");
        println!("  Month: ₹{:.2}", forecast.month_projection);
        println!("  Year:  ₹{:.2}", forecast.year_projection);
    }

    println!("\n🧾 JSON payload:\n{}", regression.to_json()?);
    Ok(())
}
