use std::path::Path;

use anyhow::Context;
use chrono::{Days, NaiveDate};
use rand::prelude::*;
use serde::Serialize;
use tracing::info;

const PRODUCTS: &[(&str, &str, &str, f64)] = &[
    ("P-1001", "Aurora Desk Lamp", "Home & Living", 42.0),
    ("P-1002", "Nimbus Throw Blanket", "Home & Living", 35.0),
    ("P-1003", "Trailblazer Backpack", "Outdoors", 88.0),
    ("P-1004", "Summit Water Bottle", "Outdoors", 18.0),
    ("P-1005", "Pulse Wireless Earbuds", "Electronics", 129.0),
    ("P-1006", "Volt Power Bank", "Electronics", 54.0),
    ("P-1007", "Saga Hardcover Novel", "Books", 24.0),
    ("P-1008", "Atlas World Maps", "Books", 39.0),
    ("P-1009", "Zen Yoga Mat", "Sports", 31.0),
    ("P-1010", "Sprint Running Shoes", "Sports", 96.0),
];

const REGIONS: &[&str] = &["North", "South", "East", "West", "Central"];
const PAYMENTS: &[&str] = &["Credit Card", "Debit Card", "PayPal", "Gift Card"];

#[derive(Serialize)]
struct GenRow<'a> {
    order_id: String,
    order_date: String,
    product_id: &'a str,
    product_name: &'a str,
    category: &'a str,
    total_amount: f64,
    customer_id: String,
    customer_region: Option<&'a str>,
    customer_rating: Option<u8>,
    payment_method: Option<&'a str>,
}

/// Write a synthetic sales CSV in the shape the loader ingests, with
/// deliberate holes (missing ratings, regions, payment methods) so the
/// imputation pass has real work to do. Orders span 1-3 rows and dates
/// spread over two years, giving the monthly trend plenty of buckets.
pub fn generate_csv(path: &Path, rows: usize) -> anyhow::Result<usize> {
    let mut rng = rand::rng();
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;

    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut written = 0usize;
    let mut order_seq = 1000u32;

    while written < rows {
        order_seq += 1;
        let order_id = format!("ORD-{order_seq}");
        let customer_id = format!("CUST-{:03}", rng.random_range(1..=150));
        let order_date = (base + Days::new(rng.random_range(0..730))).to_string();
        let payment = *PAYMENTS.choose(&mut rng).unwrap();

        let items = (rng.random_range(1..=3usize)).min(rows - written);
        for _ in 0..items {
            let (product_id, product_name, category, base_price) = *PRODUCTS.choose(&mut rng).unwrap();
            let quantity = rng.random_range(1..=4) as f64;
            let total_amount =
                (base_price * quantity * rng.random_range(0.8..1.2) * 100.0).round() / 100.0;

            // 0 is a real value here: a customer who chose not to rate
            let customer_rating = rng.random_bool(0.85).then(|| rng.random_range(0..=5));
            let customer_region = rng.random_bool(0.9).then(|| *REGIONS.choose(&mut rng).unwrap());
            let payment_method = rng.random_bool(0.95).then_some(payment);

            wtr.serialize(GenRow {
                order_id: order_id.clone(),
                order_date: order_date.clone(),
                product_id,
                product_name,
                category,
                total_amount,
                customer_id: customer_id.clone(),
                customer_region,
                customer_rating,
                payment_method,
            })?;
            written += 1;
        }
    }

    wtr.flush()?;
    info!("generated {} synthetic sales rows into {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{impute, loader};

    #[test]
    fn generated_file_loads_and_prepares_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");

        let written = generate_csv(&path, 500).unwrap();
        assert_eq!(written, 500);

        let raw = loader::read_csv(&path).unwrap();
        assert_eq!(raw.len(), 500);

        let table = impute::prepare(raw).unwrap();
        assert_eq!(table.len(), 500);
        for sale in table.iter() {
            assert!(sale.customer_rating <= 5);
            assert!(!sale.customer_region.is_empty());
            assert!(!sale.payment_method.is_empty());
            assert!(sale.total_amount > 0.0);
        }
    }
}
