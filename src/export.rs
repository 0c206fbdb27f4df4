use anyhow::Context;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::Table;
use crate::query::Filter;

const COLUMNS: [&str; 10] = [
    "order_id",
    "order_date",
    "product_id",
    "product_name",
    "category",
    "total_amount",
    "customer_id",
    "customer_region",
    "customer_rating",
    "payment_method",
];

/// A finished export: the CSV bytes plus the timestamped filename the
/// presentation layer offers for download.
#[derive(Debug)]
pub struct Export {
    pub filename: String,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

// The derived year/month/month_key columns stay internal; the export carries
// the original columns only.
#[derive(Serialize)]
struct ExportRow<'a> {
    order_id: &'a str,
    order_date: String,
    product_id: &'a str,
    product_name: &'a str,
    category: &'a str,
    total_amount: f64,
    customer_id: &'a str,
    customer_region: &'a str,
    customer_rating: u8,
    payment_method: &'a str,
}

/// Serialize the filtered view of the table, in canonical row order. The
/// header row is always present, so an empty filter result still yields a
/// well-formed file.
pub fn export_csv(table: &Table, filter: &Filter, now: NaiveDateTime) -> anyhow::Result<Export> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    wtr.write_record(COLUMNS).context("write export header")?;

    let mut rows = 0;
    for sale in table.iter().filter(|s| filter.matches(s)) {
        wtr.serialize(ExportRow {
            order_id: &sale.order_id,
            order_date: sale.order_date.to_string(),
            product_id: &sale.product_id,
            product_name: &sale.product_name,
            category: &sale.category,
            total_amount: sale.total_amount,
            customer_id: &sale.customer_id,
            customer_region: &sale.customer_region,
            customer_rating: sale.customer_rating,
            payment_method: &sale.payment_method,
        })?;
        rows += 1;
    }

    wtr.flush()?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("finish export buffer: {e}"))?;

    let filename = format!("swiftshop_data_{}.csv", now.format("%Y%m%d_%H%M%S"));
    Ok(Export { filename, rows, bytes })
}
