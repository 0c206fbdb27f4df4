use ahash::AHashMap;
use anyhow::Context;
use chrono::NaiveDate;
use dashmap::DashMap;
use rayon::prelude::*;

use crate::model::{RawSale, Sale, Table};

pub const UNKNOWN: &str = "Unknown";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Group statistics used to fill holes in the raw feed. Computed once from
/// the original (pre-fill) values; per-row fills never feed back into them,
/// so imputation is order-independent and deterministic.
#[derive(Debug, Default)]
pub struct ImputeStats {
    product_rating: AHashMap<String, u8>,
    global_rating: Option<u8>,
    customer_region: AHashMap<String, String>,
}

impl ImputeStats {
    pub fn from_raw(rows: &[RawSale]) -> Self {
        // Ratings grouped by product, region counts grouped by customer.
        // Explicit 0 ("unrated") counts as a present value here; only the
        // display KPIs exclude it.
        let ratings: DashMap<String, Vec<f64>> = DashMap::new();
        let regions: DashMap<String, AHashMap<String, usize>> = DashMap::new();

        rows.par_iter().for_each(|row| {
            if let Some(rating) = row.customer_rating {
                ratings.entry(row.product_id.clone()).or_default().push(rating);
            }
            if let Some(region) = &row.customer_region {
                *regions
                    .entry(row.customer_id.clone())
                    .or_default()
                    .entry(region.clone())
                    .or_insert(0) += 1;
            }
        });

        let mut all_ratings: Vec<f64> = rows.iter().filter_map(|r| r.customer_rating).collect();
        let global_rating = median(&mut all_ratings).map(round_rating);

        let product_rating = ratings
            .into_iter()
            .filter_map(|(product, mut values)| median(&mut values).map(|m| (product, round_rating(m))))
            .collect();

        let customer_region = regions
            .into_iter()
            .filter_map(|(customer, counts)| mode(&counts).map(|region| (customer, region)))
            .collect();

        Self {
            product_rating,
            global_rating,
            customer_region,
        }
    }

    /// Fallback chain for a missing rating: product median, then dataset-wide
    /// median, then 0 (unrated) when the dataset has no rated rows at all.
    pub fn rating_for(&self, product_id: &str) -> u8 {
        self.product_rating
            .get(product_id)
            .copied()
            .or(self.global_rating)
            .unwrap_or(0)
    }

    /// Fallback chain for a missing region: the customer's most frequent
    /// region on file, then the literal "Unknown".
    pub fn region_for(&self, customer_id: &str) -> String {
        self.customer_region
            .get(customer_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Build the canonical table: parse dates, derive calendar fields, and close
/// every hole the feed left open. Any unparseable row fails the whole load;
/// the caller substitutes an empty table for that case.
pub fn prepare(raw: Vec<RawSale>) -> anyhow::Result<Table> {
    let stats = ImputeStats::from_raw(&raw);

    let mut sales = Vec::with_capacity(raw.len());
    for row in raw {
        let date = NaiveDate::parse_from_str(&row.order_date, DATE_FORMAT)
            .with_context(|| format!("bad order_date {:?} on order {}", row.order_date, row.order_id))?;

        let rating = match row.customer_rating {
            Some(r) => round_rating(r),
            None => stats.rating_for(&row.product_id),
        };
        let region = match row.customer_region {
            Some(r) => r,
            None => stats.region_for(&row.customer_id),
        };
        let payment = row.payment_method.unwrap_or_else(|| UNKNOWN.to_string());

        sales.push(Sale::new(
            row.order_id,
            date,
            row.product_id,
            row.product_name,
            row.category,
            row.total_amount,
            row.customer_id,
            region,
            rating,
            payment,
        ));
    }

    Ok(Table::new(sales))
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

fn round_rating(value: f64) -> u8 {
    value.round().clamp(0.0, 5.0) as u8
}

/// Most frequent value; ties go to the lexicographically smallest one so the
/// result does not depend on map iteration order.
fn mode(counts: &AHashMap<String, usize>) -> Option<String> {
    let mut best: Option<(&String, usize)> = None;
    for (value, &count) in counts {
        let better = match best {
            None => true,
            Some((best_value, best_count)) => {
                count > best_count || (count == best_count && value < best_value)
            }
        };
        if better {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.clone())
}
