use std::collections::{BTreeMap, HashSet};

use ahash::AHashMap;
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

use crate::model::{Sale, Table};

pub const TOP_PRODUCTS: usize = 10;

/// Optional predicates narrowing the canonical table. An absent or empty
/// field leaves its dimension unrestricted; present fields are ANDed.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub regions: HashSet<String>,
    pub categories: HashSet<String>,
}

impl Filter {
    /// The date window only applies when both ends are set, and includes both.
    pub fn matches(&self, sale: &Sale) -> bool {
        if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
            if sale.order_date < start || sale.order_date > end {
                return false;
            }
        }
        if !self.regions.is_empty() && !self.regions.contains(&sale.customer_region) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&sale.category) {
            return false;
        }
        true
    }
}

/// Review counts for ratings 1..=5, ascending. Zero-count buckets stay
/// present so a renderer always sees all five bars; rating 0 (unrated) is
/// never counted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingHistogram {
    counts: [u64; 5],
}

impl RatingHistogram {
    fn record(&mut self, rating: u8) {
        if (1..=5).contains(&rating) {
            self.counts[rating as usize - 1] += 1;
        }
    }

    /// (rating, count) pairs, ascending by rating.
    pub fn buckets(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts.iter().enumerate().map(|(i, &c)| (i as u8 + 1, c))
    }

    /// Number of rated rows.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Everything one filter change produces: KPI scalars, the four chart
/// datasets, and the filtered rows for the table view and export. An empty
/// `rows` is a valid terminal state, not an error; the scalars then render
/// their "no data" sentinels.
#[derive(Debug, Clone)]
pub struct DashboardResult {
    pub total_revenue: f64,
    pub avg_order_value: Option<f64>,
    pub avg_rating: Option<f64>,
    /// Revenue per "YYYY-MM" bucket; iteration is ordered ascending by key
    /// and restartable.
    pub monthly_revenue: BTreeMap<String, f64>,
    /// Revenue per category, descending; the consumer renders proportions.
    pub category_shares: Vec<(String, f64)>,
    pub rating_histogram: RatingHistogram,
    /// Top products by revenue, descending; ties break on the product name
    /// ascending.
    pub top_products: Vec<(String, f64)>,
    /// Filtered records in canonical table order.
    pub rows: Vec<Sale>,
}

impl DashboardResult {
    pub fn total_revenue_display(&self) -> String {
        format_currency(self.total_revenue)
    }

    pub fn avg_order_value_display(&self) -> String {
        match self.avg_order_value {
            Some(v) => format_currency(v),
            None => "N/A".to_string(),
        }
    }

    pub fn avg_rating_display(&self) -> String {
        match self.avg_rating {
            Some(v) => format!("{v:.1}/5.0"),
            None => "N/A".to_string(),
        }
    }
}

/// Pure function of (table, filter): derives the filtered view and computes
/// every KPI and chart dataset in one pass over it.
pub fn run_query(table: &Table, filter: &Filter) -> DashboardResult {
    let rows: Vec<Sale> = table.iter().filter(|s| filter.matches(s)).cloned().collect();

    let total_revenue: f64 = rows.iter().map(|s| s.total_amount).sum();

    let mut order_totals: AHashMap<&str, f64> = AHashMap::new();
    let mut monthly_revenue: BTreeMap<String, f64> = BTreeMap::new();
    let mut category_revenue: AHashMap<&str, f64> = AHashMap::new();
    let mut product_revenue: AHashMap<&str, f64> = AHashMap::new();
    let mut rating_histogram = RatingHistogram::default();
    let mut rating_sum: u64 = 0;

    for sale in &rows {
        *order_totals.entry(sale.order_id.as_str()).or_insert(0.0) += sale.total_amount;
        *monthly_revenue.entry(sale.month_key.clone()).or_insert(0.0) += sale.total_amount;
        *category_revenue.entry(sale.category.as_str()).or_insert(0.0) += sale.total_amount;
        *product_revenue.entry(sale.product_name.as_str()).or_insert(0.0) += sale.total_amount;
        rating_histogram.record(sale.customer_rating);
        if sale.customer_rating > 0 {
            rating_sum += sale.customer_rating as u64;
        }
    }

    // An order can span several rows; the KPI averages over distinct orders.
    let avg_order_value = if order_totals.is_empty() {
        None
    } else {
        Some(order_totals.values().sum::<f64>() / order_totals.len() as f64)
    };

    let rated = rating_histogram.total();
    let avg_rating = if rated == 0 {
        None
    } else {
        Some(rating_sum as f64 / rated as f64)
    };

    let category_shares = sorted_by_revenue(category_revenue);
    let mut top_products = sorted_by_revenue(product_revenue);
    top_products.truncate(TOP_PRODUCTS);

    DashboardResult {
        total_revenue,
        avg_order_value,
        avg_rating,
        monthly_revenue,
        category_shares,
        rating_histogram,
        top_products,
        rows,
    }
}

/// Descending revenue, ties broken on the name ascending, so the order never
/// depends on hash-map iteration.
fn sorted_by_revenue(map: AHashMap<&str, f64>) -> Vec<(String, f64)> {
    let mut pairs: Vec<(String, f64)> = map.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs
}

/// "$1,234.56"-style rendering with thousands separators.
pub fn format_currency(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let dollars = (cents / 100).to_formatted_string(&Locale::en);
    format!("${}.{:02}", dollars, (cents % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(
        order: &str,
        date: &str,
        product: &str,
        category: &str,
        amount: f64,
        region: &str,
        rating: u8,
    ) -> Sale {
        Sale::new(
            order.into(),
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            format!("ID-{product}"),
            product.into(),
            category.into(),
            amount,
            "CUST-1".into(),
            region.into(),
            rating,
            "Credit Card".into(),
        )
    }

    fn sample_table() -> Table {
        Table::new(vec![
            sale("O1", "2025-01-10", "Lamp", "Home", 100.0, "West", 5),
            sale("O1", "2025-01-10", "Rug", "Home", 50.0, "West", 5),
            sale("O2", "2025-02-02", "Lamp", "Home", 80.0, "East", 4),
            sale("O3", "2025-02-20", "Novel", "Books", 20.0, "West", 0),
            sale("O4", "2025-03-01", "Atlas", "Books", 60.0, "North", 3),
        ])
    }

    #[test]
    fn empty_filter_reproduces_dataset_totals() {
        let table = sample_table();
        let result = run_query(&table, &Filter::default());
        assert_eq!(result.rows.len(), table.len());
        assert!((result.total_revenue - 310.0).abs() < 1e-9);
    }

    #[test]
    fn filtered_revenue_never_exceeds_unfiltered() {
        let table = sample_table();
        let all = run_query(&table, &Filter::default()).total_revenue;
        let filter = Filter {
            regions: HashSet::from(["West".to_string()]),
            ..Filter::default()
        };
        assert!(run_query(&table, &filter).total_revenue <= all);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let table = sample_table();
        let filter = Filter {
            date_start: NaiveDate::from_ymd_opt(2025, 1, 10),
            date_end: NaiveDate::from_ymd_opt(2025, 2, 2),
            ..Filter::default()
        };
        let result = run_query(&table, &filter);
        // rows exactly on both boundaries are kept
        assert_eq!(result.rows.len(), 3);
    }

    #[test]
    fn date_filter_needs_both_ends() {
        let table = sample_table();
        let filter = Filter {
            date_start: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Filter::default()
        };
        assert_eq!(run_query(&table, &filter).rows.len(), table.len());
    }

    #[test]
    fn region_and_category_filters_are_anded() {
        let table = sample_table();
        let filter = Filter {
            regions: HashSet::from(["West".to_string()]),
            categories: HashSet::from(["Books".to_string()]),
            ..Filter::default()
        };
        let result = run_query(&table, &filter);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].product_name, "Novel");
    }

    #[test]
    fn avg_order_value_groups_multi_row_orders() {
        let table = Table::new(vec![
            sale("O1", "2025-01-10", "Lamp", "Home", 100.0, "West", 5),
            sale("O1", "2025-01-10", "Rug", "Home", 50.0, "West", 5),
        ]);
        let result = run_query(&table, &Filter::default());
        assert_eq!(result.avg_order_value, Some(150.0));
        assert_eq!(result.avg_order_value_display(), "$150.00");
    }

    #[test]
    fn rating_kpis_exclude_unrated_rows() {
        let table = Table::new(vec![
            sale("O1", "2025-01-01", "A", "X", 1.0, "West", 5),
            sale("O2", "2025-01-02", "A", "X", 1.0, "West", 5),
            sale("O3", "2025-01-03", "A", "X", 1.0, "West", 4),
            sale("O4", "2025-01-04", "A", "X", 1.0, "West", 0),
            sale("O5", "2025-01-05", "A", "X", 1.0, "West", 3),
        ]);
        let result = run_query(&table, &Filter::default());
        assert_eq!(result.avg_rating, Some(4.25));
        let histogram: Vec<(u8, u64)> = result.rating_histogram.buckets().collect();
        assert_eq!(histogram, vec![(1, 0), (2, 0), (3, 1), (4, 1), (5, 2)]);
    }

    #[test]
    fn monthly_series_is_ordered_ascending() {
        let table = Table::new(vec![
            sale("O1", "2025-03-05", "A", "X", 10.0, "West", 1),
            sale("O2", "2024-11-20", "A", "X", 20.0, "West", 1),
            sale("O3", "2025-01-15", "A", "X", 30.0, "West", 1),
        ]);
        let result = run_query(&table, &Filter::default());
        let months: Vec<&String> = result.monthly_revenue.keys().collect();
        assert_eq!(months, vec!["2024-11", "2025-01", "2025-03"]);
    }

    #[test]
    fn category_shares_sum_to_total_revenue() {
        let table = sample_table();
        let result = run_query(&table, &Filter::default());
        let share_sum: f64 = result.category_shares.iter().map(|(_, v)| v).sum();
        assert!((share_sum - result.total_revenue).abs() < 1e-9);
    }

    #[test]
    fn top_products_rank_descending_with_name_tiebreak() {
        let table = Table::new(vec![
            sale("O1", "2025-01-01", "Zebra Mug", "X", 40.0, "West", 1),
            sale("O2", "2025-01-02", "Apple Mug", "X", 40.0, "West", 1),
            sale("O3", "2025-01-03", "Big Desk", "X", 90.0, "West", 1),
        ]);
        let result = run_query(&table, &Filter::default());
        let names: Vec<&String> = result.top_products.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Big Desk", "Apple Mug", "Zebra Mug"]);
    }

    #[test]
    fn top_products_keeps_at_most_ten() {
        let sales: Vec<Sale> = (0..15)
            .map(|i| {
                sale(
                    &format!("O{i}"),
                    "2025-01-01",
                    &format!("Product {i:02}"),
                    "X",
                    (i + 1) as f64,
                    "West",
                    1,
                )
            })
            .collect();
        let result = run_query(&Table::new(sales), &Filter::default());
        assert_eq!(result.top_products.len(), TOP_PRODUCTS);
        assert_eq!(result.top_products[0].0, "Product 14");
    }

    #[test]
    fn empty_result_reports_no_data_sentinels() {
        let table = sample_table();
        let filter = Filter {
            regions: HashSet::from(["Atlantis".to_string()]),
            ..Filter::default()
        };
        let result = run_query(&table, &filter);
        assert!(result.rows.is_empty());
        assert_eq!(result.total_revenue_display(), "$0.00");
        assert_eq!(result.avg_order_value_display(), "N/A");
        assert_eq!(result.avg_rating_display(), "N/A");
        assert!(result.monthly_revenue.is_empty());
        assert!(result.category_shares.is_empty());
        assert!(result.top_products.is_empty());
        assert_eq!(result.rating_histogram.total(), 0);
    }

    #[test]
    fn rows_keep_canonical_order() {
        let table = sample_table();
        let filter = Filter {
            categories: HashSet::from(["Home".to_string()]),
            ..Filter::default()
        };
        let result = run_query(&table, &filter);
        let orders: Vec<&String> = result.rows.iter().map(|s| &s.order_id).collect();
        assert_eq!(orders, vec!["O1", "O1", "O2"]);
    }

    #[test]
    fn currency_formatting_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(1000.5), "$1,000.50");
    }
}
