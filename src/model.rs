use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

/// One row of the source CSV, exactly as it arrives. The three columns that
/// can be empty in the feed stay `Option` here; everything downstream works
/// on [`Sale`], which has no holes left.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSale {
    pub order_id: String,
    pub order_date: String,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub total_amount: f64,
    pub customer_id: String,
    pub customer_region: Option<String>,
    pub customer_rating: Option<f64>,
    pub payment_method: Option<String>,
}

/// A fully imputed sales record. `customer_rating` is 0..=5, where 0 means
/// the customer left no rating; `customer_region` and `payment_method` fall
/// back to "Unknown" when the source had nothing usable.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub total_amount: f64,
    pub customer_id: String,
    pub customer_region: String,
    pub customer_rating: u8,
    pub payment_method: String,

    // Derived once at load, always consistent with order_date
    pub year: i32,
    pub month: u32,
    pub month_key: String,
}

impl Sale {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: String,
        order_date: NaiveDate,
        product_id: String,
        product_name: String,
        category: String,
        total_amount: f64,
        customer_id: String,
        customer_region: String,
        customer_rating: u8,
        payment_method: String,
    ) -> Self {
        Self {
            year: order_date.year(),
            month: order_date.month(),
            month_key: month_key(order_date),
            order_id,
            order_date,
            product_id,
            product_name,
            category,
            total_amount,
            customer_id,
            customer_region,
            customer_rating,
            payment_method,
        }
    }
}

impl fmt::Display for Sale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sale({} {} {} ${:.2} {} rating={})",
            self.order_id,
            self.order_date,
            self.product_name,
            self.total_amount,
            self.customer_region,
            self.customer_rating,
        )
    }
}

/// Monthly bucket key used by the revenue trend, e.g. "2025-03".
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// The canonical table: built once by the preparer, read-only afterwards.
/// Queries never mutate it; they derive fresh views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    sales: Vec<Sale>,
}

impl Table {
    pub fn new(sales: Vec<Sale>) -> Self {
        Self { sales }
    }

    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sale> {
        self.sales.iter()
    }

    /// Distinct regions, sorted. Feeds the presentation layer's filter choices.
    pub fn regions(&self) -> Vec<String> {
        self.distinct(|s| &s.customer_region)
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.distinct(|s| &s.category)
    }

    /// Earliest and latest order date, or None for an empty table.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.sales.iter().map(|s| s.order_date).min()?;
        let max = self.sales.iter().map(|s| s.order_date).max()?;
        Some((min, max))
    }

    fn distinct<F>(&self, field: F) -> Vec<String>
    where
        F: Fn(&Sale) -> &String,
    {
        let set: BTreeSet<&String> = self.sales.iter().map(field).collect();
        set.into_iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_pads_single_digit_months() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(month_key(date), "2025-03");
    }

    #[test]
    fn new_sale_derives_calendar_fields() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let sale = Sale::new(
            "ORD-1".into(),
            date,
            "P-1".into(),
            "Widget".into(),
            "Gadgets".into(),
            19.99,
            "CUST-1".into(),
            "West".into(),
            4,
            "Credit Card".into(),
        );
        assert_eq!(sale.year, 2024);
        assert_eq!(sale.month, 12);
        assert_eq!(sale.month_key, "2024-12");
    }

    #[test]
    fn distinct_values_are_sorted_and_deduped() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mk = |region: &str, category: &str| {
            Sale::new(
                "ORD-1".into(),
                date,
                "P-1".into(),
                "Widget".into(),
                category.into(),
                10.0,
                "CUST-1".into(),
                region.into(),
                5,
                "PayPal".into(),
            )
        };
        let table = Table::new(vec![mk("West", "Toys"), mk("East", "Toys"), mk("West", "Books")]);
        assert_eq!(table.regions(), vec!["East".to_string(), "West".to_string()]);
        assert_eq!(table.categories(), vec!["Books".to_string(), "Toys".to_string()]);
    }
}
