mod config;
mod datagen;
mod export;
mod impute;
mod loader;
mod log;
mod model;
mod query;

use std::env;
use std::fs;
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use tracing::info;

use crate::model::Table;
use crate::query::{DashboardResult, Filter};

fn main() -> anyhow::Result<()> {
    let _guard = log::init();
    let cfg = config::load()?;

    if let Some(threads) = cfg.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("report");

    match command {
        "report" => {
            let filter = parse_filter(&args[1..])?;
            let table = loader::load_or_empty(&cfg.data_path);
            let start = Instant::now();
            let result = query::run_query(&table, &filter);
            info!(
                "query matched {} of {} rows in {:.3}s",
                result.rows.len(),
                table.len(),
                start.elapsed().as_secs_f64()
            );
            render_report(&table, &result);
        }
        "export" => {
            let filter = parse_filter(&args[1..])?;
            let table = loader::load_or_empty(&cfg.data_path);
            let export = export::export_csv(&table, &filter, Local::now().naive_local())?;
            let target = cfg.export_dir.join(&export.filename);
            fs::write(&target, &export.bytes).with_context(|| format!("write {}", target.display()))?;
            println!("Exported {} rows to {}", export.rows, target.display());
        }
        "generate" => {
            let rows = match args.get(1) {
                Some(v) => v.parse().context("row count must be a number")?,
                None => 2_000,
            };
            let written = datagen::generate_csv(&cfg.data_path, rows)?;
            println!("Generated {} rows into {}", written, cfg.data_path.display());
        }
        other => bail!("unknown command {other:?}; expected report, export, or generate"),
    }

    Ok(())
}

/// Filter flags shared by `report` and `export`:
/// `--from D --to D --region R --category C` (region/category repeatable).
fn parse_filter(args: &[String]) -> anyhow::Result<Filter> {
    let mut filter = Filter::default();
    let mut it = args.iter();
    while let Some(flag) = it.next() {
        match flag.as_str() {
            "--from" => {
                let v = it.next().context("--from needs a date")?;
                filter.date_start = Some(parse_date(v)?);
            }
            "--to" => {
                let v = it.next().context("--to needs a date")?;
                filter.date_end = Some(parse_date(v)?);
            }
            "--region" => {
                let v = it.next().context("--region needs a value")?;
                filter.regions.insert(v.clone());
            }
            "--category" => {
                let v = it.next().context("--category needs a value")?;
                filter.categories.insert(v.clone());
            }
            other => bail!("unrecognized filter flag {other:?}"),
        }
    }
    Ok(filter)
}

fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("bad date {value:?}, expected YYYY-MM-DD"))
}

fn render_report(table: &Table, result: &DashboardResult) {
    print_section_header("SwiftShop Sales Dashboard");

    if let Some((min, max)) = table.date_range() {
        println!("Data range: {min} to {max}");
        println!("Regions:    {}", table.regions().join(", "));
        println!("Categories: {}", table.categories().join(", "));
    }

    print_subsection("KPI Summary");
    println!("  {:<24}{}", "Total revenue:", result.total_revenue_display());
    println!("  {:<24}{}", "Average order value:", result.avg_order_value_display());
    println!("  {:<24}{}", "Customer satisfaction:", result.avg_rating_display());

    if result.rows.is_empty() {
        println!("\nNo data available for the selected filters");
        return;
    }

    print_subsection("Monthly Revenue Trend");
    for (month, revenue) in &result.monthly_revenue {
        println!("  {month}  {:>14}", query::format_currency(*revenue));
    }

    print_subsection("Category Performance");
    for (category, revenue) in &result.category_shares {
        let share = revenue / result.total_revenue * 100.0;
        println!(
            "  {category:<24} {:>14}  ({share:.1}%)",
            query::format_currency(*revenue)
        );
    }

    print_subsection("Rating Distribution");
    let max_count = result.rating_histogram.buckets().map(|(_, c)| c).max().unwrap_or(0);
    for (rating, count) in result.rating_histogram.buckets() {
        let width = if max_count == 0 { 0 } else { (count * 40 / max_count) as usize };
        println!("  {rating} star | {count:>6} {}", "#".repeat(width));
    }

    print_subsection("Top 10 Revenue Generating Products");
    for (rank, (name, revenue)) in result.top_products.iter().enumerate() {
        println!(
            "  {:>2}. {name:<28} {:>14}",
            rank + 1,
            query::format_currency(*revenue)
        );
    }

    print_subsection("Data Preview");
    for sale in result.rows.iter().take(10) {
        println!("  {sale}");
    }
    if result.rows.len() > 10 {
        println!("  ... {} more rows (run export for the full set)", result.rows.len() - 10);
    }
    println!();
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(70));
    println!("  {title}");
    println!("{}\n", "═".repeat(70));
}

fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "─".repeat(60));
}
