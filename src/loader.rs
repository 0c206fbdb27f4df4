use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use tracing::{error, info};

use crate::impute;
use crate::model::{RawSale, Table};

pub fn read_csv(path: &Path) -> anyhow::Result<Vec<RawSale>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        let row: RawSale = record.with_context(|| format!("parse {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Load and prepare the canonical table. Any failure (missing file, bad
/// header, malformed row) degrades to an empty table instead of killing the
/// process; downstream KPIs and charts render their "no data" state.
pub fn load_or_empty(path: &Path) -> Table {
    let start = Instant::now();
    match read_csv(path).and_then(impute::prepare) {
        Ok(table) => {
            info!(
                "loaded {} sales rows from {} in {:.2}s",
                table.len(),
                path.display(),
                start.elapsed().as_secs_f64()
            );
            table
        }
        Err(err) => {
            error!("failed to load sales data: {err:#}");
            Table::default()
        }
    }
}
