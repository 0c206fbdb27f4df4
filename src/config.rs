use std::path::PathBuf;

use config::Config;
use serde::Deserialize;

/// Runtime settings, read from an optional `analytics.toml` in the working
/// directory. A missing file or missing keys fall back to the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Source CSV for the canonical table.
    pub data_path: PathBuf,
    /// Directory that `export` writes into.
    pub export_dir: PathBuf,
    /// Worker threads for the one-time preparation pass. None = rayon default.
    pub num_threads: Option<usize>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("swiftshop_sales_data.csv"),
            export_dir: PathBuf::from("."),
            num_threads: None,
        }
    }
}

pub fn load() -> anyhow::Result<AnalyticsConfig> {
    let cfg = Config::builder()
        .add_source(config::File::with_name("analytics").required(false))
        .build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let cfg = AnalyticsConfig::default();
        assert_eq!(cfg.data_path, PathBuf::from("swiftshop_sales_data.csv"));
        assert_eq!(cfg.export_dir, PathBuf::from("."));
        assert!(cfg.num_threads.is_none());
    }
}
