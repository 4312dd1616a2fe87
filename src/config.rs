use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Settings read from an optional JSON file.  Missing keys fall back to the
/// defaults below; command-line flags override both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Transaction table loaded at startup.
    pub data_path: PathBuf,
    /// How many products the product chart keeps.
    pub top_products: usize,
    /// How many products can be priced side by side.
    pub max_price_lookups: usize,
    /// Rows shown in the data summary table.
    pub preview_rows: usize,
    /// Families selected in the product chart when a dataset is opened.
    pub default_families: Vec<String>,
    /// Products priced when a dataset is opened.
    pub default_products: Vec<String>,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("df_limpio.csv"),
            top_products: 20,
            max_price_lookups: 2,
            preview_rows: 5,
            default_families: vec!["RICE BOWL".to_string(), "NOODLES".to_string()],
            default_products: vec!["Pad Thai".to_string(), "Nasi Goreng".to_string()],
            window_width: 1280.0,
            window_height: 860.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
