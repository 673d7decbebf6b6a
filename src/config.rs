//! Run configuration.
//!
//! All paths and tunables are resolved once at process start into plain
//! values that get threaded through every component call; nothing here is
//! process-global or mutable. Tunables can be overridden from a YAML
//! settings file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Resolved file locations for one ETL run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EtlConfig {
    pub raw_orders: PathBuf,
    pub raw_users: PathBuf,
    pub out_users: PathBuf,
    pub out_orders_clean: PathBuf,
    pub out_analytics: PathBuf,
    pub out_summary: PathBuf,
    pub out_missingness: PathBuf,
    pub run_meta: PathBuf,
}

impl EtlConfig {
    /// Derives the standard output layout under `out_dir`.
    pub fn with_out_dir(raw_orders: &Path, raw_users: &Path, out_dir: &Path) -> Self {
        Self {
            raw_orders: raw_orders.to_path_buf(),
            raw_users: raw_users.to_path_buf(),
            out_users: out_dir.join("users.csv"),
            out_orders_clean: out_dir.join("orders_clean.csv"),
            out_analytics: out_dir.join("orders_analytics.csv"),
            out_summary: out_dir.join("run_summary.csv"),
            out_missingness: out_dir.join("missingness.csv"),
            run_meta: out_dir.join("run_meta.json"),
        }
    }
}

/// Pipeline tunables, overridable from a YAML settings file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Synonym dictionary applied to the normalized status column.
    pub status_map: BTreeMap<String, String>,
    /// Tukey fence multiplier for the outlier flag.
    pub outlier_k: f64,
    /// Lower winsorization quantile.
    pub winsor_lo: f64,
    /// Upper winsorization quantile.
    pub winsor_hi: f64,
    /// Accept offset-less timestamps as already being UTC.
    pub assume_utc: bool,
    /// When set, amounts outside [0, max_amount] abort the run.
    pub max_amount: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        let status_map = [("paid", "paid"), ("refund", "refund"), ("refunded", "refund")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            status_map,
            outlier_k: 1.5,
            winsor_lo: 0.01,
            winsor_hi: 0.99,
            assume_utc: true,
            max_amount: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Opening settings file {path:?}"))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing settings YAML {path:?}"))
    }
}
