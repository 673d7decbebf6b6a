//! Missing-value diagnostics and indicator flags.

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    data::Value,
    frame::{Column, Frame},
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MissingStat {
    pub column: String,
    pub missing: usize,
    pub proportion: f64,
}

/// Per-column null counts and proportions, sorted descending by proportion.
/// Ties keep the frame's column order. Diagnostic only; nothing in the
/// pipeline feeds off this.
pub fn missingness_report(frame: &Frame) -> Vec<MissingStat> {
    let height = frame.height();
    frame
        .columns()
        .iter()
        .map(|column| {
            let missing = column.null_count();
            let proportion = if height == 0 {
                0.0
            } else {
                missing as f64 / height as f64
            };
            MissingStat {
                column: column.name.clone(),
                missing,
                proportion,
            }
        })
        .sorted_by(|a, b| b.proportion.total_cmp(&a.proportion))
        .collect()
}

/// Renders a report for ASCII-table output.
pub fn report_rows(stats: &[MissingStat]) -> Vec<Vec<String>> {
    stats
        .iter()
        .map(|stat| {
            vec![
                stat.column.clone(),
                stat.missing.to_string(),
                format!("{:.4}", stat.proportion),
            ]
        })
        .collect()
}

/// Adds one total boolean `<col>__isna` column per requested column. The
/// source columns, nulls included, are left untouched.
pub fn add_missing_flags(frame: Frame, cols: &[&str]) -> Result<Frame> {
    let mut result = frame;
    for col in cols {
        let source = result.require_column(col)?;
        let flags = source
            .values
            .iter()
            .map(|cell| Some(Value::Bool(cell.is_none())))
            .collect();
        result = result.with_column(Column::new(format!("{col}__isna"), flags))?;
    }
    Ok(result)
}
