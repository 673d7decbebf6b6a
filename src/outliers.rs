//! IQR outlier fences and quantile winsorization.
//!
//! Two deliberately distinct notions of "extreme" live here: the Tukey
//! fence (Q1/Q3 ± k·IQR) marks moderately-unusual values with a flag, while
//! winsorizing clips only the far tail at fixed quantiles (1%/99% by
//! default) without touching the flag.

use anyhow::Result;

use crate::{
    data::Value,
    frame::{Column, Frame},
};

/// Quantile by linear interpolation over a sorted slice. `None` when empty.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = position - lower as f64;
    Some(sorted[lower] + weight * (sorted[upper] - sorted[lower]))
}

/// Tukey fences over the non-null values: `(Q1 - k*IQR, Q3 + k*IQR)`.
/// `None` when the column has no numeric values.
pub fn iqr_bounds(column: &Column, k: f64) -> Option<(f64, f64)> {
    let mut values = column.numeric_values();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let q1 = quantile(&values, 0.25)?;
    let q3 = quantile(&values, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - k * iqr, q3 + k * iqr))
}

/// Clips every numeric value into the `[quantile(lo), quantile(hi)]` range
/// of the column's non-null values. Null stays null; an all-null column
/// comes back unchanged.
pub fn winsorize(column: &Column, lo: f64, hi: f64) -> Column {
    let mut values = column.numeric_values();
    if values.is_empty() {
        return column.clone();
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let lower = quantile(&values, lo).expect("non-empty values");
    let upper = quantile(&values, hi).expect("non-empty values");

    let clipped = column
        .values
        .iter()
        .map(|cell| {
            cell.as_ref().map(|value| match value.as_f64() {
                Some(v) => Value::Float(v.clamp(lower, upper)),
                None => value.clone(),
            })
        })
        .collect();
    Column::new(column.name.clone(), clipped)
}

/// Adds a total boolean `<col>__is_outlier` column: true where the value
/// falls outside the IQR fences. Nulls are never flagged, and a column with
/// no numeric values flags everything false.
pub fn add_outlier_flag(frame: Frame, col: &str, k: f64) -> Result<Frame> {
    let source = frame.require_column(col)?;
    let bounds = iqr_bounds(source, k);
    let flags = source
        .values
        .iter()
        .map(|cell| {
            let flagged = match (cell.as_ref().and_then(Value::as_f64), bounds) {
                (Some(v), Some((lower, upper))) => v < lower || v > upper,
                _ => false,
            };
            Some(Value::Bool(flagged))
        })
        .collect();
    frame.with_column(Column::new(format!("{col}__is_outlier"), flags))
}
