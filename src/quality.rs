//! Fail-fast data quality gate.
//!
//! Each check raises a descriptive [`QualityError`] instead of returning a
//! boolean, so a violated precondition aborts the run before any output is
//! written. The orchestrator applies these twice: structural checks right
//! after raw load, row-count and cardinality checks right after the join.

use itertools::Itertools;
use thiserror::Error;

use crate::frame::{Column, Frame};

#[derive(Debug, Error)]
pub enum QualityError {
    #[error("{table} is missing required column(s): {}", .missing.join(", "))]
    MissingColumns { table: String, missing: Vec<String> },
    #[error("{table} has 0 rows")]
    EmptyTable { table: String },
    #[error("key '{key}' contains {nulls} null value(s)")]
    NullKey { key: String, nulls: usize },
    #[error("key '{key}' is not unique; {duplicates} duplicate row(s)")]
    DuplicateKey { key: String, duplicates: usize },
    #[error("{label}: {violations} value(s) outside [{lo}, {hi}]")]
    OutOfRange {
        label: String,
        lo: f64,
        hi: f64,
        violations: usize,
    },
    #[error(
        "join on '{on}' violates {validate} cardinality: {duplicates} duplicate key row(s) on the right side"
    )]
    JoinCardinality {
        on: String,
        validate: String,
        duplicates: usize,
    },
    #[error("join on '{on}' changed row count: {before} -> {after}")]
    RowCountChanged {
        on: String,
        before: usize,
        after: usize,
    },
}

pub fn require_columns(frame: &Frame, table: &str, names: &[&str]) -> Result<(), QualityError> {
    let missing: Vec<String> = names
        .iter()
        .filter(|name| frame.column(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(QualityError::MissingColumns {
            table: table.to_string(),
            missing,
        })
    }
}

pub fn assert_non_empty(frame: &Frame, table: &str) -> Result<(), QualityError> {
    if frame.is_empty() {
        Err(QualityError::EmptyTable {
            table: table.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Asserts that a key column is unique, optionally allowing nulls. The
/// duplicate count reports every row involved in a collision, so two
/// duplicated pairs count as four rows.
pub fn assert_unique_key(frame: &Frame, key: &str, allow_na: bool) -> Result<(), QualityError> {
    let column = frame.column(key).ok_or_else(|| QualityError::MissingColumns {
        table: "frame".to_string(),
        missing: vec![key.to_string()],
    })?;

    if !allow_na {
        let nulls = column.null_count();
        if nulls > 0 {
            return Err(QualityError::NullKey {
                key: key.to_string(),
                nulls,
            });
        }
    }

    let counts = column
        .values
        .iter()
        .flatten()
        .map(|value| value.as_display())
        .counts();
    let duplicates: usize = counts.values().filter(|&&n| n > 1).sum();
    if duplicates > 0 {
        Err(QualityError::DuplicateKey {
            key: key.to_string(),
            duplicates,
        })
    } else {
        Ok(())
    }
}

/// Asserts all non-null numeric values lie within the closed interval
/// `[lo, hi]`. Nulls are ignored.
pub fn assert_in_range(
    column: &Column,
    lo: f64,
    hi: f64,
    label: &str,
) -> Result<(), QualityError> {
    let violations = column
        .numeric_values()
        .into_iter()
        .filter(|v| *v < lo || *v > hi)
        .count();
    if violations > 0 {
        Err(QualityError::OutOfRange {
            label: label.to_string(),
            lo,
            hi,
            violations,
        })
    } else {
        Ok(())
    }
}
