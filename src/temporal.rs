//! Timestamp parsing and calendar decomposition.

use anyhow::Result;
use chrono::{Datelike, Timelike};

use crate::{
    data::{Value, parse_utc_datetime},
    frame::{Column, Frame},
};

/// Parses a text column into UTC timestamps in place. Unparseable values
/// become null; already-parsed timestamps survive re-runs unchanged.
pub fn parse_datetime(frame: Frame, col: &str, assume_utc: bool) -> Result<Frame> {
    let source = frame.require_column(col)?;
    let values = source
        .values
        .iter()
        .map(|cell| match cell {
            Some(Value::Timestamp(ts)) => Some(Value::Timestamp(*ts)),
            Some(value) => value
                .as_str()
                .and_then(|raw| parse_utc_datetime(raw, assume_utc).ok())
                .map(Value::Timestamp),
            None => None,
        })
        .collect();
    frame.with_column(Column::new(col, values))
}

/// Derives calendar parts from a parsed timestamp column: `date`, `year`,
/// `month` as a zero-padded "YYYY-MM" string (so lexical order is
/// chronological order), `dow` as the full English weekday name, and `hour`.
/// Every derived cell is null where the timestamp is null.
pub fn add_time_parts(frame: Frame, ts_col: &str) -> Result<Frame> {
    let timestamps: Vec<Option<chrono::DateTime<chrono::Utc>>> = frame
        .require_column(ts_col)?
        .values
        .iter()
        .map(|cell| match cell {
            Some(Value::Timestamp(ts)) => Some(*ts),
            _ => None,
        })
        .collect();

    let part = |f: &dyn Fn(&chrono::DateTime<chrono::Utc>) -> Value| -> Vec<Option<Value>> {
        timestamps.iter().map(|ts| ts.as_ref().map(f)).collect()
    };

    frame
        .with_column(Column::new(
            "date",
            part(&|ts| Value::Date(ts.date_naive())),
        ))?
        .with_column(Column::new(
            "year",
            part(&|ts| Value::Int(i64::from(ts.year()))),
        ))?
        .with_column(Column::new(
            "month",
            part(&|ts| Value::Str(ts.format("%Y-%m").to_string())),
        ))?
        .with_column(Column::new(
            "dow",
            part(&|ts| Value::Str(ts.format("%A").to_string())),
        ))?
        .with_column(Column::new(
            "hour",
            part(&|ts| Value::Int(i64::from(ts.hour()))),
        ))
}
