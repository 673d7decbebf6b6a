//! Schema enforcement for raw text tables.
//!
//! Raw inputs arrive with every column typed as text. [`enforce_schema()`]
//! coerces the order columns into their canonical types with a
//! convert-or-null policy: a cell that fails to parse becomes null, never an
//! error, and no row is ever dropped.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    data::{Value, coerce_float, coerce_int},
    frame::{Column, Frame},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
}

/// Coerces one column to the given type, mapping parse failures to null.
/// Cells that are already typed are rendered back to text first so repeated
/// enforcement is a no-op.
pub fn coerce_column(frame: Frame, name: &str, ty: ColumnType) -> Result<Frame> {
    let source = frame.require_column(name)?;
    let values = source
        .values
        .iter()
        .map(|cell| {
            let raw = cell.as_ref().map(Value::as_display)?;
            match ty {
                ColumnType::Text => Some(Value::Str(raw)),
                ColumnType::Integer => coerce_int(&raw).map(Value::Int),
                ColumnType::Float => coerce_float(&raw).map(Value::Float),
            }
        })
        .collect();
    frame.with_column(Column::new(name, values))
}

/// Applies the canonical order-table schema: identifiers stay text, amount
/// becomes a nullable float, quantity a nullable integer.
pub fn enforce_schema(frame: Frame) -> Result<Frame> {
    let frame = coerce_column(frame, "order_id", ColumnType::Text)?;
    let frame = coerce_column(frame, "user_id", ColumnType::Text)?;
    let frame = coerce_column(frame, "amount", ColumnType::Float)?;
    coerce_column(frame, "quantity", ColumnType::Integer)
}
