//! In-memory columnar table.
//!
//! A [`Frame`] is an ordered list of equal-length named columns where every
//! cell is an `Option<Value>` (`None` = null). Transforms never mutate a
//! frame in place; they consume one and return a new value, which keeps the
//! pipeline composable and each step testable in isolation.

use anyhow::{Result, anyhow};

use crate::data::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<Value>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<Value>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Non-null cells viewed as floats, skipping non-numeric values.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .flatten()
            .filter_map(Value::as_f64)
            .collect()
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows. A frame with no columns has zero rows.
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| anyhow!("Column '{name}' not found in frame"))
    }

    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.height() {
            return Err(anyhow!(
                "Column '{}' has {} row(s), frame has {}",
                column.name,
                column.len(),
                self.height()
            ));
        }
        if self.column_index(&column.name).is_some() {
            return Err(anyhow!("Frame already has a column named '{}'", column.name));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Assign-and-return: replaces the same-named column in place, or appends
    /// a new one at the end. The input frame is consumed.
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        if !self.columns.is_empty() && column.len() != self.height() {
            return Err(anyhow!(
                "Column '{}' has {} row(s), frame has {}",
                column.name,
                column.len(),
                self.height()
            ));
        }
        match self.column_index(&column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(self)
    }

    pub fn drop_columns(mut self, names: &[String]) -> Self {
        self.columns.retain(|c| !names.contains(&c.name));
        self
    }

    /// One row rendered for delimited output; nulls become empty strings.
    pub fn render_row(&self, idx: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| {
                c.values
                    .get(idx)
                    .and_then(|v| v.as_ref())
                    .map(Value::as_display)
                    .unwrap_or_default()
            })
            .collect()
    }
}
