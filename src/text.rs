//! Text normalization and synonym mapping for categorical columns.
//!
//! Normalization runs before mapping so that mapping keys only ever need to
//! be written in canonical lowercase form.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::{data::Value, frame::Column};

/// Trim, lowercase, and collapse internal whitespace runs to single spaces.
/// Borrows the input when it is already in normal form.
pub fn normalize_str(input: &str) -> Cow<'_, str> {
    let needs_work = input != input.trim()
        || input.chars().any(char::is_uppercase)
        || input.split(' ').any(str::is_empty)
        || input.contains(|c: char| c.is_whitespace() && c != ' ');
    if needs_work {
        Cow::Owned(
            input
                .split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(" "),
        )
    } else {
        Cow::Borrowed(input)
    }
}

/// Normalizes every non-null value of a free-text column; null stays null,
/// non-text values pass through unchanged.
pub fn normalize_text(column: &Column) -> Column {
    let values = column
        .values
        .iter()
        .map(|cell| {
            cell.as_ref().map(|value| match value.as_str() {
                Some(text) => Value::Str(normalize_str(text).into_owned()),
                None => value.clone(),
            })
        })
        .collect();
    Column::new(column.name.clone(), values)
}

/// Replaces values present as mapping keys with their canonical form;
/// everything else, null included, passes through unchanged.
pub fn apply_mapping(column: &Column, mapping: &BTreeMap<String, String>) -> Column {
    let values = column
        .values
        .iter()
        .map(|cell| {
            cell.as_ref().map(|value| match value.as_str() {
                Some(text) => match mapping.get(text) {
                    Some(canonical) => Value::Str(canonical.clone()),
                    None => value.clone(),
                },
                None => value.clone(),
            })
        })
        .collect();
    Column::new(column.name.clone(), values)
}
