//! Validated left join.
//!
//! The join is the one place a batch pipeline can silently multiply rows: a
//! key collision on the right side duplicates every left row it matches and
//! skews every downstream metric. [`safe_left_join()`] therefore requires an
//! explicit [`JoinValidate`] cardinality contract and refuses to join when
//! the data violates it.

use std::collections::HashMap;
use std::fmt;

use anyhow::{Result, anyhow};
use itertools::Itertools;

use crate::{
    data::Value,
    frame::{Column, Frame},
    quality::QualityError,
};

const KEY_SEPARATOR: &str = "\u{1f}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinValidate {
    /// Left keys may repeat; each must match at most one right row.
    ManyToOne,
    /// Keys must be unique on both sides.
    OneToOne,
}

impl fmt::Display for JoinValidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinValidate::ManyToOne => write!(f, "many_to_one"),
            JoinValidate::OneToOne => write!(f, "one_to_one"),
        }
    }
}

/// Left outer join on `on`. Every left row appears exactly once in the
/// output; unmatched rows get nulls for all right-side columns; rows with a
/// null key on either side never match. Colliding non-key column names are
/// disambiguated with `suffixes` (left, right), where an empty suffix keeps
/// the original name.
pub fn safe_left_join(
    left: &Frame,
    right: &Frame,
    on: &[&str],
    validate: JoinValidate,
    suffixes: (&str, &str),
) -> Result<Frame> {
    if on.is_empty() {
        return Err(anyhow!("Join requires at least one key column"));
    }
    for key in on {
        left.require_column(key)?;
        right.require_column(key)?;
    }

    let left_keys = composite_keys(left, on);
    let right_keys = composite_keys(right, on);
    check_cardinality(&left_keys, &right_keys, on, validate)?;

    let mut right_lookup: HashMap<&str, usize> = HashMap::new();
    for (row, key) in right_keys.iter().enumerate() {
        if let Some(key) = key {
            right_lookup.insert(key.as_str(), row);
        }
    }

    let matches: Vec<Option<usize>> = left_keys
        .iter()
        .map(|key| {
            key.as_ref()
                .and_then(|k| right_lookup.get(k.as_str()).copied())
        })
        .collect();

    let left_names = left.headers();
    let collisions: Vec<String> = right
        .columns()
        .iter()
        .map(|c| c.name.clone())
        .filter(|name| !on.contains(&name.as_str()) && left_names.contains(name))
        .collect();

    let mut joined = Frame::new();
    for column in left.columns() {
        let name = if collisions.contains(&column.name) && !suffixes.0.is_empty() {
            format!("{}{}", column.name, suffixes.0)
        } else {
            column.name.clone()
        };
        joined.push_column(Column::new(name, column.values.clone()))?;
    }
    for column in right.columns() {
        if on.contains(&column.name.as_str()) {
            continue;
        }
        let name = if collisions.contains(&column.name) {
            format!("{}{}", column.name, suffixes.1)
        } else {
            column.name.clone()
        };
        let values = matches
            .iter()
            .map(|m| m.and_then(|row| column.values[row].clone()))
            .collect();
        joined.push_column(Column::new(name, values))?;
    }

    debug_assert_eq!(joined.height(), left.height());
    Ok(joined)
}

/// One composite key string per row; `None` when any key part is null.
fn composite_keys(frame: &Frame, on: &[&str]) -> Vec<Option<String>> {
    let key_columns: Vec<&Column> = on
        .iter()
        .map(|key| frame.column(key).expect("key presence checked by caller"))
        .collect();
    (0..frame.height())
        .map(|row| {
            key_columns
                .iter()
                .map(|column| column.values[row].as_ref().map(Value::as_display))
                .collect::<Option<Vec<String>>>()
                .map(|parts| parts.join(KEY_SEPARATOR))
        })
        .collect()
}

fn check_cardinality(
    left_keys: &[Option<String>],
    right_keys: &[Option<String>],
    on: &[&str],
    validate: JoinValidate,
) -> Result<(), QualityError> {
    let duplicate_rows = |keys: &[Option<String>]| -> usize {
        keys.iter()
            .flatten()
            .counts()
            .values()
            .filter(|&&n| n > 1)
            .sum()
    };

    let right_duplicates = duplicate_rows(right_keys);
    if right_duplicates > 0 {
        return Err(QualityError::JoinCardinality {
            on: on.join(", "),
            validate: validate.to_string(),
            duplicates: right_duplicates,
        });
    }
    if validate == JoinValidate::OneToOne {
        let left_duplicates = duplicate_rows(left_keys);
        if left_duplicates > 0 {
            return Err(QualityError::DuplicateKey {
                key: on.join(", "),
                duplicates: left_duplicates,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_column(name: &str, cells: &[Option<&str>]) -> Column {
        Column::new(
            name,
            cells
                .iter()
                .map(|c| c.map(|s| Value::Str(s.to_string())))
                .collect(),
        )
    }

    fn orders() -> Frame {
        Frame::new()
            .with_column(text_column(
                "order_id",
                &[Some("1"), Some("2"), Some("3"), Some("4")],
            ))
            .unwrap()
            .with_column(text_column(
                "user_id",
                &[Some("u1"), Some("u1"), Some("u9"), None],
            ))
            .unwrap()
            .with_column(text_column(
                "signup_date",
                &[Some("o1"), Some("o2"), Some("o3"), Some("o4")],
            ))
            .unwrap()
    }

    fn users(ids: &[Option<&str>]) -> Frame {
        let countries: Vec<Option<&str>> = ids.iter().map(|_| Some("US")).collect();
        let signups: Vec<Option<&str>> = ids.iter().map(|_| Some("2023-01-01")).collect();
        Frame::new()
            .with_column(text_column("user_id", ids))
            .unwrap()
            .with_column(text_column("country", &countries))
            .unwrap()
            .with_column(text_column("signup_date", &signups))
            .unwrap()
    }

    #[test]
    fn left_join_preserves_row_count_and_nulls_unmatched() {
        let joined = safe_left_join(
            &orders(),
            &users(&[Some("u1"), Some("u2")]),
            &["user_id"],
            JoinValidate::ManyToOne,
            ("", "_user"),
        )
        .unwrap();

        assert_eq!(joined.height(), 4);
        let country = joined.column("country").unwrap();
        assert_eq!(country.values[0], Some(Value::Str("US".to_string())));
        assert_eq!(country.values[1], Some(Value::Str("US".to_string())));
        assert_eq!(country.values[2], None); // u9 unmatched
        assert_eq!(country.values[3], None); // null key never matches
    }

    #[test]
    fn colliding_right_columns_get_the_suffix() {
        let joined = safe_left_join(
            &orders(),
            &users(&[Some("u1")]),
            &["user_id"],
            JoinValidate::ManyToOne,
            ("", "_user"),
        )
        .unwrap();

        // left signup_date keeps its name, right one is suffixed
        assert!(joined.column("signup_date").is_some());
        assert!(joined.column("signup_date_user").is_some());
        assert_eq!(
            joined.column("signup_date").unwrap().values[0],
            Some(Value::Str("o1".to_string()))
        );
    }

    #[test]
    fn many_to_one_rejects_duplicate_right_keys() {
        let err = safe_left_join(
            &orders(),
            &users(&[Some("u1"), Some("u1"), Some("u2")]),
            &["user_id"],
            JoinValidate::ManyToOne,
            ("", "_user"),
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("many_to_one"));
        assert!(message.contains("2 duplicate key row(s)"));
    }

    #[test]
    fn one_to_one_also_rejects_duplicate_left_keys() {
        let err = safe_left_join(
            &orders(),
            &users(&[Some("u1"), Some("u2")]),
            &["user_id"],
            JoinValidate::OneToOne,
            ("", "_user"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not unique"));
    }
}
