//! Decoded record rows

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::UserId;

/// Domain field values keyed by column name, as written by callers.
///
/// A `BTreeMap` keeps generated statement text deterministic.
pub type Fields = BTreeMap<String, String>;

/// One row of a synchronized table, rendered as text.
///
/// Columns keep the catalog order. SQL NULL stays `None`; use
/// [`Record::to_string_map`] for the flattened view where NULL and the empty
/// string are indistinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    columns: IndexMap<String, Option<String>>,
}

impl Record {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: IndexMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, column: impl Into<String>, value: Option<String>) {
        self.columns.insert(column.into(), value);
    }

    /// Value of a column; `None` if the column is absent or NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).and_then(|v| v.as_deref())
    }

    /// True if the column exists and holds SQL NULL.
    pub fn is_null(&self, column: &str) -> bool {
        matches!(self.columns.get(column), Some(None))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.get("user_id")
            .and_then(|v| v.parse::<i32>().ok())
            .map(UserId::new)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.get("updated_at")
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn is_deleted(&self) -> bool {
        self.get("deleted") == Some("true")
    }

    /// Column names in catalog order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Flattened view with NULL rendered as the empty string.
    pub fn to_string_map(&self) -> IndexMap<String, String> {
        self.columns
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().unwrap_or_default()))
            .collect()
    }

    pub fn into_inner(self) -> IndexMap<String, Option<String>> {
        self.columns
    }
}

impl FromIterator<(String, Option<String>)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Option<String>)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Text form of a timestamp column: RFC 3339, UTC, microsecond precision.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
