//! Allow-list of synchronized tables
//!
//! Table and column identifiers end up in statement text, so they only ever
//! come from the constants below. Caller strings are parsed into a
//! [`RecordTable`] and field keys are resolved against the table's data
//! columns before any SQL is assembled.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Fields, ValidationError};

/// Columns every synchronized table carries, managed by the engine
pub const CONVENTION_COLUMNS: [&str; 4] = ["id", "user_id", "updated_at", "deleted"];

/// Unquoted Postgres identifier as the catalog reports it (folded to lowercase)
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").expect("invalid identifier regex"));

/// Tables served by the record engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordTable {
    /// Login/password pairs
    Credentials,
    /// Free-form text notes
    TextData,
    /// Binary payloads, transported as encoded text
    BinaryData,
    /// Payment cards
    CardData,
}

impl RecordTable {
    pub const ALL: [RecordTable; 4] = [
        RecordTable::Credentials,
        RecordTable::TextData,
        RecordTable::BinaryData,
        RecordTable::CardData,
    ];

    /// Identifier used in statement text.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credentials => "Credentials",
            Self::TextData => "TextData",
            Self::BinaryData => "BinaryData",
            Self::CardData => "CardData",
        }
    }

    /// Name under which the catalog stores the table (unquoted identifiers fold to lowercase).
    pub fn catalog_name(self) -> String {
        self.as_str().to_lowercase()
    }

    /// Domain columns callers may write.
    pub const fn data_columns(self) -> &'static [&'static str] {
        match self {
            Self::Credentials => &["login", "password", "metadata"],
            Self::TextData | Self::BinaryData => &["data", "metadata"],
            Self::CardData => &["number", "holder", "expiry", "cvv", "metadata"],
        }
    }

    /// Resolve a field key to its allow-listed column identifier.
    pub fn column(self, key: &str) -> Result<&'static str, ValidationError> {
        if let Some(reserved) = CONVENTION_COLUMNS.iter().find(|c| c.eq_ignore_ascii_case(key)) {
            return Err(ValidationError::ReservedColumn {
                column: (*reserved).to_owned(),
            });
        }

        self.data_columns()
            .iter()
            .copied()
            .find(|c| *c == key)
            .ok_or_else(|| ValidationError::UnknownColumn {
                table: self.as_str(),
                column: key.to_owned(),
            })
    }

    /// Pair every field value with its allow-listed column, in key order.
    pub fn resolve_fields<'a>(
        self,
        fields: &'a Fields,
    ) -> Result<Vec<(&'static str, &'a str)>, ValidationError> {
        fields
            .iter()
            .map(|(key, value)| Ok((self.column(key)?, value.as_str())))
            .collect()
    }
}

impl fmt::Display for RecordTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordTable {
    type Err = ValidationError;

    /// Case-insensitive, matching how Postgres folds unquoted identifiers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownTable {
                value: s.to_owned(),
            })
    }
}

/// True if `name` is a plain lowercase identifier as returned by the catalog.
pub fn is_catalog_identifier(name: &str) -> bool {
    IDENT_RE.is_match(name)
}

/// Double-quote an identifier for statement text.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
