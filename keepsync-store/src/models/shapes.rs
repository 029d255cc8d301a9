//! Typed record shapes
//!
//! Each shape is a compile-time view over one allow-listed table. The record
//! engine stays generic; shapes only convert to and from [`Fields`] and
//! [`Record`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Fields, Record, RecordTable};
use crate::error::{KeeperError, Result};

/// A typed row of one synchronized table
pub trait RecordShape: Sized {
    const TABLE: RecordTable;

    /// Caller-assigned record id.
    fn entry_id(&self) -> &str;

    /// Data columns to write. Optional columns that are `None` are omitted.
    fn to_fields(&self) -> Fields;

    /// Build the shape from a decoded row.
    fn from_record(record: &Record) -> Result<Self>;
}

/// Sync bookkeeping carried by every decoded shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMeta {
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted: bool,
}

impl SyncMeta {
    fn from_record(record: &Record) -> Self {
        Self {
            updated_at: record.updated_at(),
            deleted: record.is_deleted(),
        }
    }
}

/// Login/password pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub login: String,
    pub password: String,
    pub metadata: Option<String>,
    #[serde(default)]
    pub sync: SyncMeta,
}

/// Free-form text note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNote {
    pub id: String,
    pub data: String,
    pub metadata: Option<String>,
    #[serde(default)]
    pub sync: SyncMeta,
}

/// Binary payload, transported as encoded text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryBlob {
    pub id: String,
    pub data: String,
    pub metadata: Option<String>,
    #[serde(default)]
    pub sync: SyncMeta,
}

/// Payment card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub number: String,
    pub holder: String,
    pub expiry: String,
    pub cvv: String,
    pub metadata: Option<String>,
    #[serde(default)]
    pub sync: SyncMeta,
}

/// Collects `(column, value)` pairs, skipping absent optionals.
struct FieldsBuilder(Fields);

impl FieldsBuilder {
    fn new() -> Self {
        Self(Fields::new())
    }

    fn set(mut self, column: &str, value: &str) -> Self {
        self.0.insert(column.to_owned(), value.to_owned());
        self
    }

    fn set_opt(self, column: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    fn build(self) -> Fields {
        self.0
    }
}

fn required(record: &Record, table: RecordTable, column: &str) -> Result<String> {
    record.get(column).map(str::to_owned).ok_or_else(|| {
        KeeperError::schema_mismatch(
            table.as_str(),
            format!("column '{}' is missing or null", column),
        )
    })
}

fn optional(record: &Record, column: &str) -> Option<String> {
    record.get(column).map(str::to_owned)
}

impl RecordShape for Credential {
    const TABLE: RecordTable = RecordTable::Credentials;

    fn entry_id(&self) -> &str {
        &self.id
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .set("login", &self.login)
            .set("password", &self.password)
            .set_opt("metadata", self.metadata.as_deref())
            .build()
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: required(record, Self::TABLE, "id")?,
            login: required(record, Self::TABLE, "login")?,
            password: required(record, Self::TABLE, "password")?,
            metadata: optional(record, "metadata"),
            sync: SyncMeta::from_record(record),
        })
    }
}

impl RecordShape for TextNote {
    const TABLE: RecordTable = RecordTable::TextData;

    fn entry_id(&self) -> &str {
        &self.id
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .set("data", &self.data)
            .set_opt("metadata", self.metadata.as_deref())
            .build()
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: required(record, Self::TABLE, "id")?,
            data: required(record, Self::TABLE, "data")?,
            metadata: optional(record, "metadata"),
            sync: SyncMeta::from_record(record),
        })
    }
}

impl RecordShape for BinaryBlob {
    const TABLE: RecordTable = RecordTable::BinaryData;

    fn entry_id(&self) -> &str {
        &self.id
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .set("data", &self.data)
            .set_opt("metadata", self.metadata.as_deref())
            .build()
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: required(record, Self::TABLE, "id")?,
            data: required(record, Self::TABLE, "data")?,
            metadata: optional(record, "metadata"),
            sync: SyncMeta::from_record(record),
        })
    }
}

impl RecordShape for Card {
    const TABLE: RecordTable = RecordTable::CardData;

    fn entry_id(&self) -> &str {
        &self.id
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .set("number", &self.number)
            .set("holder", &self.holder)
            .set("expiry", &self.expiry)
            .set("cvv", &self.cvv)
            .set_opt("metadata", self.metadata.as_deref())
            .build()
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: required(record, Self::TABLE, "id")?,
            number: required(record, Self::TABLE, "number")?,
            holder: required(record, Self::TABLE, "holder")?,
            expiry: required(record, Self::TABLE, "expiry")?,
            cvv: required(record, Self::TABLE, "cvv")?,
            metadata: optional(record, "metadata"),
            sync: SyncMeta::from_record(record),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Option<&str>)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn shape_fields_stay_inside_allow_list() {
        let card = Card {
            id: "c1".into(),
            number: "4111".into(),
            holder: "A".into(),
            expiry: "12/30".into(),
            cvv: "123".into(),
            metadata: Some("work".into()),
            ..Default::default()
        };
        assert!(Card::TABLE.resolve_fields(&card.to_fields()).is_ok());

        let cred = Credential {
            id: "l1".into(),
            login: "bob".into(),
            password: "pw".into(),
            ..Default::default()
        };
        let fields = cred.to_fields();
        assert!(Credential::TABLE.resolve_fields(&fields).is_ok());
        assert!(!fields.contains_key("metadata"));
    }

    #[test]
    fn decodes_text_note() {
        let rec = record(&[
            ("id", Some("e1")),
            ("user_id", Some("1")),
            ("data", Some("secret")),
            ("metadata", None),
            ("updated_at", Some("2024-05-01T10:00:00.000001Z")),
            ("deleted", Some("true")),
        ]);
        let note = TextNote::from_record(&rec).unwrap();
        assert_eq!(note.id, "e1");
        assert_eq!(note.data, "secret");
        assert_eq!(note.metadata, None);
        assert!(note.sync.deleted);
        assert!(note.sync.updated_at.is_some());
    }

    #[test]
    fn null_required_column_is_schema_mismatch() {
        let rec = record(&[("id", Some("e1")), ("data", None)]);
        let err = BinaryBlob::from_record(&rec).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
        assert!(err.to_string().contains("'data'"));
    }
}
