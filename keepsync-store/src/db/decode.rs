//! Render Postgres rows as text records

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};
use uuid::Uuid;

use crate::error::{KeeperError, Result};
use crate::models::{format_timestamp, Record};

/// Column types the decoder knows how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Text,
    TimestampTz,
    Timestamp,
    Uuid,
}

impl ColumnKind {
    fn from_type_name(name: &str) -> Option<Self> {
        Some(match name {
            "BOOL" => Self::Bool,
            "INT2" => Self::Int2,
            "INT4" => Self::Int4,
            "INT8" => Self::Int8,
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => Self::Text,
            "TIMESTAMPTZ" => Self::TimestampTz,
            "TIMESTAMP" => Self::Timestamp,
            "UUID" => Self::Uuid,
            _ => return None,
        })
    }
}

/// Decode every column of `row`, keeping NULL as `None`.
pub(crate) fn decode_row(row: &PgRow) -> Result<Record> {
    let mut record = Record::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();
        let kind = ColumnKind::from_type_name(type_name).ok_or_else(|| {
            KeeperError::UnsupportedDatatype {
                column: column.name().to_owned(),
                type_name: type_name.to_owned(),
            }
        })?;
        record.insert(column.name(), decode_value(row, index, kind)?);
    }
    Ok(record)
}

fn decode_value(row: &PgRow, index: usize, kind: ColumnKind) -> Result<Option<String>> {
    let err = |e| KeeperError::from_sqlx("decode row", e);

    let text = match kind {
        ColumnKind::Bool => row
            .try_get::<Option<bool>, _>(index)
            .map_err(err)?
            .map(|v| v.to_string()),
        ColumnKind::Int2 => row
            .try_get::<Option<i16>, _>(index)
            .map_err(err)?
            .map(|v| v.to_string()),
        ColumnKind::Int4 => row
            .try_get::<Option<i32>, _>(index)
            .map_err(err)?
            .map(|v| v.to_string()),
        ColumnKind::Int8 => row
            .try_get::<Option<i64>, _>(index)
            .map_err(err)?
            .map(|v| v.to_string()),
        ColumnKind::Text => row.try_get::<Option<String>, _>(index).map_err(err)?,
        ColumnKind::TimestampTz => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map_err(err)?
            .map(format_timestamp),
        // Naive timestamps are stored as UTC by convention
        ColumnKind::Timestamp => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map_err(err)?
            .map(|v| format_timestamp(v.and_utc())),
        ColumnKind::Uuid => row
            .try_get::<Option<Uuid>, _>(index)
            .map_err(err)?
            .map(|v| v.hyphenated().to_string()),
    };

    Ok(text)
}
