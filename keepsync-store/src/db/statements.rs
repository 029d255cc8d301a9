//! Statement assembly for the record engine
//!
//! Identifiers pushed into statement text come from [`RecordTable`] constants,
//! from columns resolved against its allow-list, or (for reads) from the live
//! catalog after [`check_convention`]. Every value goes through `push_bind`.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use crate::models::{is_catalog_identifier, quote_ident, RecordTable, UserId, CONVENTION_COLUMNS};

/// Catalog lookup for a table's columns, in declaration order.
pub(crate) const COLUMNS_QUERY: &str = r#"
    SELECT column_name::text
    FROM information_schema.columns
    WHERE table_schema = current_schema() AND table_name = $1
    ORDER BY ordinal_position
"#;

/// `updated_at` must move forward even when two writes land in the same microsecond.
const BUMP_UPDATED_AT: &str = "updated_at + interval '1 microsecond'";

/// `INSERT INTO t (user_id, id, c1, ...) VALUES ($1, $2, $3, ...)`
pub(crate) fn insert_record<'a>(
    table: RecordTable,
    user_id: UserId,
    entry_id: &'a str,
    columns: &[(&'static str, &'a str)],
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("INSERT INTO ");
    qb.push(table.as_str()).push(" (user_id, id");
    for (column, _) in columns {
        qb.push(", ").push(*column);
    }
    qb.push(") VALUES (");

    let mut values = qb.separated(", ");
    values.push_bind(user_id);
    values.push_bind(entry_id);
    for (_, value) in columns {
        values.push_bind(*value);
    }
    values.push_unseparated(")");

    qb
}

/// `UPDATE t SET c1 = $1, ..., updated_at = ... WHERE user_id = $n AND id = $n+1`
///
/// `columns` must not be empty; the caller short-circuits that case.
pub(crate) fn update_record<'a>(
    table: RecordTable,
    user_id: UserId,
    entry_id: &'a str,
    columns: &[(&'static str, &'a str)],
) -> QueryBuilder<'a, Postgres> {
    debug_assert!(!columns.is_empty());

    let mut qb = QueryBuilder::new("UPDATE ");
    qb.push(table.as_str()).push(" SET ");
    for (column, value) in columns {
        qb.push(*column).push(" = ").push_bind(*value).push(", ");
    }
    qb.push("updated_at = GREATEST(now(), ")
        .push(BUMP_UPDATED_AT)
        .push(")");
    qb.push(" WHERE user_id = ")
        .push_bind(user_id)
        .push(" AND id = ")
        .push_bind(entry_id);

    qb
}

/// Soft delete: flag the row and stamp it from the database clock, like updates.
pub(crate) fn delete_record<'a>(
    table: RecordTable,
    user_id: UserId,
    entry_id: &'a str,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE ");
    qb.push(table.as_str())
        .push(" SET deleted = TRUE, updated_at = GREATEST(now(), ")
        .push(BUMP_UPDATED_AT)
        .push(")");
    qb.push(" WHERE user_id = ")
        .push_bind(user_id)
        .push(" AND id = ")
        .push_bind(entry_id);

    qb
}

/// `SELECT <columns> FROM t WHERE user_id = $1 [AND deleted = FALSE] [AND updated_at > $2]`
///
/// Ordered by `(updated_at, id)` so repeated reads return rows in the same order.
pub(crate) fn select_records<'a>(
    table: RecordTable,
    columns: &[String],
    user_id: UserId,
    since: Option<DateTime<Utc>>,
    include_deleted: bool,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(quote_ident(column));
    }
    qb.push(" FROM ").push(table.as_str());
    qb.push(" WHERE user_id = ").push_bind(user_id);
    if !include_deleted {
        qb.push(" AND deleted = FALSE");
    }
    if let Some(since) = since {
        qb.push(" AND updated_at > ").push_bind(since);
    }
    qb.push(" ORDER BY updated_at, id");

    qb
}

/// Verify catalog columns follow the record convention before they are used in a query.
pub(crate) fn check_convention(table: RecordTable, columns: &[String]) -> Result<(), String> {
    if columns.is_empty() {
        return Err(format!("table {} not found in catalog", table.catalog_name()));
    }

    if let Some(bad) = columns.iter().find(|c| !is_catalog_identifier(c)) {
        return Err(format!("column '{}' is not a plain identifier", bad));
    }

    let missing: Vec<&str> = CONVENTION_COLUMNS
        .iter()
        .copied()
        .filter(|required| !columns.iter().any(|c| c.as_str() == *required))
        .collect();
    if !missing.is_empty() {
        return Err(format!("missing columns: {}", missing.join(", ")));
    }

    Ok(())
}
