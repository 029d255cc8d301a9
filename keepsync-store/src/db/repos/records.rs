//! Record repository - the generic record engine
//!
//! One implementation serves every allow-listed table:
//! - add: INSERT with the caller's data columns
//! - update: partial UPDATE, bumps `updated_at`
//! - delete: soft delete (flag + `updated_at`), rows are never removed
//! - read: catalog introspection, then a per-user incremental SELECT
//!
//! Mutations report the affected row count; zero means no row matched
//! `(user_id, id)` and is not an error.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::context::OpContext;
use crate::db::decode::decode_row;
use crate::db::statements;
use crate::error::{KeeperError, Result};
use crate::models::{Fields, Record, RecordShape, RecordTable, UserId, ValidationError};

/// Record repository
pub struct RecordRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> RecordRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new record owned by `user_id`.
    ///
    /// An existing `entry_id` or an unknown `user_id` fails with `ConstraintViolation`.
    pub async fn add_record(
        &self,
        ctx: &OpContext,
        table: RecordTable,
        user_id: UserId,
        entry_id: &str,
        fields: &Fields,
    ) -> Result<u64> {
        const OP: &str = "add record";

        let user_id = user_id.require_set()?;
        require_entry_id(entry_id)?;
        let columns = table.resolve_fields(fields)?;

        let mut qb = statements::insert_record(table, user_id, entry_id, &columns);
        let affected = ctx
            .run(OP, async {
                qb.build()
                    .execute(self.pool)
                    .await
                    .map_err(|e| KeeperError::from_sqlx(OP, e))
            })
            .await?
            .rows_affected();

        debug!(%table, %user_id, entry_id, fields = columns.len(), "record added");
        Ok(affected)
    }

    /// Overwrite the given data columns of one record.
    ///
    /// An empty `fields` map is a no-op that does not touch the store.
    pub async fn update_record(
        &self,
        ctx: &OpContext,
        table: RecordTable,
        user_id: UserId,
        entry_id: &str,
        fields: &Fields,
    ) -> Result<u64> {
        const OP: &str = "update record";

        let user_id = user_id.require_set()?;
        require_entry_id(entry_id)?;
        let columns = table.resolve_fields(fields)?;

        if columns.is_empty() {
            debug!(%table, %user_id, entry_id, "update with no fields skipped");
            ctx.check(OP)?;
            return Ok(0);
        }

        let mut qb = statements::update_record(table, user_id, entry_id, &columns);
        let affected = ctx
            .run(OP, async {
                qb.build()
                    .execute(self.pool)
                    .await
                    .map_err(|e| KeeperError::from_sqlx(OP, e))
            })
            .await?
            .rows_affected();

        debug!(%table, %user_id, entry_id, affected, "record updated");
        Ok(affected)
    }

    /// Soft-delete one record: set `deleted` and refresh `updated_at`.
    ///
    /// Does not check that the record exists.
    pub async fn delete_record(
        &self,
        ctx: &OpContext,
        table: RecordTable,
        user_id: UserId,
        entry_id: &str,
    ) -> Result<u64> {
        const OP: &str = "delete record";

        let user_id = user_id.require_set()?;
        require_entry_id(entry_id)?;

        let mut qb = statements::delete_record(table, user_id, entry_id);
        let affected = ctx
            .run(OP, async {
                qb.build()
                    .execute(self.pool)
                    .await
                    .map_err(|e| KeeperError::from_sqlx(OP, e))
            })
            .await?
            .rows_affected();

        debug!(%table, %user_id, entry_id, affected, "record deleted");
        Ok(affected)
    }

    /// Columns of `table` as the live catalog reports them.
    pub async fn table_columns(&self, ctx: &OpContext, table: RecordTable) -> Result<Vec<String>> {
        const OP: &str = "get table columns";

        let columns = ctx
            .run(OP, async {
                sqlx::query_scalar::<_, String>(statements::COLUMNS_QUERY)
                    .bind(table.catalog_name())
                    .fetch_all(self.pool)
                    .await
                    .map_err(|e| KeeperError::from_sqlx(OP, e))
            })
            .await?;

        statements::check_convention(table, &columns)
            .map_err(|reason| KeeperError::schema_mismatch(table.as_str(), reason))?;

        Ok(columns)
    }

    /// Every record of `user_id` in `table`, optionally only those changed after `since`.
    ///
    /// Soft-deleted rows are included only when `include_deleted` is set.
    /// Rows come back ordered by `(updated_at, id)`.
    pub async fn get_all_records(
        &self,
        ctx: &OpContext,
        table: RecordTable,
        user_id: UserId,
        since: Option<DateTime<Utc>>,
        include_deleted: bool,
    ) -> Result<Vec<Record>> {
        const OP: &str = "get all records";

        let columns = self.table_columns(ctx, table).await?;

        let mut qb =
            statements::select_records(table, &columns, user_id, since, include_deleted);
        let rows = ctx
            .run(OP, async {
                qb.build()
                    .fetch_all(self.pool)
                    .await
                    .map_err(|e| KeeperError::from_sqlx(OP, e))
            })
            .await?;

        let records = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
        debug!(%table, %user_id, ?since, include_deleted, count = records.len(), "records read");
        Ok(records)
    }

    /// Insert a typed record.
    pub async fn add<T: RecordShape>(
        &self,
        ctx: &OpContext,
        user_id: UserId,
        item: &T,
    ) -> Result<u64> {
        self.add_record(ctx, T::TABLE, user_id, item.entry_id(), &item.to_fields())
            .await
    }

    /// Update a typed record; `None` optional columns are left unchanged.
    pub async fn update<T: RecordShape>(
        &self,
        ctx: &OpContext,
        user_id: UserId,
        item: &T,
    ) -> Result<u64> {
        self.update_record(ctx, T::TABLE, user_id, item.entry_id(), &item.to_fields())
            .await
    }

    /// Read typed records.
    pub async fn fetch<T: RecordShape>(
        &self,
        ctx: &OpContext,
        user_id: UserId,
        since: Option<DateTime<Utc>>,
        include_deleted: bool,
    ) -> Result<Vec<T>> {
        self.get_all_records(ctx, T::TABLE, user_id, since, include_deleted)
            .await?
            .iter()
            .map(T::from_record)
            .collect()
    }
}

fn require_entry_id(entry_id: &str) -> Result<()> {
    if entry_id.is_empty() {
        return Err(ValidationError::Empty { field: "entry_id" }.into());
    }
    Ok(())
}
