// Tenant-scoped repository: every query is filtered by couple code, every update
// goes through the entity's merge.
pub mod patch;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension, Row};
use thiserror::Error;

use crate::db;
use crate::state::DbPool;
use crate::tenant::TenantKey;

pub use patch::{Patch, PatchError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// A row type living in a couple-partitioned table.
///
/// The table must have `id INTEGER PRIMARY KEY` and a `couple_code` column.
/// Neither is ever listed in `FIXED` or `COLUMNS`, so no update can touch them.
pub trait Entity: Sized {
    const TABLE: &'static str;
    /// Used in "not found" messages.
    const LABEL: &'static str;
    /// Written on insert only.
    const FIXED: &'static [&'static str] = &["created_at"];
    /// Written on insert and on every update, in the order `values` yields them.
    const COLUMNS: &'static [&'static str];
    const ORDER_BY: &'static str = "id";

    type New;
    type Patch;

    fn build(new: Self::New, tenant: &TenantKey, now: DateTime<Utc>) -> Self;

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> Result<(), PatchError>;

    fn validate(&self) -> Result<(), PatchError> {
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn fixed_values(&self) -> Vec<Value>;

    fn values(&self) -> Vec<Value>;

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);
}

/// Entities that can be removed through the API.
pub trait Deletable: Entity {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

impl FilterOp {
    fn as_sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    column: &'static str,
    op: FilterOp,
    value: Value,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn gte(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            op: FilterOp::Gte,
            value: value.into(),
        }
    }

    pub fn lte(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            op: FilterOp::Lte,
            value: value.into(),
        }
    }
}

#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

impl Store {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn list<E: Entity>(
        &self,
        tenant: &TenantKey,
        filters: &[Filter],
    ) -> Result<Vec<E>, StoreError> {
        let conn = self.pool.get()?;

        let mut sql = format!("SELECT * FROM {} WHERE couple_code = ?", E::TABLE);
        let mut params: Vec<Value> = vec![Value::from(tenant.as_str().to_string())];
        for filter in filters {
            sql.push_str(&format!(" AND {} {} ?", filter.column, filter.op.as_sql()));
            params.push(filter.value.clone());
        }
        sql.push_str(&format!(" ORDER BY {}, id", E::ORDER_BY));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| E::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get<E: Entity>(&self, tenant: &TenantKey, id: i64) -> Result<E, StoreError> {
        let conn = self.pool.get()?;
        find::<E>(&conn, tenant, id)?.ok_or(StoreError::NotFound(E::LABEL))
    }

    pub fn create<E: Entity>(&self, tenant: &TenantKey, new: E::New) -> Result<E, StoreError> {
        let mut record = E::build(new, tenant, db::now());
        record.validate()?;

        let conn = self.pool.get()?;
        let id = insert(&conn, tenant, &record)?;
        record.set_id(id);
        Ok(record)
    }

    pub fn update<E: Entity>(
        &self,
        tenant: &TenantKey,
        id: i64,
        patch: E::Patch,
    ) -> Result<E, StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let mut record = find::<E>(&tx, tenant, id)?.ok_or(StoreError::NotFound(E::LABEL))?;
        record.apply(patch, db::now())?;
        record.validate()?;
        save(&tx, tenant, &record)?;

        tx.commit()?;
        Ok(record)
    }

    pub fn delete<E: Deletable>(&self, tenant: &TenantKey, id: i64) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1 AND couple_code = ?2", E::TABLE),
            rusqlite::params![id, tenant.as_str()],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(E::LABEL));
        }
        Ok(())
    }
}

/// Look up one row by id under `tenant`. Rows of other tenants are invisible.
pub fn find<E: Entity>(
    conn: &rusqlite::Connection,
    tenant: &TenantKey,
    id: i64,
) -> Result<Option<E>, StoreError> {
    let record = conn
        .query_row(
            &format!(
                "SELECT * FROM {} WHERE id = ?1 AND couple_code = ?2",
                E::TABLE
            ),
            rusqlite::params![id, tenant.as_str()],
            |row| E::from_row(row),
        )
        .optional()?;
    Ok(record)
}

pub fn insert<E: Entity>(
    conn: &rusqlite::Connection,
    tenant: &TenantKey,
    record: &E,
) -> Result<i64, StoreError> {
    let columns: Vec<&str> = std::iter::once("couple_code")
        .chain(E::FIXED.iter().copied())
        .chain(E::COLUMNS.iter().copied())
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");

    let mut params = vec![Value::from(tenant.as_str().to_string())];
    params.extend(record.fixed_values());
    params.extend(record.values());

    conn.execute(
        &format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            columns.join(", "),
            placeholders
        ),
        params_from_iter(params),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn save<E: Entity>(
    conn: &rusqlite::Connection,
    tenant: &TenantKey,
    record: &E,
) -> Result<(), StoreError> {
    let assignments: Vec<String> = E::COLUMNS.iter().map(|c| format!("{} = ?", c)).collect();

    let mut params = record.values();
    params.push(Value::from(record.id()));
    params.push(Value::from(tenant.as_str().to_string()));

    conn.execute(
        &format!(
            "UPDATE {} SET {} WHERE id = ? AND couple_code = ?",
            E::TABLE,
            assignments.join(", ")
        ),
        params_from_iter(params),
    )?;
    Ok(())
}
