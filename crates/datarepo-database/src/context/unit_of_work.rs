//! The unit-of-work: one pooled connection plus a buffer of staged changes.

use std::fmt;

use sqlx::pool::PoolConnection;
use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use datarepo_core::error::AppError;
use datarepo_core::result::AppResult;
use datarepo_core::traits::Entity;
use datarepo_core::types::{Predicate, Value};

use crate::StoredEntity;
use crate::include::Include;
use crate::query::Query;
use crate::sql::{
    bind_value, db_error, delete_statement, insert_statement, push_predicate, quote_ident,
    update_statement, validate_predicate,
};

/// What a staged change does to its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Insert a new row.
    Added,
    /// Overwrite every non-key column of the row with the same key.
    Modified,
    /// Delete the row with the same key.
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// One staged statement awaiting [`Context::save_changes`].
#[derive(Debug, Clone)]
pub struct PendingChange {
    /// Kind of change.
    pub kind: ChangeKind,
    /// Target table.
    pub table: &'static str,
    sql: String,
    values: Vec<Value>,
}

impl PendingChange {
    fn new<E: Entity>(kind: ChangeKind, entity: &E) -> Self {
        let (sql, values) = match kind {
            ChangeKind::Added => insert_statement(entity),
            ChangeKind::Modified => update_statement(entity),
            ChangeKind::Deleted => delete_statement(entity),
        };
        Self {
            kind,
            table: E::table_name(),
            sql,
            values,
        }
    }

    /// The SQL statement this change will execute.
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// A unit-of-work bound to one pooled connection.
///
/// Reads run immediately. Writes are staged with [`add`](Self::add),
/// [`update`](Self::update) and [`remove`](Self::remove) and only reach the
/// store on [`save_changes`](Self::save_changes), which applies them in one
/// transaction. Dropping the context discards anything unsaved and returns
/// the connection to the pool.
pub struct Context {
    conn: PoolConnection<Sqlite>,
    pending: Vec<PendingChange>,
}

impl Context {
    /// Wrap a checked-out connection.
    pub fn new(conn: PoolConnection<Sqlite>) -> Self {
        Self {
            conn,
            pending: Vec::new(),
        }
    }

    /// Stage `entity` for insertion.
    pub fn add<E: Entity>(&mut self, entity: &E) {
        self.stage(ChangeKind::Added, entity);
    }

    /// Stage `entity` as modified, matched by key.
    pub fn update<E: Entity>(&mut self, entity: &E) {
        self.stage(ChangeKind::Modified, entity);
    }

    /// Stage `entity` for removal, matched by key.
    pub fn remove<E: Entity>(&mut self, entity: &E) {
        self.stage(ChangeKind::Deleted, entity);
    }

    /// Stage a change of the given kind.
    pub fn stage<E: Entity>(&mut self, kind: ChangeKind, entity: &E) {
        self.pending.push(PendingChange::new(kind, entity));
    }

    /// Changes staged since the last save.
    pub fn pending_changes(&self) -> &[PendingChange] {
        &self.pending
    }

    /// Drop all staged changes without applying them.
    pub fn discard_changes(&mut self) {
        self.pending.clear();
    }

    /// Apply all staged changes in one transaction and return the total
    /// number of affected rows.
    ///
    /// Nothing staged means nothing to do: returns `0` without touching the
    /// store. If any statement fails the transaction is rolled back, the
    /// staged changes are dropped, and the error is returned.
    pub async fn save_changes(&mut self) -> AppResult<u64> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let changes = std::mem::take(&mut self.pending);

        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let mut affected = 0;
        for change in &changes {
            let mut query = sqlx::query(&change.sql);
            for value in &change.values {
                query = bind_value(query, value);
            }
            let result = query.execute(&mut *tx).await.map_err(|e| {
                db_error(
                    &format!("Failed to save {} row in '{}'", change.kind, change.table),
                    e,
                )
            })?;
            affected += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        debug!(changes = changes.len(), affected, "Saved changes");
        Ok(affected)
    }

    /// Run `query` and return the materialized rows with includes attached.
    pub async fn fetch<E: StoredEntity>(&mut self, query: &Query<E>) -> AppResult<Vec<E>> {
        let in_memory = query.has_matcher();
        let mut builder = query.build_select(!in_memory)?;

        let mut rows = builder
            .build_query_as::<E>()
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| db_error(&format!("Failed to query '{}'", E::table_name()), e))?;

        // The matcher may inspect related rows, so includes load first.
        self.load_includes(query.include_list(), &mut rows).await?;

        if in_memory {
            rows.retain(|row| query.matches(row));
            rows = query.current_window().apply(rows);
        }

        debug!(
            table = E::table_name(),
            rows = rows.len(),
            in_memory,
            "Fetched rows"
        );

        Ok(rows)
    }

    /// The single row matching `predicate`, or `None`.
    ///
    /// Fails with `AmbiguousMatch` when more than one row matches.
    pub async fn single_or_default<E: StoredEntity>(
        &mut self,
        predicate: &Predicate,
        includes: &[Include<E>],
    ) -> AppResult<Option<E>> {
        let query = Query::<E>::new().filter(predicate.clone()).take(2);
        let mut rows = self.fetch(&query).await?;

        if rows.len() > 1 {
            return Err(AppError::ambiguous_match(format!(
                "More than one row in '{}' matches {predicate:?}",
                E::table_name()
            )));
        }

        self.load_includes(includes, &mut rows).await?;
        Ok(rows.pop())
    }

    /// Whether any row matches `predicate` (any row at all when `None`).
    pub async fn any<E: Entity>(&mut self, predicate: Option<&Predicate>) -> AppResult<bool> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT EXISTS(SELECT 1 FROM ");
        builder.push(quote_ident(E::table_name()));
        push_where::<E>(&mut builder, predicate)?;
        builder.push(")");

        let exists: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| db_error(&format!("Failed to check '{}'", E::table_name()), e))?;
        Ok(exists != 0)
    }

    /// Number of rows matching `predicate` (all rows when `None`).
    pub async fn count<E: Entity>(&mut self, predicate: Option<&Predicate>) -> AppResult<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
        builder.push(quote_ident(E::table_name()));
        push_where::<E>(&mut builder, predicate)?;

        let count: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| db_error(&format!("Failed to count '{}'", E::table_name()), e))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Attach each include path to `rows`, in order.
    pub async fn load_includes<E: Entity>(
        &mut self,
        includes: &[Include<E>],
        rows: &mut [E],
    ) -> AppResult<()> {
        for include in includes {
            include.load(&mut self.conn, rows).await?;
        }
        Ok(())
    }

    /// The raw connection, for statements this layer does not model.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

fn push_where<E: Entity>(
    builder: &mut QueryBuilder<'_, Sqlite>,
    predicate: Option<&Predicate>,
) -> AppResult<()> {
    if let Some(predicate) = predicate {
        validate_predicate::<E>(predicate)?;
        builder.push(" WHERE ");
        push_predicate(builder, predicate)?;
    }
    Ok(())
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
