//! Include paths: eager loading of related records.
//!
//! Each include issues one extra `IN (...)` query per path for the whole
//! parent set and hands the results to an attach function, so loading `n`
//! parents with `k` includes costs `1 + k` round trips (more when the key
//! list exceeds [`IN_CHUNK_SIZE`]).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use datarepo_core::result::AppResult;
use datarepo_core::traits::Entity;
use datarepo_core::types::Value;

use crate::sql::{db_error, push_in_list, quote_ident, select_clause, validate_column};
use crate::StoredEntity;

/// Maximum number of keys bound into a single `IN` list.
pub const IN_CHUNK_SIZE: usize = 500;

/// Loads one kind of related record for a batch of parents.
#[async_trait]
pub trait IncludeLoader<E: Entity>: Send + Sync {
    /// Name of the include path, for logging and inspection.
    fn path(&self) -> &str;

    /// Load related records and attach them to `parents`.
    async fn load(&self, conn: &mut SqliteConnection, parents: &mut [E]) -> AppResult<()>;
}

/// A named include path for entity `E`.
pub struct Include<E: Entity> {
    loader: Arc<dyn IncludeLoader<E>>,
}

impl<E: Entity> Include<E> {
    /// Wrap a custom loader.
    pub fn new(loader: impl IncludeLoader<E> + 'static) -> Self {
        Self {
            loader: Arc::new(loader),
        }
    }

    /// One-to-many: children of type `R` whose `foreign_key` column holds
    /// the parent's key.
    pub fn has_many<R: StoredEntity>(
        path: impl Into<String>,
        foreign_key: &'static str,
        attach: fn(&mut E, Vec<R>),
    ) -> Self {
        Self::new(HasMany {
            path: path.into(),
            foreign_key,
            attach,
        })
    }

    /// Many-to-one: the single `R` whose key is returned by `key_of`.
    pub fn belongs_to<R: StoredEntity + Clone>(
        path: impl Into<String>,
        key_of: fn(&E) -> Option<R::Key>,
        attach: fn(&mut E, Option<R>),
    ) -> Self {
        Self::new(BelongsTo {
            path: path.into(),
            key_of,
            attach,
        })
    }

    /// Name of the include path.
    pub fn path(&self) -> &str {
        self.loader.path()
    }

    /// Load this include for `parents`.
    pub async fn load(&self, conn: &mut SqliteConnection, parents: &mut [E]) -> AppResult<()> {
        if parents.is_empty() {
            return Ok(());
        }
        debug!(
            table = E::table_name(),
            path = self.path(),
            parents = parents.len(),
            "Loading include"
        );
        self.loader.load(conn, parents).await
    }
}

impl<E: Entity> Clone for Include<E> {
    fn clone(&self) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<E: Entity> fmt::Debug for Include<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Include")
            .field("path", &self.path())
            .finish()
    }
}

struct HasMany<E, R> {
    path: String,
    foreign_key: &'static str,
    attach: fn(&mut E, Vec<R>),
}

#[async_trait]
impl<E, R> IncludeLoader<E> for HasMany<E, R>
where
    E: Entity,
    R: StoredEntity,
{
    fn path(&self) -> &str {
        &self.path
    }

    async fn load(&self, conn: &mut SqliteConnection, parents: &mut [E]) -> AppResult<()> {
        validate_column::<R>(self.foreign_key)?;

        let keys: Vec<Value> = parents.iter().map(|p| p.key_value()).collect();
        let children = fetch_by_column::<R>(conn, self.foreign_key, &keys).await?;

        let mut buckets: Vec<Vec<R>> = parents.iter().map(|_| Vec::new()).collect();
        for child in children {
            let Some(fk) = child.column_value(self.foreign_key) else {
                continue;
            };
            if let Some(index) = keys.iter().position(|k| *k == fk) {
                buckets[index].push(child);
            }
        }

        for (parent, bucket) in parents.iter_mut().zip(buckets) {
            (self.attach)(parent, bucket);
        }
        Ok(())
    }
}

struct BelongsTo<E, R: Entity> {
    path: String,
    key_of: fn(&E) -> Option<R::Key>,
    attach: fn(&mut E, Option<R>),
}

#[async_trait]
impl<E, R> IncludeLoader<E> for BelongsTo<E, R>
where
    E: Entity,
    R: StoredEntity + Clone,
{
    fn path(&self) -> &str {
        &self.path
    }

    async fn load(&self, conn: &mut SqliteConnection, parents: &mut [E]) -> AppResult<()> {
        let mut keys: Vec<R::Key> = parents.iter().filter_map(|p| (self.key_of)(p)).collect();
        keys.sort();
        keys.dedup();

        let values: Vec<Value> = keys.into_iter().map(Into::into).collect();
        let related = fetch_by_column::<R>(conn, R::key_column(), &values).await?;

        for parent in parents.iter_mut() {
            let found = (self.key_of)(parent)
                .and_then(|key| related.iter().find(|r| *r.key() == key).cloned());
            (self.attach)(parent, found);
        }
        Ok(())
    }
}

/// Fetch every `R` whose `column` value is in `values`, ordered by key.
async fn fetch_by_column<R: StoredEntity>(
    conn: &mut SqliteConnection,
    column: &str,
    values: &[Value],
) -> AppResult<Vec<R>> {
    let mut rows = Vec::new();
    for chunk in values.chunks(IN_CHUNK_SIZE) {
        let mut builder = QueryBuilder::<Sqlite>::new(select_clause::<R>());
        builder.push(" WHERE ");
        push_in_list(&mut builder, column, chunk);
        builder
            .push(" ORDER BY ")
            .push(quote_ident(R::key_column()));

        let batch = builder
            .build_query_as::<R>()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to load related records", e))?;
        rows.extend(batch);
    }
    Ok(rows)
}
