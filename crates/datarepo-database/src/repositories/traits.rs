//! The generic repository contract.

use async_trait::async_trait;

use datarepo_core::result::AppResult;
use datarepo_core::types::{PageRequest, PageResponse, Predicate};

use crate::StoredEntity;
use crate::include::Include;
use crate::query::Query;

/// CRUD and query operations for one entity type.
///
/// Every call runs in its own context: reads see committed data only, and
/// each mutating call commits before returning. Mutations report success as
/// `affected_rows >= submitted_entities`.
#[async_trait]
pub trait Repository<E: StoredEntity>: Send + Sync {
    /// Every row, with the given include paths loaded.
    async fn all(&self, includes: &[Include<E>]) -> AppResult<Vec<E>>;

    /// Rows matching `query`, in its sort order and window.
    async fn find(&self, query: Query<E>) -> AppResult<Vec<E>>;

    /// One page of rows matching `query`. The query's own window is ignored.
    async fn find_page(&self, query: Query<E>, page: &PageRequest) -> AppResult<PageResponse<E>>;

    /// The row with the given key, or `None`.
    async fn get(&self, key: &E::Key, includes: &[Include<E>]) -> AppResult<Option<E>>;

    /// The single row matching `predicate`, or `None`. More than one match
    /// is an `AmbiguousMatch` error.
    async fn get_where(
        &self,
        predicate: Predicate,
        includes: &[Include<E>],
    ) -> AppResult<Option<E>>;

    /// Whether a row with the given key exists.
    async fn exists(&self, key: &E::Key) -> AppResult<bool>;

    /// Whether any row matches `predicate`.
    async fn any(&self, predicate: Predicate) -> AppResult<bool>;

    /// Number of rows matching `predicate` (all rows when `None`).
    async fn count(&self, predicate: Option<Predicate>) -> AppResult<u64>;

    /// Insert every entity in one transaction.
    async fn insert(&self, entities: &[E]) -> AppResult<bool>;

    /// Overwrite every entity, matched by key, in one transaction. Missing
    /// keys are not inserted.
    async fn update(&self, entities: &[E]) -> AppResult<bool>;

    /// Delete every entity, matched by key, in one transaction.
    async fn delete(&self, entities: &[E]) -> AppResult<bool>;
}
