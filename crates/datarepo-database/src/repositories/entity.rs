//! Entity-typed repository.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use datarepo_core::result::AppResult;
use datarepo_core::types::{PageRequest, PageResponse, Predicate};

use crate::StoredEntity;
use crate::context::{DataContext, SqliteContextFactory};
use crate::include::Include;
use crate::query::Query;

use super::context::ContextRepository;
use super::traits::Repository;

/// [`Repository`] for a single entity type `E`.
pub struct EntityRepository<E, F: DataContext = SqliteContextFactory> {
    inner: ContextRepository<F>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: StoredEntity, F: DataContext> EntityRepository<E, F> {
    /// Create a repository over `factory`.
    pub fn new(factory: F) -> Self {
        Self::from_shared(Arc::new(factory))
    }

    /// Create a repository over a factory shared with other repositories.
    pub fn from_shared(factory: Arc<F>) -> Self {
        Self {
            inner: ContextRepository::from_shared(factory),
            _entity: PhantomData,
        }
    }

    /// The untyped repository this one delegates to.
    pub fn context_repository(&self) -> &ContextRepository<F> {
        &self.inner
    }
}

#[async_trait]
impl<E: StoredEntity, F: DataContext> Repository<E> for EntityRepository<E, F> {
    async fn all(&self, includes: &[Include<E>]) -> AppResult<Vec<E>> {
        self.inner.all(includes).await
    }

    async fn find(&self, query: Query<E>) -> AppResult<Vec<E>> {
        self.inner.find(query).await
    }

    async fn find_page(&self, query: Query<E>, page: &PageRequest) -> AppResult<PageResponse<E>> {
        self.inner.find_page(query, page).await
    }

    async fn get(&self, key: &E::Key, includes: &[Include<E>]) -> AppResult<Option<E>> {
        self.inner.get(key, includes).await
    }

    async fn get_where(
        &self,
        predicate: Predicate,
        includes: &[Include<E>],
    ) -> AppResult<Option<E>> {
        self.inner.get_where(predicate, includes).await
    }

    async fn exists(&self, key: &E::Key) -> AppResult<bool> {
        self.inner.exists::<E>(key).await
    }

    async fn any(&self, predicate: Predicate) -> AppResult<bool> {
        self.inner.any::<E>(predicate).await
    }

    async fn count(&self, predicate: Option<Predicate>) -> AppResult<u64> {
        self.inner.count::<E>(predicate).await
    }

    async fn insert(&self, entities: &[E]) -> AppResult<bool> {
        self.inner.create(entities).await
    }

    async fn update(&self, entities: &[E]) -> AppResult<bool> {
        self.inner.update(entities).await
    }

    async fn delete(&self, entities: &[E]) -> AppResult<bool> {
        self.inner.delete(entities).await
    }
}

impl<E, F: DataContext> Clone for EntityRepository<E, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: StoredEntity, F: DataContext> fmt::Debug for EntityRepository<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRepository")
            .field("table", &E::table_name())
            .finish_non_exhaustive()
    }
}
