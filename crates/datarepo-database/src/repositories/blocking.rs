//! Blocking facade over [`EntityRepository`].

use std::fmt;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use datarepo_core::config::DatabaseConfig;
use datarepo_core::error::{AppError, ErrorKind};
use datarepo_core::result::AppResult;
use datarepo_core::types::{PageRequest, PageResponse, Predicate};
use sqlx::migrate::Migrator;

use crate::StoredEntity;
use crate::context::{DataContext, SqliteContextFactory};
use crate::include::Include;
use crate::query::Query;

use super::entity::EntityRepository;
use super::traits::Repository;

/// Synchronous [`Repository`] operations for `E`.
///
/// Each method blocks the calling thread on a dedicated runtime until the
/// async operation completes. Calling these from inside an async runtime
/// panics, as with any nested `block_on`.
pub struct BlockingRepository<E, F: DataContext = SqliteContextFactory> {
    inner: EntityRepository<E, F>,
    runtime: Arc<Runtime>,
}

impl<E: StoredEntity, F: DataContext> BlockingRepository<E, F> {
    /// Create a repository over `factory` with its own runtime.
    pub fn new(factory: F) -> AppResult<Self> {
        Ok(Self::with_runtime(
            EntityRepository::new(factory),
            Arc::new(build_runtime()?),
        ))
    }

    /// Wrap an async repository, driving it on `runtime`.
    pub fn with_runtime(inner: EntityRepository<E, F>, runtime: Arc<Runtime>) -> Self {
        Self { inner, runtime }
    }

    /// The async repository behind this facade.
    pub fn inner(&self) -> &EntityRepository<E, F> {
        &self.inner
    }

    /// See [`Repository::all`].
    pub fn all(&self, includes: &[Include<E>]) -> AppResult<Vec<E>> {
        self.runtime.block_on(self.inner.all(includes))
    }

    /// See [`Repository::find`].
    pub fn find(&self, query: Query<E>) -> AppResult<Vec<E>> {
        self.runtime.block_on(self.inner.find(query))
    }

    /// See [`Repository::find_page`].
    pub fn find_page(&self, query: Query<E>, page: &PageRequest) -> AppResult<PageResponse<E>> {
        self.runtime.block_on(self.inner.find_page(query, page))
    }

    /// See [`Repository::get`].
    pub fn get(&self, key: &E::Key, includes: &[Include<E>]) -> AppResult<Option<E>> {
        self.runtime.block_on(self.inner.get(key, includes))
    }

    /// See [`Repository::get_where`].
    pub fn get_where(&self, predicate: Predicate, includes: &[Include<E>]) -> AppResult<Option<E>> {
        self.runtime.block_on(self.inner.get_where(predicate, includes))
    }

    /// See [`Repository::exists`].
    pub fn exists(&self, key: &E::Key) -> AppResult<bool> {
        self.runtime.block_on(self.inner.exists(key))
    }

    /// See [`Repository::any`].
    pub fn any(&self, predicate: Predicate) -> AppResult<bool> {
        self.runtime.block_on(self.inner.any(predicate))
    }

    /// See [`Repository::count`].
    pub fn count(&self, predicate: Option<Predicate>) -> AppResult<u64> {
        self.runtime.block_on(self.inner.count(predicate))
    }

    /// See [`Repository::insert`].
    pub fn insert(&self, entities: &[E]) -> AppResult<bool> {
        self.runtime.block_on(self.inner.insert(entities))
    }

    /// See [`Repository::update`].
    pub fn update(&self, entities: &[E]) -> AppResult<bool> {
        self.runtime.block_on(self.inner.update(entities))
    }

    /// See [`Repository::delete`].
    pub fn delete(&self, entities: &[E]) -> AppResult<bool> {
        self.runtime.block_on(self.inner.delete(entities))
    }
}

impl<E: StoredEntity> BlockingRepository<E, SqliteContextFactory> {
    /// Connect to the configured database and build a repository over it.
    pub fn connect(config: &DatabaseConfig, migrator: &'static Migrator) -> AppResult<Self> {
        let runtime = Arc::new(build_runtime()?);
        let factory = runtime.block_on(SqliteContextFactory::connect(config, migrator))?;
        Ok(Self::with_runtime(EntityRepository::new(factory), runtime))
    }
}

fn build_runtime() -> AppResult<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .thread_name("datarepo-blocking")
        .build()
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to start runtime", e))
}

impl<E: StoredEntity, F: DataContext> fmt::Debug for BlockingRepository<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingRepository")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
