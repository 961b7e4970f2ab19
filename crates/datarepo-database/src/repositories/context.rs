//! Repository over a context factory, generic per call.

use std::sync::Arc;

use tracing::{debug, warn};

use datarepo_core::result::AppResult;
use datarepo_core::traits::Entity;
use datarepo_core::types::{PageRequest, PageResponse, Predicate, Window, col};

use crate::StoredEntity;
use crate::context::{ChangeKind, DataContext, SqliteContextFactory};
use crate::include::Include;
use crate::query::Query;

/// One repository serving every entity type reachable through `F`.
///
/// Each method creates a fresh context, runs one logical operation, and
/// drops the context before returning.
#[derive(Debug)]
pub struct ContextRepository<F: DataContext = SqliteContextFactory> {
    factory: Arc<F>,
}

impl<F: DataContext> ContextRepository<F> {
    /// Create a repository over `factory`.
    pub fn new(factory: F) -> Self {
        Self::from_shared(Arc::new(factory))
    }

    /// Create a repository over a factory shared with other repositories.
    pub fn from_shared(factory: Arc<F>) -> Self {
        Self { factory }
    }

    /// The context factory.
    pub fn factory(&self) -> &Arc<F> {
        &self.factory
    }

    /// Every row of `E`, with the given include paths loaded.
    pub async fn all<E: StoredEntity>(&self, includes: &[Include<E>]) -> AppResult<Vec<E>> {
        self.find(Query::new().includes(includes.iter().cloned())).await
    }

    /// Rows of `E` matching `query`.
    pub async fn find<E: StoredEntity>(&self, query: Query<E>) -> AppResult<Vec<E>> {
        let mut context = self.factory.create_instance().await?;
        context.fetch(&query).await
    }

    /// One page of rows matching `query`.
    pub async fn find_page<E: StoredEntity>(
        &self,
        query: Query<E>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<E>> {
        let page = page.normalized();
        let mut context = self.factory.create_instance().await?;

        if query.has_matcher() {
            // The in-memory filter decides membership, so the total is only
            // known after every candidate row has been read.
            let candidates = context.fetch(&query.window(Window::default())).await?;
            let total = candidates.len() as u64;
            let items = page.window().apply(candidates);
            return Ok(PageResponse::new(items, page.page, page.page_size, total));
        }

        let total = context.count::<E>(query.predicate()).await?;
        let items = context.fetch(&query.window(page.window())).await?;
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    /// The row of `E` with the given key, or `None`.
    pub async fn get<E: StoredEntity>(
        &self,
        key: &E::Key,
        includes: &[Include<E>],
    ) -> AppResult<Option<E>> {
        self.get_where(key_predicate::<E>(key), includes).await
    }

    /// The single row of `E` matching `predicate`, or `None`.
    pub async fn get_where<E: StoredEntity>(
        &self,
        predicate: Predicate,
        includes: &[Include<E>],
    ) -> AppResult<Option<E>> {
        let mut context = self.factory.create_instance().await?;
        context.single_or_default(&predicate, includes).await
    }

    /// Whether a row of `E` with the given key exists.
    pub async fn exists<E: StoredEntity>(&self, key: &E::Key) -> AppResult<bool> {
        self.any::<E>(key_predicate::<E>(key)).await
    }

    /// Whether any row of `E` matches `predicate`.
    pub async fn any<E: StoredEntity>(&self, predicate: Predicate) -> AppResult<bool> {
        let mut context = self.factory.create_instance().await?;
        context.any::<E>(Some(&predicate)).await
    }

    /// Number of rows of `E` matching `predicate`.
    pub async fn count<E: StoredEntity>(&self, predicate: Option<Predicate>) -> AppResult<u64> {
        let mut context = self.factory.create_instance().await?;
        context.count::<E>(predicate.as_ref()).await
    }

    /// Insert every entity in one transaction.
    pub async fn create<E: StoredEntity>(&self, entities: &[E]) -> AppResult<bool> {
        self.commit(ChangeKind::Added, entities).await
    }

    /// Overwrite every entity, matched by key, in one transaction.
    pub async fn update<E: StoredEntity>(&self, entities: &[E]) -> AppResult<bool> {
        self.commit(ChangeKind::Modified, entities).await
    }

    /// Delete every entity, matched by key, in one transaction.
    pub async fn delete<E: StoredEntity>(&self, entities: &[E]) -> AppResult<bool> {
        self.commit(ChangeKind::Deleted, entities).await
    }

    async fn commit<E: Entity>(&self, kind: ChangeKind, entities: &[E]) -> AppResult<bool> {
        let mut context = self.factory.create_instance().await?;
        for entity in entities {
            context.stage(kind, entity);
        }

        let submitted = entities.len() as u64;
        let affected = context.save_changes().await?;

        if affected < submitted {
            warn!(
                table = E::table_name(),
                %kind,
                submitted,
                affected,
                "Fewer rows affected than entities submitted"
            );
            return Ok(false);
        }

        debug!(table = E::table_name(), %kind, submitted, affected, "Committed");
        Ok(true)
    }
}

impl<F: DataContext> Clone for ContextRepository<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

fn key_predicate<E: Entity>(key: &E::Key) -> Predicate {
    col(E::key_column()).eq(key.clone())
}
