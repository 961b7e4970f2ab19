//! Context factories and the unit-of-work they hand out.
//!
//! A [`DataContext`] produces a fresh [`Context`] per logical operation.
//! Repositories never hold on to a context between calls, so concurrent
//! callers never share a change buffer.

pub mod unit_of_work;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use datarepo_core::config::DatabaseConfig;
use datarepo_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::migration::run_migrations;

pub use unit_of_work::{ChangeKind, Context, PendingChange};

/// A factory for independent units of work.
#[async_trait]
pub trait DataContext: Send + Sync + 'static {
    /// Create a new, independent context. The caller owns it and releases
    /// it by dropping it.
    async fn create_instance(&self) -> AppResult<Context>;
}

/// Populates a freshly migrated database.
///
/// Runs once per factory, after migrations. Implementations should be
/// idempotent because the database may already hold the seed data.
#[async_trait]
pub trait Seeder: Send + Sync {
    /// Stage seed rows on `context`. The factory saves them afterwards.
    async fn seed(&self, context: &mut Context) -> AppResult<()>;
}

/// [`DataContext`] over a SQLite pool.
///
/// When a migrator is configured, pending migrations (and then the seeder,
/// if any) run before the first context is handed out. Later calls reuse
/// the prepared schema.
pub struct SqliteContextFactory {
    pool: DatabasePool,
    migrator: Option<&'static Migrator>,
    seeder: Option<Arc<dyn Seeder>>,
    prepared: OnceCell<()>,
}

impl SqliteContextFactory {
    /// A factory that hands out contexts without migrating or seeding.
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            migrator: None,
            seeder: None,
            prepared: OnceCell::new(),
        }
    }

    /// Connect using `config`; `migrator` is applied on first use when
    /// `config.auto_migrate` is set.
    pub async fn connect(config: &DatabaseConfig, migrator: &'static Migrator) -> AppResult<Self> {
        let pool = DatabasePool::connect(config).await?;
        let factory = Self::new(pool);
        Ok(if config.auto_migrate {
            factory.with_migrator(migrator)
        } else {
            factory
        })
    }

    /// Apply `migrator` before the first context is created.
    pub fn with_migrator(mut self, migrator: &'static Migrator) -> Self {
        self.migrator = Some(migrator);
        self
    }

    /// Run `seeder` once, after migrations, before the first context is
    /// created.
    pub fn with_seeder(mut self, seeder: impl Seeder + 'static) -> Self {
        self.seeder = Some(Arc::new(seeder));
        self
    }

    /// The underlying pool.
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Migrate and seed if not done yet.
    pub async fn prepare(&self) -> AppResult<()> {
        self.prepared
            .get_or_try_init(|| async {
                if let Some(migrator) = self.migrator {
                    run_migrations(self.pool.pool(), migrator).await?;
                }
                if let Some(seeder) = &self.seeder {
                    let mut context = Context::new(self.pool.acquire().await?);
                    seeder.seed(&mut context).await?;
                    let seeded = context.save_changes().await?;
                    info!(rows = seeded, "Database seeded");
                }
                Ok::<(), datarepo_core::AppError>(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DataContext for SqliteContextFactory {
    async fn create_instance(&self) -> AppResult<Context> {
        self.prepare().await?;
        let conn = self.pool.acquire().await?;
        debug!("Context created");
        Ok(Context::new(conn))
    }
}

impl fmt::Debug for SqliteContextFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteContextFactory")
            .field("pool", &self.pool)
            .field("migrates", &self.migrator.is_some())
            .field("seeds", &self.seeder.is_some())
            .field("prepared", &self.prepared.initialized())
            .finish()
    }
}
