//! # datarepo-database
//!
//! SQLite connection management, the context factory and unit-of-work,
//! query descriptors with include paths, and the generic repositories built
//! on top of them.

pub mod connection;
pub mod context;
pub mod include;
pub mod migration;
pub mod query;
pub mod repositories;

mod sql;

use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;

use datarepo_core::traits::Entity;

pub use connection::DatabasePool;
pub use context::{Context, DataContext, Seeder, SqliteContextFactory};
pub use include::{Include, IncludeLoader};
pub use query::Query;
pub use repositories::{BlockingRepository, ContextRepository, EntityRepository, Repository};

/// An [`Entity`] that can be materialized from a SQLite row.
///
/// Implemented automatically for every entity deriving `sqlx::FromRow`.
pub trait StoredEntity: Entity + for<'r> FromRow<'r, SqliteRow> {}

impl<T> StoredEntity for T where T: Entity + for<'r> FromRow<'r, SqliteRow> {}
