//! # datarepo-entity
//!
//! Sample domain entities for DataRepo. Every struct in this crate
//! represents a table row, derives `sqlx::FromRow`, and implements
//! [`Entity`](datarepo_core::Entity) so the generic repositories can
//! serve it. Relationship fields are marked `#[sqlx(skip)]` and filled
//! by include paths defined in the service layer.

pub mod address;
pub mod person;

use sqlx::migrate::Migrator;

pub use address::{Address, AddressKind};
pub use person::Person;

/// Schema for every entity in this crate.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
