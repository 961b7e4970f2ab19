//! # datarepo-core
//!
//! Core crate for DataRepo. Contains the entity marker trait, configuration
//! schemas, dynamic bind values, predicate/sorting/pagination descriptors,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other DataRepo crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
pub use traits::Entity;
pub use types::{Predicate, SortField, Value, col};
