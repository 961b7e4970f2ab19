//! Core traits defined in `datarepo-core` and implemented by other crates.

pub mod entity;

pub use entity::Entity;
