//! Person domain entities.

pub mod model;

pub use model::{CreatePerson, Person};
