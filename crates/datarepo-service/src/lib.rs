//! # datarepo-service
//!
//! Sample service layer for DataRepo. Services orchestrate the generic
//! repositories to implement application-level use cases; dependencies are
//! provided at construction time via `Arc` references.

pub mod person;
pub mod seed;

pub use person::{NewAddress, PersonRepository, PersonService};
pub use seed::PeopleSeeder;
