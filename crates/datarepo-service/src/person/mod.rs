//! Person repository and service.

pub mod include;
pub mod repository;
pub mod service;

pub use repository::PersonRepository;
pub use service::{NewAddress, PersonService};
