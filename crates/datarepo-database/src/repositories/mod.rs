//! Generic repositories over a context factory.

pub mod blocking;
pub mod context;
pub mod entity;
pub mod traits;

pub use blocking::BlockingRepository;
pub use context::ContextRepository;
pub use entity::EntityRepository;
pub use traits::Repository;
