//! Address domain entities.

pub mod kind;
pub mod model;

pub use kind::AddressKind;
pub use model::Address;
