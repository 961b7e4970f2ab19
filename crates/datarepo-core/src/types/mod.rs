//! Query descriptor types shared across the workspace.

pub mod filter;
pub mod pagination;
pub mod sorting;
pub mod value;

pub use filter::{Column, FilterField, FilterOp, FilterValue, Predicate, col};
pub use pagination::{PageRequest, PageResponse, Window};
pub use sorting::{SortDirection, SortField};
pub use value::Value;
