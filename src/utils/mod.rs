//! Shared helpers.

pub mod bootstrap;
pub mod pagination;

pub use pagination::{PageParams, PageQuery, Paginated};
