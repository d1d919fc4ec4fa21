//! Shared database types: closed enumerations and pagination.

mod enums;
mod pagination;

pub use enums::{ChatRole, DataSourceStatus, DataSourceType, MessageStatus};
pub use pagination::OffsetPagination;
