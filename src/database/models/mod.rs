//! Database models.

pub mod common;
pub mod filter;

pub use common::FilterButton;
pub use filter::{ContentKind, FilterRecord, LegacyFlags};
