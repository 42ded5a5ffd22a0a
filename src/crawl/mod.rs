//! Cursor-based enumeration of scoped content.

pub mod cursor;

pub use cursor::{CrawlCursor, ScopeConfig, TimeWindow};
