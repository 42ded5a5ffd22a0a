//! Upstream API access: request context, client, and the page/detail
//! collaborator traits the crawl and orchestration layers depend on.

pub mod client;
pub mod context;
pub mod sources;
pub mod types;

pub use client::DouyinApi;
pub use context::RequestContext;
pub use sources::{detail_chain, DetailSource, PageSource};
pub use types::PageResult;
