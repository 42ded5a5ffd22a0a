//! The acquisition pipeline: resumable per-file downloads, per-item task
//! planning, the bounded worker pool, and the top-level orchestrator.

pub mod fetch;
pub mod orchestrator;
pub mod stats;
pub mod task;

pub use fetch::{DownloadOutcome, ResumableDownloader};
pub use orchestrator::{Orchestrator, RunReport};
pub use stats::{RunStats, StatsSnapshot};
pub use task::{plan_item, DownloadTask, ItemPlan, PlanOptions};
