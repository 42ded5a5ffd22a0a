//! Deterministic filesystem layout for acquired items.

pub mod naming;
pub mod paths;

pub use naming::{item_stem, sanitize_path_component};
pub use paths::{asset_file_name, item_dir, snapshot_file_name};
