//! Configuration module for the douyin-downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - CLI argument parsing and merging
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{AccountConfig, Config, IncreaseConfig, NumberConfig, OptionsConfig};
pub use modes::UserMode;
pub use validation::{parse_date, validate_config};
