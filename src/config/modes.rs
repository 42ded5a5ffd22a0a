//! User-profile enumeration modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to enumerate when the input is a user profile link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserMode {
    /// The user's posted items (default).
    #[default]
    Post,
    /// The user's liked items.
    Like,
    /// The user's collections, each enumerated in full.
    Mix,
}

impl fmt::Display for UserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserMode::Post => write!(f, "post"),
            UserMode::Like => write!(f, "like"),
            UserMode::Mix => write!(f, "mix"),
        }
    }
}

impl FromStr for UserMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "post" => Ok(UserMode::Post),
            "like" => Ok(UserMode::Like),
            "mix" => Ok(UserMode::Mix),
            _ => Err(format!("Unknown mode: {} (expected post, like or mix)", s)),
        }
    }
}
