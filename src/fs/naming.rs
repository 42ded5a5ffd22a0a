//! Filename generation and sanitization.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Longest title fragment kept in a file stem.
const MAX_TITLE_LEN: usize = 50;

/// Sanitize a path component (author or item folder name).
///
/// Traversal sequences and null bytes are rejected outright; other
/// problematic characters are replaced with underscores.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Path component cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Deterministic stem for one item: creation timestamp plus a truncated,
/// sanitized title. Re-runs over the same item produce the same stem, which
/// is what makes the presumed-complete skip work.
pub fn item_stem(created_at: Option<DateTime<Utc>>, title: Option<&str>) -> String {
    let timestamp = created_at
        .map(|ts| ts.format("%Y-%m-%d_%H-%M-%S").to_string())
        .unwrap_or_else(|| "undated".to_string());

    let title: String = title
        .unwrap_or("")
        .chars()
        .take(MAX_TITLE_LEN)
        .collect::<String>()
        .trim()
        .to_string();

    if title.is_empty() {
        return timestamp;
    }

    match sanitize_path_component(&title) {
        Ok(clean) => format!("{}_{}", timestamp, clean),
        Err(_) => timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sanitize_replaces_separators_and_specials() {
        assert_eq!(sanitize_path_component("a/b:c?d").unwrap(), "a_b_c_d");
        assert_eq!(sanitize_path_component("normal name").unwrap(), "normal name");
    }

    #[test]
    fn sanitize_rejects_traversal_and_nul() {
        assert!(sanitize_path_component("../evil").is_err());
        assert!(sanitize_path_component("foo/../bar").is_err());
        assert!(sanitize_path_component("a\0b").is_err());
        assert!(sanitize_path_component("   ").is_err());
    }

    #[test]
    fn stem_is_deterministic() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 45).unwrap();
        let a = item_stem(Some(ts), Some("my clip / take 2"));
        let b = item_stem(Some(ts), Some("my clip / take 2"));
        assert_eq!(a, b);
        assert_eq!(a, "2024-03-05_12-30-45_my clip _ take 2");
    }

    #[test]
    fn stem_without_title_is_just_the_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 45).unwrap();
        assert_eq!(item_stem(Some(ts), None), "2024-03-05_12-30-45");
        assert_eq!(item_stem(Some(ts), Some("   ")), "2024-03-05_12-30-45");
    }

    #[test]
    fn stem_truncates_long_titles() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let long = "x".repeat(200);
        let stem = item_stem(Some(ts), Some(&long));
        assert_eq!(stem.len(), "2024-01-01_00-00-00_".len() + MAX_TITLE_LEN);
    }

    #[test]
    fn undated_items_get_a_stable_placeholder() {
        assert_eq!(item_stem(None, None), "undated");
    }
}
