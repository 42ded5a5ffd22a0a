//! Directory layout for acquired items.
//!
//! One directory per author, one subdirectory per item (unless the flat
//! `folderstyle = false` layout is configured):
//!
//! ```text
//! <root>/<author>/<stem>/<stem>_video.mp4
//!                        <stem>_image_1.jpeg
//!                        <stem>_music.mp3
//!                        <stem>_cover.jpeg
//!                        <stem>_avatar.jpeg
//!                        <stem>_data.json
//! ```

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::naming::sanitize_path_component;
use crate::media::assets::{extension_for, AssetKind, MediaAsset};

/// Directory an item's files land in.
pub fn item_dir(
    root: &Path,
    author_name: Option<&str>,
    stem: &str,
    folder_per_item: bool,
) -> Result<PathBuf> {
    let author = sanitize_path_component(author_name.unwrap_or("unknown"))?;
    let mut dir = root.join(author);
    if folder_per_item {
        dir = dir.join(stem);
    }
    Ok(dir)
}

/// Deterministic file name for one asset.
pub fn asset_file_name(stem: &str, asset: &MediaAsset) -> String {
    let extension = asset
        .url()
        .map(|url| extension_for(url, asset.kind))
        .unwrap_or_else(|| asset.kind.default_extension().to_string());

    match asset.kind {
        AssetKind::Image => format!(
            "{}_{}_{}.{}",
            stem,
            asset.kind.file_suffix(),
            asset.index + 1,
            extension
        ),
        _ => format!("{}_{}.{}", stem, asset.kind.file_suffix(), extension),
    }
}

/// File name of the serialized metadata snapshot.
pub fn snapshot_file_name(stem: &str) -> String {
    format!("{}_data.json", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(kind: AssetKind, url: &str, index: usize) -> MediaAsset {
        MediaAsset {
            kind,
            urls: vec![url.to_string()],
            index,
        }
    }

    #[test]
    fn per_item_layout() {
        let dir = item_dir(Path::new("/dl"), Some("author"), "2024-01-01_clip", true).unwrap();
        assert_eq!(dir, PathBuf::from("/dl/author/2024-01-01_clip"));
    }

    #[test]
    fn flat_layout_omits_the_item_folder() {
        let dir = item_dir(Path::new("/dl"), Some("author"), "2024-01-01_clip", false).unwrap();
        assert_eq!(dir, PathBuf::from("/dl/author"));
    }

    #[test]
    fn author_name_is_sanitized() {
        let dir = item_dir(Path::new("/dl"), Some("a/b"), "stem", false).unwrap();
        assert_eq!(dir, PathBuf::from("/dl/a_b"));
    }

    #[test]
    fn missing_author_falls_back() {
        let dir = item_dir(Path::new("/dl"), None, "stem", false).unwrap();
        assert_eq!(dir, PathBuf::from("/dl/unknown"));
    }

    #[test]
    fn asset_names_are_deterministic() {
        assert_eq!(
            asset_file_name("stem", &asset(AssetKind::Video, "https://cdn/v.mp4", 0)),
            "stem_video.mp4"
        );
        assert_eq!(
            asset_file_name("stem", &asset(AssetKind::Image, "https://cdn/i.jpeg", 2)),
            "stem_image_3.jpeg"
        );
        assert_eq!(
            asset_file_name("stem", &asset(AssetKind::Music, "https://cdn/m?sig=1", 0)),
            "stem_music.mp3"
        );
        assert_eq!(snapshot_file_name("stem"), "stem_data.json");
    }
}
