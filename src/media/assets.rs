//! Media asset extraction from item documents.

use serde_json::Value;

use crate::media::item::ItemDocument;

/// Kind of downloadable asset attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Video,
    Image,
    Music,
    Cover,
    Avatar,
}

impl AssetKind {
    /// Mandatory assets gate ledger recording; optional ones only count in
    /// statistics when they fail.
    pub fn is_mandatory(&self) -> bool {
        matches!(self, AssetKind::Video | AssetKind::Image)
    }

    /// File name suffix used by the deterministic layout.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Image => "image",
            AssetKind::Music => "music",
            AssetKind::Cover => "cover",
            AssetKind::Avatar => "avatar",
        }
    }

    /// Default extension when the URL does not reveal one.
    pub fn default_extension(&self) -> &'static str {
        match self {
            AssetKind::Video => "mp4",
            AssetKind::Image | AssetKind::Cover | AssetKind::Avatar => "jpeg",
            AssetKind::Music => "mp3",
        }
    }
}

/// One downloadable asset: a kind plus its URL candidate list.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub kind: AssetKind,
    /// Candidate URLs, best first. Alternatives are CDN mirrors.
    pub urls: Vec<String>,
    /// Position within an image set; zero elsewhere.
    pub index: usize,
}

impl MediaAsset {
    /// Preferred URL for this asset.
    pub fn url(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }
}

/// Which optional assets to extract alongside the primary content.
#[derive(Debug, Clone, Copy)]
pub struct AssetOptions {
    pub music: bool,
    pub cover: bool,
    pub avatar: bool,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            music: true,
            cover: true,
            avatar: true,
        }
    }
}

/// Extract the downloadable assets of an item.
///
/// The primary content (video or every image of an image set) is always
/// extracted; music, cover and avatar follow `options`. Items exposing no
/// primary URLs yield no mandatory asset, which the caller treats as a
/// failed item.
pub fn extract_assets(item: &ItemDocument, options: AssetOptions) -> Vec<MediaAsset> {
    let doc = item.raw();
    let mut assets = Vec::new();

    if item.is_image_set() {
        if let Some(images) = doc.get("images").and_then(Value::as_array) {
            for (index, image) in images.iter().enumerate() {
                let urls = ranked_urls(image.get("url_list"));
                if !urls.is_empty() {
                    assets.push(MediaAsset {
                        kind: AssetKind::Image,
                        urls,
                        index,
                    });
                }
            }
        }
    } else {
        let urls = video_urls(doc);
        if !urls.is_empty() {
            assets.push(MediaAsset {
                kind: AssetKind::Video,
                urls,
                index: 0,
            });
        }
        if options.cover {
            let urls = ranked_urls(doc.pointer("/video/cover/url_list"));
            if !urls.is_empty() {
                assets.push(MediaAsset {
                    kind: AssetKind::Cover,
                    urls,
                    index: 0,
                });
            }
        }
    }

    if options.music {
        let urls = ranked_urls(doc.pointer("/music/play_url/url_list"));
        if !urls.is_empty() {
            assets.push(MediaAsset {
                kind: AssetKind::Music,
                urls,
                index: 0,
            });
        }
    }

    if options.avatar {
        let urls = ranked_urls(doc.pointer("/author/avatar/url_list"))
            .into_iter()
            .chain(ranked_urls(doc.pointer("/author/avatar_larger/url_list")))
            .collect::<Vec<_>>();
        if !urls.is_empty() {
            assets.push(MediaAsset {
                kind: AssetKind::Avatar,
                urls,
                index: 0,
            });
        }
    }

    assets
}

/// Video play addresses with the watermark stripped, `download_addr` as the
/// fallback mirror.
fn video_urls(doc: &Value) -> Vec<String> {
    let mut urls: Vec<String> = ranked_urls(
        doc.pointer("/video/play_addr_h264/url_list")
            .or_else(|| doc.pointer("/video/play_addr/url_list")),
    )
    .into_iter()
    .map(|u| strip_watermark(&u))
    .collect();

    for fallback in ranked_urls(doc.pointer("/video/download_addr/url_list")) {
        if !urls.contains(&fallback) {
            urls.push(fallback);
        }
    }
    urls
}

/// Rewrite a play address to its no-watermark, high-resolution variant.
pub fn strip_watermark(url: &str) -> String {
    url.replace("playwm", "play").replace("720p", "1080p")
}

/// Order a `url_list` value best-quality first.
///
/// Candidates mentioning `1080`, `origin` or `high` are promoted in that
/// priority; otherwise upstream order is kept.
pub fn ranked_urls(list: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = list
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if raw.len() <= 1 {
        return raw;
    }

    let mut ranked = Vec::with_capacity(raw.len());
    for keyword in ["1080", "origin", "high"] {
        for url in &raw {
            if url.contains(keyword) && !ranked.contains(url) {
                ranked.push(url.clone());
            }
        }
    }
    for url in raw {
        if !ranked.contains(&url) {
            ranked.push(url);
        }
    }
    ranked
}

/// File extension for an asset URL, falling back to the kind's default.
pub fn extension_for(url: &str, kind: AssetKind) -> String {
    let path = url.split('?').next().unwrap_or(url);
    if let Some(ext) = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
    {
        if !ext.is_empty()
            && ext.len() <= 5
            && ext.chars().all(|c| c.is_ascii_alphanumeric())
            && mime_guess::from_ext(ext).first().is_some()
        {
            return ext.to_ascii_lowercase();
        }
    }
    kind.default_extension().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn video_item() -> ItemDocument {
        ItemDocument::new(json!({
            "aweme_id": "7123456789012345678",
            "create_time": 1700000000,
            "desc": "clip",
            "author": {
                "sec_uid": "MS4wLjABAAAAxyz",
                "nickname": "someone",
                "avatar": {"url_list": ["https://cdn/avatar.jpeg"]},
            },
            "video": {
                "play_addr": {"url_list": ["https://cdn/playwm/720p/v.mp4"]},
                "download_addr": {"url_list": ["https://cdn/dl/v.mp4"]},
                "cover": {"url_list": ["https://cdn/cover.jpeg"]},
            },
            "music": {"play_url": {"url_list": ["https://cdn/m.mp3"]}},
        }))
    }

    #[test]
    fn video_item_yields_all_asset_kinds() {
        let assets = extract_assets(&video_item(), AssetOptions::default());
        let kinds: Vec<AssetKind> = assets.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AssetKind::Video,
                AssetKind::Cover,
                AssetKind::Music,
                AssetKind::Avatar
            ]
        );
    }

    #[test]
    fn watermark_is_stripped_from_play_address() {
        let assets = extract_assets(&video_item(), AssetOptions::default());
        let video = &assets[0];
        assert_eq!(video.url(), Some("https://cdn/play/1080p/v.mp4"));
        // download_addr is kept as a fallback mirror.
        assert!(video.urls.contains(&"https://cdn/dl/v.mp4".to_string()));
    }

    #[test]
    fn optional_assets_follow_options() {
        let assets = extract_assets(
            &video_item(),
            AssetOptions {
                music: false,
                cover: false,
                avatar: false,
            },
        );
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].kind, AssetKind::Video);
    }

    #[test]
    fn image_set_yields_one_mandatory_asset_per_image() {
        let item = ItemDocument::new(json!({
            "aweme_id": "7",
            "images": [
                {"url_list": ["https://cdn/1.jpeg"]},
                {"url_list": ["https://cdn/2.jpeg"]},
                {"url_list": []},
            ],
        }));
        let assets = extract_assets(
            &item,
            AssetOptions {
                music: false,
                cover: false,
                avatar: false,
            },
        );
        assert_eq!(assets.len(), 2);
        assert!(assets.iter().all(|a| a.kind == AssetKind::Image));
        assert_eq!(assets[0].index, 0);
        assert_eq!(assets[1].index, 1);
    }

    #[test]
    fn best_quality_url_is_promoted() {
        let urls = ranked_urls(Some(&json!([
            "https://cdn/low/v.mp4",
            "https://cdn/1080/v.mp4",
            "https://cdn/high/v.mp4",
        ])));
        assert_eq!(urls[0], "https://cdn/1080/v.mp4");
        assert_eq!(urls[1], "https://cdn/high/v.mp4");
        assert_eq!(urls[2], "https://cdn/low/v.mp4");
    }

    #[test]
    fn extension_from_url_with_fallback() {
        assert_eq!(extension_for("https://cdn/a.MP4?sig=x", AssetKind::Video), "mp4");
        assert_eq!(extension_for("https://cdn/a", AssetKind::Cover), "jpeg");
        assert_eq!(extension_for("https://cdn/a.notreal", AssetKind::Music), "mp3");
    }

    #[test]
    fn item_without_primary_urls_yields_no_mandatory_asset() {
        let item = ItemDocument::new(json!({"aweme_id": "7", "video": {}}));
        let assets = extract_assets(&item, AssetOptions::default());
        assert!(assets.iter().all(|a| !a.kind.is_mandatory()));
    }
}
