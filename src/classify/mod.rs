//! Share-link classification.
//!
//! Turns raw operator input (share text, canonical URLs, bare numeric ids)
//! into a [`ResourceReference`]: which scope to enumerate and the opaque
//! platform identifier to enumerate it with. Short links are resolved to
//! their canonical form first by following redirects.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::Client;

use crate::error::{Error, Result};

/// Class of enumerable content a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// One video or image-set post.
    Item,
    /// A user profile (posts and/or likes, per configured modes).
    User,
    /// A collection ("mix") of posts.
    Collection,
    /// All posts using one music track.
    MusicTrack,
    /// A live room. Recognized but not downloadable.
    Live,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Item => write!(f, "item"),
            ScopeKind::User => write!(f, "user"),
            ScopeKind::Collection => write!(f, "collection"),
            ScopeKind::MusicTrack => write!(f, "music"),
            ScopeKind::Live => write!(f, "live"),
        }
    }
}

/// A classified input: scope plus the platform identifier extracted from it.
///
/// The identifier is opaque and immutable once classified; it lives for one
/// run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    pub scope: ScopeKind,
    pub id: String,
}

impl ResourceReference {
    pub fn new(scope: ScopeKind, id: impl Into<String>) -> Self {
        Self {
            scope,
            id: id.into(),
        }
    }
}

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s'\u{201c}\u{201d}<>]+").expect("valid regex"))
}

fn user_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            Regex::new(r"/user/([\w.-]+)").expect("valid regex"),
            Regex::new(r"sec_uid=([\w.-]+)").expect("valid regex"),
        ]
    })
}

fn item_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            Regex::new(r"/video/(\d+)").expect("valid regex"),
            Regex::new(r"/note/(\d+)").expect("valid regex"),
            Regex::new(r"modal_id=(\d+)").expect("valid regex"),
            Regex::new(r"aweme_id=(\d+)").expect("valid regex"),
            Regex::new(r"item_id=(\d+)").expect("valid regex"),
        ]
    })
}

fn collection_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            Regex::new(r"/collection/(\d+)").expect("valid regex"),
            Regex::new(r"/mix/detail/(\d+)").expect("valid regex"),
        ]
    })
}

fn music_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/music/(\d+)").expect("valid regex"))
}

fn numeric_fallback_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{15,20})").expect("valid regex"))
}

/// Pull the first http(s) URL out of free-form share text.
pub fn extract_url(text: &str) -> Option<&str> {
    url_pattern().find(text).map(|m| m.as_str())
}

/// Apply the ordered extraction rules to a canonical URL.
///
/// Rules are checked in fixed priority order, first match wins: user path or
/// `sec_uid` query, item paths and query parameters, collection paths, music
/// path, live host, then the longest-numeric-token fallback.
pub fn extract_reference(url: &str) -> Option<ResourceReference> {
    for re in user_patterns() {
        if let Some(caps) = re.captures(url) {
            return Some(ResourceReference::new(ScopeKind::User, &caps[1]));
        }
    }
    for re in item_patterns() {
        if let Some(caps) = re.captures(url) {
            return Some(ResourceReference::new(ScopeKind::Item, &caps[1]));
        }
    }
    for re in collection_patterns() {
        if let Some(caps) = re.captures(url) {
            return Some(ResourceReference::new(ScopeKind::Collection, &caps[1]));
        }
    }
    if let Some(caps) = music_pattern().captures(url) {
        return Some(ResourceReference::new(ScopeKind::MusicTrack, &caps[1]));
    }
    if url.contains("live.douyin.com") {
        let id = url
            .rsplit('/')
            .find(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or("");
        if !id.is_empty() {
            return Some(ResourceReference::new(ScopeKind::Live, id));
        }
    }
    if let Some(caps) = numeric_fallback_pattern().captures(url) {
        return Some(ResourceReference::new(ScopeKind::Item, &caps[1]));
    }
    None
}

/// Classifies operator inputs, resolving short links through HTTP redirects.
pub struct Classifier {
    client: Client,
}

impl Classifier {
    /// Build a classifier around a redirect-following HTTP client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Classify one input: share text, URL, or bare numeric identifier.
    pub async fn classify(&self, input: &str) -> Result<ResourceReference> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::Classification(input.to_string()));
        }

        if let Some(url) = extract_url(trimmed) {
            let canonical = self.resolve_short_link(url).await;
            return extract_reference(&canonical)
                .ok_or_else(|| Error::Classification(input.to_string()));
        }

        // A raw long-numeric token is accepted as an item id directly.
        if trimmed.len() >= 15 && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Ok(ResourceReference::new(ScopeKind::Item, trimmed));
        }

        Err(Error::Classification(input.to_string()))
    }

    /// Follow redirects on short share links to obtain the canonical URL.
    ///
    /// Resolution failures fall back to the original URL so the extraction
    /// rules still get a chance on whatever the operator pasted.
    async fn resolve_short_link(&self, url: &str) -> String {
        if !url.contains("v.douyin.com") {
            return url.to_string();
        }
        match self.client.get(url).send().await {
            Ok(response) => {
                let final_url = response.url().to_string();
                tracing::debug!("resolved short link {} -> {}", url, final_url);
                final_url
            }
            Err(e) => {
                tracing::warn!("failed to resolve short link {}: {}", url, e);
                url.to_string()
            }
        }
    }
}
