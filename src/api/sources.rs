//! Collaborator traits over the metadata API.
//!
//! The crawl and orchestration layers never talk to HTTP endpoints directly;
//! they see a [`PageSource`] per enumerable scope and an ordered chain of
//! [`DetailSource`]s for single items. This keeps the enumeration logic
//! testable and the endpoint fallbacks in one place.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::client::DouyinApi;
use crate::api::types::PageResult;
use crate::error::Result;
use crate::media::ItemDocument;

/// Cursor-paginated listing collaborator for one scope.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page starting at `cursor` (empty/`"0"` = start).
    async fn fetch_page(&self, identifier: &str, cursor: &str) -> Result<PageResult>;

    /// Scope label used in logs and ledger keys.
    fn scope(&self) -> &'static str;
}

/// Single-item metadata collaborator.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_one(&self, identifier: &str) -> Result<ItemDocument>;

    /// Source label for logs.
    fn name(&self) -> &'static str;
}

/// A user's posted items.
pub struct PostsSource(pub Arc<DouyinApi>);

#[async_trait]
impl PageSource for PostsSource {
    async fn fetch_page(&self, identifier: &str, cursor: &str) -> Result<PageResult> {
        self.0.user_posts(identifier, cursor).await
    }

    fn scope(&self) -> &'static str {
        "post"
    }
}

/// A user's liked items.
pub struct LikesSource(pub Arc<DouyinApi>);

#[async_trait]
impl PageSource for LikesSource {
    async fn fetch_page(&self, identifier: &str, cursor: &str) -> Result<PageResult> {
        self.0.user_likes(identifier, cursor).await
    }

    fn scope(&self) -> &'static str {
        "like"
    }
}

/// Items inside a collection.
pub struct CollectionSource(pub Arc<DouyinApi>);

#[async_trait]
impl PageSource for CollectionSource {
    async fn fetch_page(&self, identifier: &str, cursor: &str) -> Result<PageResult> {
        self.0.collection_items(identifier, cursor).await
    }

    fn scope(&self) -> &'static str {
        "mix"
    }
}

/// Items using a music track.
pub struct MusicSource(pub Arc<DouyinApi>);

#[async_trait]
impl PageSource for MusicSource {
    async fn fetch_page(&self, identifier: &str, cursor: &str) -> Result<PageResult> {
        self.0.music_items(identifier, cursor).await
    }

    fn scope(&self) -> &'static str {
        "music"
    }
}

struct DetailApiSource(Arc<DouyinApi>);

#[async_trait]
impl DetailSource for DetailApiSource {
    async fn fetch_one(&self, identifier: &str) -> Result<ItemDocument> {
        self.0.item_detail(identifier).await
    }

    fn name(&self) -> &'static str {
        "web detail API"
    }
}

struct ShareApiSource(Arc<DouyinApi>);

#[async_trait]
impl DetailSource for ShareApiSource {
    async fn fetch_one(&self, identifier: &str) -> Result<ItemDocument> {
        self.0.item_share_info(identifier).await
    }

    fn name(&self) -> &'static str {
        "share API"
    }
}

struct MobileApiSource(Arc<DouyinApi>);

#[async_trait]
impl DetailSource for MobileApiSource {
    async fn fetch_one(&self, identifier: &str) -> Result<ItemDocument> {
        self.0.item_mobile_info(identifier).await
    }

    fn name(&self) -> &'static str {
        "mobile API"
    }
}

/// The ordered single-item fallback chain.
///
/// The orchestrator tries each source in order and stops at the first
/// success; endpoints later in the chain are less complete but tolerate
/// weaker credentials.
pub fn detail_chain(api: Arc<DouyinApi>) -> Vec<Box<dyn DetailSource>> {
    vec![
        Box::new(DetailApiSource(api.clone())),
        Box::new(ShareApiSource(api.clone())),
        Box::new(MobileApiSource(api)),
    ]
}
