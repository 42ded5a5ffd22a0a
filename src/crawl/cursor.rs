//! Lazy, restart-free enumeration over one scope.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use tokio::time::sleep;

use crate::api::PageSource;
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::media::ItemDocument;
use crate::throttle::{RateLimiter, RetryPolicy};

/// Read-only per-scope enumeration settings.
#[derive(Debug, Clone, Default)]
pub struct ScopeConfig {
    /// Post-filter item bound, enforced by the orchestrator. Zero = unbounded.
    pub max_items: u64,
    /// Skip items already present in the ledger.
    pub incremental: bool,
    /// Creation-date window filter.
    pub time_window: TimeWindow,
}

/// Inclusive creation-date window.
///
/// Items without a readable timestamp pass the filter; the window only
/// rejects items it can actually date.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TimeWindow {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether a creation timestamp falls inside the window.
    pub fn contains(&self, created_at: Option<DateTime<Utc>>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(ts) = created_at else {
            return true;
        };
        let date = ts.date_naive();
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Active,
    Exhausted,
}

/// Lazily walks one scope's pages and yields surviving items one at a time.
///
/// Before each page fetch the cursor waits on the shared [`RateLimiter`] and
/// wraps the fetch in the [`RetryPolicy`]. Yielded items pass the time-window
/// filter and then the ledger pre-filter. Once exhausted the cursor stays
/// exhausted; enumerate again by constructing a fresh cursor.
pub struct CrawlCursor {
    source: Arc<dyn PageSource>,
    identifier: String,
    rate: Arc<RateLimiter>,
    retry: RetryPolicy,
    ledger: Option<Arc<Ledger>>,
    config: ScopeConfig,

    cursor: String,
    buffer: VecDeque<ItemDocument>,
    state: CursorState,
    pages_fetched: u64,
    /// Items skipped by the ledger pre-filter.
    skipped_existing: u64,
    /// Items rejected by the time-window filter.
    filtered_out: u64,
}

impl CrawlCursor {
    pub fn new(
        source: Arc<dyn PageSource>,
        identifier: impl Into<String>,
        rate: Arc<RateLimiter>,
        retry: RetryPolicy,
        ledger: Option<Arc<Ledger>>,
        config: ScopeConfig,
    ) -> Self {
        Self {
            source,
            identifier: identifier.into(),
            rate,
            retry,
            ledger,
            config,
            cursor: "0".to_string(),
            buffer: VecDeque::new(),
            state: CursorState::Active,
            pages_fetched: 0,
            skipped_existing: 0,
            filtered_out: 0,
        }
    }

    /// Ledger scope label of the underlying source.
    pub fn scope(&self) -> &'static str {
        self.source.scope()
    }

    /// Identifier being enumerated (the ledger owner key).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn skipped_existing(&self) -> u64 {
        self.skipped_existing
    }

    pub fn filtered_out(&self) -> u64 {
        self.filtered_out
    }

    /// Next surviving item.
    ///
    /// `Ok(None)` means the enumeration completed; an `Err` means it was
    /// aborted mid-way after the fetch retries were exhausted. The two are
    /// deliberately distinguishable: items yielded before the error were
    /// real and remain processed.
    pub async fn next_item(&mut self) -> Result<Option<ItemDocument>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                if !self.config.time_window.contains(item.created_at()) {
                    self.filtered_out += 1;
                    continue;
                }
                if self.config.incremental && self.is_recorded(&item).await {
                    self.skipped_existing += 1;
                    tracing::debug!(
                        "{} {}: skipping already-recorded item {:?}",
                        self.scope(),
                        self.identifier,
                        item.item_id()
                    );
                    continue;
                }
                return Ok(Some(item));
            }

            if self.state == CursorState::Exhausted {
                return Ok(None);
            }

            self.fetch_next_page().await?;
        }
    }

    async fn fetch_next_page(&mut self) -> Result<()> {
        // Politeness jitter between pages, on top of the fixed-rate limit.
        if self.pages_fetched > 0 {
            let delay_ms = rand::thread_rng().gen_range(2000..4000);
            sleep(Duration::from_millis(delay_ms)).await;
        }

        self.rate.acquire().await;

        let source = self.source.clone();
        let identifier = self.identifier.clone();
        let cursor = self.cursor.clone();
        let page = self
            .retry
            .run(|| {
                let source = source.clone();
                let identifier = identifier.clone();
                let cursor = cursor.clone();
                async move { source.fetch_page(&identifier, &cursor).await }
            })
            .await;

        let page = match page {
            Ok(page) => page,
            Err(e) => {
                // An aborted enumeration must not masquerade as completion.
                self.state = CursorState::Exhausted;
                return Err(Error::Enumeration(format!(
                    "{} {}: page fetch failed after retries: {}",
                    self.scope(),
                    self.identifier,
                    e
                )));
            }
        };

        self.pages_fetched += 1;
        tracing::debug!(
            "{} {}: page {} with {} items (has_more: {})",
            self.scope(),
            self.identifier,
            self.pages_fetched,
            page.items.len(),
            page.has_more
        );

        if page.items.is_empty() || !page.has_more {
            self.state = CursorState::Exhausted;
        }
        self.cursor = page.next_cursor;
        self.buffer.extend(page.items);
        Ok(())
    }

    async fn is_recorded(&self, item: &ItemDocument) -> bool {
        let Some(ledger) = &self.ledger else {
            return false;
        };
        let Some(item_id) = item.item_id() else {
            return false;
        };
        ledger.exists(self.scope(), &self.identifier, item_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    use crate::api::types::PageResult;

    /// Scripted page source: each call pops the next canned response.
    struct ScriptedSource {
        pages: Vec<Result<PageResult>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<PageResult>>) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(&self, _identifier: &str, _cursor: &str) -> Result<PageResult> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.get(idx) {
                Some(Ok(page)) => Ok(PageResult {
                    items: page.items.clone(),
                    next_cursor: page.next_cursor.clone(),
                    has_more: page.has_more,
                }),
                Some(Err(_)) => Err(Error::Api("scripted failure".into())),
                None => Err(Error::Api("script exhausted".into())),
            }
        }

        fn scope(&self) -> &'static str {
            "post"
        }
    }

    fn item(id: i64) -> ItemDocument {
        ItemDocument::new(json!({"aweme_id": id.to_string(), "create_time": 1700000000}))
    }

    fn page(ids: &[i64], next: &str, has_more: bool) -> PageResult {
        PageResult {
            items: ids.iter().map(|id| item(*id)).collect(),
            next_cursor: next.to_string(),
            has_more,
        }
    }

    fn cursor_over(
        source: ScriptedSource,
        ledger: Option<Arc<Ledger>>,
        config: ScopeConfig,
    ) -> CrawlCursor {
        CrawlCursor::new(
            Arc::new(source),
            "u1",
            Arc::new(RateLimiter::new(1000.0)),
            RetryPolicy::new(2, vec![Duration::from_millis(1)]),
            ledger,
            config,
        )
    }

    async fn drain(cursor: &mut CrawlCursor) -> (Vec<i64>, Option<Error>) {
        let mut ids = Vec::new();
        loop {
            match cursor.next_item().await {
                Ok(Some(item)) => ids.push(item.item_id().unwrap()),
                Ok(None) => return (ids, None),
                Err(e) => return (ids, Some(e)),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn single_page_with_has_more_false_exhausts() {
        let source = ScriptedSource::new(vec![Ok(page(&[1, 2, 3], "10", false))]);
        let mut cursor = cursor_over(source, None, ScopeConfig::default());

        let (ids, err) = drain(&mut cursor).await;
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(err.is_none());

        // Exhausted stays exhausted.
        assert!(cursor.next_item().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn error_on_second_page_yields_first_page_then_enumeration_error() {
        let source = ScriptedSource::new(vec![
            Ok(page(&[1, 2], "10", true)),
            Err(Error::Api("down".into())),
        ]);
        let mut cursor = cursor_over(source, None, ScopeConfig::default());

        let (ids, err) = drain(&mut cursor).await;
        assert_eq!(ids, vec![1, 2]);
        assert!(matches!(err, Some(Error::Enumeration(_))));

        // After the abort the cursor reports exhaustion, not more errors.
        assert!(cursor.next_item().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_first_page_completes_without_items() {
        let source = ScriptedSource::new(vec![Ok(page(&[], "0", true))]);
        let mut cursor = cursor_over(source, None, ScopeConfig::default());

        let (ids, err) = drain(&mut cursor).await;
        assert!(ids.is_empty());
        assert!(err.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn incremental_mode_skips_recorded_items() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(Ledger::open(&dir.path().join("ledger.jsonl")).unwrap());
        ledger.record("post", "u1", 42, None).await.unwrap();

        let source = ScriptedSource::new(vec![Ok(page(&[41, 42, 43], "10", false))]);
        let config = ScopeConfig {
            incremental: true,
            ..Default::default()
        };
        let mut cursor = cursor_over(source, Some(ledger), config);

        let (ids, err) = drain(&mut cursor).await;
        assert_eq!(ids, vec![41, 43]);
        assert!(err.is_none());
        assert_eq!(cursor.skipped_existing(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recorded_items_pass_when_incremental_is_off() {
        let dir = tempdir().unwrap();
        let ledger = Arc::new(Ledger::open(&dir.path().join("ledger.jsonl")).unwrap());
        ledger.record("post", "u1", 42, None).await.unwrap();

        let source = ScriptedSource::new(vec![Ok(page(&[42], "10", false))]);
        let mut cursor = cursor_over(source, Some(ledger), ScopeConfig::default());

        let (ids, _) = drain(&mut cursor).await;
        assert_eq!(ids, vec![42]);
    }

    #[tokio::test(start_paused = true)]
    async fn time_window_rejects_items_outside_it() {
        // create_time 1700000000 is 2023-11-14.
        let source = ScriptedSource::new(vec![Ok(page(&[1, 2], "10", false))]);
        let config = ScopeConfig {
            time_window: TimeWindow {
                start: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
                end: None,
            },
            ..Default::default()
        };
        let mut cursor = cursor_over(source, None, config);

        let (ids, err) = drain(&mut cursor).await;
        assert!(ids.is_empty());
        assert!(err.is_none());
        assert_eq!(cursor.filtered_out(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn multi_page_enumeration_follows_cursor() {
        let source = ScriptedSource::new(vec![
            Ok(page(&[1, 2], "10", true)),
            Ok(page(&[3], "20", true)),
            Ok(page(&[], "20", false)),
        ]);
        let mut cursor = cursor_over(source, None, ScopeConfig::default());

        let (ids, err) = drain(&mut cursor).await;
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(err.is_none());
    }

    #[test]
    fn time_window_passes_undated_items() {
        let window = TimeWindow {
            start: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            end: Some(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()),
        };
        assert!(window.contains(None));
    }
}
