//! Top-level acquisition driver.
//!
//! For each input reference: classify, enumerate (or fetch the single item
//! through the detail fallback chain), filter, and hand every surviving item
//! to the bounded download pool. Items move through
//! `Classified -> Enumerating -> Downloading -> Recorded | Failed`; a single
//! item's failure never aborts the batch, a ledger failure always does.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::api::sources::{CollectionSource, LikesSource, MusicSource, PostsSource};
use crate::api::{detail_chain, DetailSource, DouyinApi, PageSource};
use crate::classify::{Classifier, ScopeKind};
use crate::config::{Config, UserMode};
use crate::crawl::{CrawlCursor, ScopeConfig};
use crate::download::fetch::{DownloadOutcome, ResumableDownloader};
use crate::download::stats::{RunStats, StatsSnapshot};
use crate::download::task::{plan_item, DownloadTask, ItemPlan, PlanOptions};
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::media::{AssetOptions, ItemDocument};
use crate::output::{print_info, print_warning};
use crate::throttle::{RateLimiter, RetryPolicy};

/// Outcome of one orchestrator invocation.
#[derive(Debug)]
pub struct RunReport {
    pub inputs_total: usize,
    pub inputs_failed: usize,
    pub stats: StatsSnapshot,
}

impl RunReport {
    /// Every input failed to classify or enumerate.
    pub fn all_inputs_failed(&self) -> bool {
        self.inputs_total > 0 && self.inputs_failed == self.inputs_total
    }
}

/// Drives the whole pipeline for a batch of input references.
pub struct Orchestrator {
    api: Arc<DouyinApi>,
    classifier: Classifier,
    ledger: Option<Arc<Ledger>>,
    downloader: Arc<ResumableDownloader>,
    config: Arc<Config>,
    rate: Arc<RateLimiter>,
    retry: RetryPolicy,
    pool: Arc<Semaphore>,
    stats: Arc<RunStats>,
    detail_sources: Vec<Box<dyn DetailSource>>,
    root: PathBuf,
    plan_options: PlanOptions,
}

impl Orchestrator {
    pub fn new(
        api: Arc<DouyinApi>,
        classifier: Classifier,
        ledger: Option<Arc<Ledger>>,
        downloader: Arc<ResumableDownloader>,
        config: Arc<Config>,
    ) -> Self {
        let rate = Arc::new(RateLimiter::new(config.options.max_per_second));
        let retry = RetryPolicy::new(
            config.options.retries,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(5),
            ],
        );
        let pool = Arc::new(Semaphore::new(config.options.thread.max(1)));
        let detail_sources = detail_chain(api.clone());
        let root = config.download_root();
        let plan_options = PlanOptions {
            assets: AssetOptions {
                music: config.options.music,
                cover: config.options.cover,
                avatar: config.options.avatar,
            },
            save_snapshot: config.options.json,
            folder_per_item: config.options.folderstyle,
        };

        Self {
            api,
            classifier,
            ledger,
            downloader,
            config,
            rate,
            retry,
            pool,
            stats: Arc::new(RunStats::default()),
            detail_sources,
            root,
            plan_options,
        }
    }

    /// Shared statistics counters.
    pub fn stats(&self) -> Arc<RunStats> {
        self.stats.clone()
    }

    /// Process every input reference and report aggregate results.
    pub async fn run(&self, inputs: &[String]) -> Result<RunReport> {
        let mut failed = 0usize;

        for (index, input) in inputs.iter().enumerate() {
            print_info(&format!(
                "[{}/{}] Processing: {}",
                index + 1,
                inputs.len(),
                input
            ));

            match self.process_input(input).await {
                Ok(()) => {}
                Err(e @ Error::Ledger(_)) => return Err(e),
                Err(e) => {
                    print_warning(&format!("Input failed: {}", e));
                    failed += 1;
                }
            }
        }

        Ok(RunReport {
            inputs_total: inputs.len(),
            inputs_failed: failed,
            stats: self.stats.snapshot(),
        })
    }

    async fn process_input(&self, input: &str) -> Result<()> {
        let reference = self.classifier.classify(input).await?;
        tracing::info!("classified {} as {} {}", input, reference.scope, reference.id);

        match reference.scope {
            ScopeKind::Item => self.acquire_single(&reference.id).await,
            ScopeKind::User => self.acquire_user(&reference.id).await,
            ScopeKind::Collection => {
                self.acquire_listing(
                    Arc::new(CollectionSource(self.api.clone())),
                    &reference.id,
                    self.config.scope_config(ScopeKind::Collection, None),
                )
                .await
            }
            ScopeKind::MusicTrack => {
                self.acquire_listing(
                    Arc::new(MusicSource(self.api.clone())),
                    &reference.id,
                    self.config.scope_config(ScopeKind::MusicTrack, None),
                )
                .await
            }
            ScopeKind::Live => Err(Error::Classification(format!(
                "live rooms cannot be downloaded: {}",
                input
            ))),
        }
    }

    /// Fetch one item's metadata through the fallback chain and download it.
    async fn acquire_single(&self, id: &str) -> Result<()> {
        self.rate.acquire().await;

        let mut document = None;
        let mut last_error = None;
        for source in &self.detail_sources {
            match self.retry.run(|| source.fetch_one(id)).await {
                Ok(item) => {
                    tracing::debug!("{} resolved item {}", source.name(), id);
                    document = Some(item);
                    break;
                }
                Err(e) => {
                    tracing::warn!("{} failed for {}: {}", source.name(), id, e);
                    last_error = Some(e);
                }
            }
        }

        let Some(item) = document else {
            self.stats.item_started();
            self.stats.item_failed();
            return Err(last_error
                .unwrap_or_else(|| Error::Api(format!("no metadata source succeeded for {}", id))));
        };

        let owner = item.author_id().unwrap_or(id).to_string();
        let mut pending = JoinSet::new();
        self.spawn_item(&mut pending, item, "item", owner);
        drain_items(&mut pending).await
    }

    /// Enumerate a user profile in every configured mode.
    async fn acquire_user(&self, sec_uid: &str) -> Result<()> {
        let modes = self.config.options.mode.clone();
        let mut first_error = None;
        let mut any_succeeded = false;

        for mode in modes {
            let result = match mode {
                UserMode::Post => {
                    self.acquire_listing(
                        Arc::new(PostsSource(self.api.clone())),
                        sec_uid,
                        self.config.scope_config(ScopeKind::User, Some(UserMode::Post)),
                    )
                    .await
                }
                UserMode::Like => {
                    self.acquire_listing(
                        Arc::new(LikesSource(self.api.clone())),
                        sec_uid,
                        self.config.scope_config(ScopeKind::User, Some(UserMode::Like)),
                    )
                    .await
                }
                UserMode::Mix => self.acquire_user_mixes(sec_uid).await,
            };

            match result {
                Ok(()) => any_succeeded = true,
                Err(e @ Error::Ledger(_)) => return Err(e),
                Err(e) => {
                    print_warning(&format!("{} mode failed for {}: {}", mode, sec_uid, e));
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if any_succeeded {
            Ok(())
        } else {
            Err(first_error.unwrap_or_else(|| Error::Config("no profile modes configured".into())))
        }
    }

    /// Walk a cursor and feed surviving items to the pool.
    async fn acquire_listing(
        &self,
        source: Arc<dyn PageSource>,
        identifier: &str,
        scope_config: ScopeConfig,
    ) -> Result<()> {
        let scope = source.scope();
        print_info(&format!("Enumerating {} {}", scope, identifier));

        let max_items = scope_config.max_items;
        let mut cursor = CrawlCursor::new(
            source,
            identifier,
            self.rate.clone(),
            self.retry.clone(),
            self.ledger.clone(),
            scope_config,
        );

        let mut pending = JoinSet::new();
        let mut emitted = 0u64;
        let mut enumeration_error = None;

        loop {
            // The item limit applies post-filter, so it lives here and not
            // in the cursor.
            if max_items > 0 && emitted >= max_items {
                tracing::info!("{} {}: reached item limit {}", scope, identifier, max_items);
                break;
            }
            match cursor.next_item().await {
                Ok(Some(item)) => {
                    emitted += 1;
                    self.spawn_item(&mut pending, item, scope, identifier.to_string());
                }
                Ok(None) => break,
                Err(e) => {
                    enumeration_error = Some(e);
                    break;
                }
            }
        }

        self.stats.items_skipped(cursor.skipped_existing());

        // Items yielded before an enumeration error still finish downloading.
        drain_items(&mut pending).await?;

        if let Some(e) = enumeration_error {
            print_warning(&format!(
                "{} {}: enumeration aborted, partial results kept: {}",
                scope, identifier, e
            ));
            return Err(e);
        }

        tracing::info!("{} {}: enumeration complete, {} items", scope, identifier, emitted);
        Ok(())
    }

    /// Enumerate a user's collections, then every item inside each.
    async fn acquire_user_mixes(&self, sec_uid: &str) -> Result<()> {
        let limit = self.config.number.allmix;
        let mut cursor_token = "0".to_string();
        let mut enumerated = 0u64;

        loop {
            self.rate.acquire().await;

            let api = self.api.clone();
            let page = self
                .retry
                .run(|| {
                    let api = api.clone();
                    let sec = sec_uid.to_string();
                    let cursor = cursor_token.clone();
                    async move { api.user_mix_list(&sec, &cursor).await }
                })
                .await
                .map_err(|e| {
                    Error::Enumeration(format!("collection list for {}: {}", sec_uid, e))
                })?;

            if page.mixes.is_empty() {
                break;
            }

            for mix in page.mixes {
                if limit > 0 && enumerated >= limit {
                    tracing::info!("reached collection limit {}", limit);
                    return Ok(());
                }
                print_info(&format!(
                    "Collection {} ({})",
                    mix.mix_name.as_deref().unwrap_or("unnamed"),
                    mix.mix_id
                ));
                let result = self
                    .acquire_listing(
                        Arc::new(CollectionSource(self.api.clone())),
                        &mix.mix_id,
                        self.config.scope_config(ScopeKind::Collection, None),
                    )
                    .await;
                match result {
                    Ok(()) => {}
                    Err(e @ Error::Ledger(_)) => return Err(e),
                    // One aborted collection does not stop the remaining ones.
                    Err(e) => print_warning(&format!("collection {} failed: {}", mix.mix_id, e)),
                }
                enumerated += 1;
            }

            if !page.has_more {
                break;
            }
            cursor_token = page.next_cursor;
        }

        Ok(())
    }

    /// Plan one item and hand it to the pool.
    fn spawn_item(
        &self,
        pending: &mut JoinSet<Result<()>>,
        item: ItemDocument,
        scope: &'static str,
        owner: String,
    ) {
        self.stats.item_started();

        let plan = match plan_item(&item, &self.root, self.plan_options) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!("planning failed for item {:?}: {}", item.item_id(), e);
                self.stats.item_failed();
                return;
            }
        };

        tracing::info!("downloading {} ({} assets)", plan.stem, plan.tasks.len());

        pending.spawn(run_item_job(
            self.downloader.clone(),
            self.pool.clone(),
            self.ledger.clone(),
            self.stats.clone(),
            scope,
            owner,
            item,
            plan,
        ));
    }
}

/// Acquire every asset of one item, then record it if the mandatory ones
/// succeeded. Returns an error only for ledger failures.
#[allow(clippy::too_many_arguments)]
async fn run_item_job(
    downloader: Arc<ResumableDownloader>,
    pool: Arc<Semaphore>,
    ledger: Option<Arc<Ledger>>,
    stats: Arc<RunStats>,
    scope: &'static str,
    owner: String,
    item: ItemDocument,
    plan: ItemPlan,
) -> Result<()> {
    if let Some(path) = &plan.snapshot_path {
        if let Err(e) = write_snapshot(path, &item).await {
            tracing::warn!("failed to write snapshot {}: {}", path.display(), e);
        }
    }

    if !plan.has_mandatory_assets() {
        tracing::warn!("item {:?} exposes no primary media", item.item_id());
        stats.item_failed();
        return Ok(());
    }

    let attempts = plan.tasks.iter().map(|task| {
        let downloader = downloader.clone();
        let pool = pool.clone();
        let stats = stats.clone();
        async move {
            let _permit = match pool.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (task.is_mandatory(), false),
            };
            match download_task(&downloader, task).await {
                Ok(DownloadOutcome::Downloaded) => {
                    stats.asset_downloaded(task.asset.kind);
                    (task.is_mandatory(), true)
                }
                Ok(DownloadOutcome::SkippedExisting) => {
                    stats.asset_skipped();
                    (task.is_mandatory(), true)
                }
                Err(e) => {
                    tracing::warn!("asset {} failed: {}", task.dest.display(), e);
                    if !task.is_mandatory() {
                        stats.optional_asset_failed();
                    }
                    (task.is_mandatory(), false)
                }
            }
        }
    });
    let results = futures::future::join_all(attempts).await;

    if mandatory_assets_succeeded(&results) {
        stats.item_succeeded();
        if let Some(ledger) = &ledger {
            match item.item_id() {
                Some(item_id) => {
                    ledger
                        .record(scope, &owner, item_id, item.title().map(str::to_string))
                        .await?;
                }
                None => {
                    tracing::warn!("item without a numeric id cannot be recorded in the ledger");
                }
            }
        }
    } else {
        stats.item_failed();
    }

    Ok(())
}

/// An item succeeds when it has at least one mandatory asset and every
/// mandatory asset succeeded. Optional assets never gate recording.
fn mandatory_assets_succeeded(results: &[(bool, bool)]) -> bool {
    let mut saw_mandatory = false;
    for (mandatory, succeeded) in results {
        if *mandatory {
            saw_mandatory = true;
            if !succeeded {
                return false;
            }
        }
    }
    saw_mandatory
}

/// Try each URL candidate of a task until one transfers.
async fn download_task(
    downloader: &ResumableDownloader,
    task: &DownloadTask,
) -> Result<DownloadOutcome> {
    let mut last_error = None;
    for url in &task.asset.urls {
        match downloader.download(url, &task.dest).await {
            Ok(outcome) => return Ok(outcome),
            Err(e) => {
                tracing::debug!("candidate {} failed for {}: {}", url, task.dest.display(), e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        Error::Download(format!("{}: no URL candidates", task.dest.display()))
    }))
}

async fn write_snapshot(path: &std::path::Path, item: &ItemDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_string_pretty(item.raw())?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

/// Wait for every in-flight item; the first ledger error wins.
async fn drain_items(pending: &mut JoinSet<Result<()>>) -> Result<()> {
    let mut fatal = None;
    while let Some(joined) = pending.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if fatal.is_none() {
                    fatal = Some(e);
                }
            }
            Err(e) => tracing::warn!("item task aborted: {}", e),
        }
    }
    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_mandatory_succeeding_records_the_item() {
        // (mandatory, succeeded)
        assert!(mandatory_assets_succeeded(&[(true, true)]));
        assert!(mandatory_assets_succeeded(&[(true, true), (false, false)]));
        assert!(mandatory_assets_succeeded(&[
            (true, true),
            (true, true),
            (false, true)
        ]));
    }

    #[test]
    fn failed_mandatory_asset_fails_the_item_even_if_optional_succeeded() {
        // The video failed all retries but the cover landed on disk: the
        // item counts as failed and must not be recorded.
        assert!(!mandatory_assets_succeeded(&[(true, false), (false, true)]));
        assert!(!mandatory_assets_succeeded(&[(true, true), (true, false)]));
    }

    #[test]
    fn item_with_only_optional_assets_cannot_succeed() {
        assert!(!mandatory_assets_succeeded(&[(false, true), (false, true)]));
        assert!(!mandatory_assets_succeeded(&[]));
    }
}
