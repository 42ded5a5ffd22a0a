//! Run statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::media::AssetKind;

/// Shared counters, safe under concurrent download workers.
#[derive(Debug)]
pub struct RunStats {
    started: Instant,
    items_total: AtomicU64,
    items_succeeded: AtomicU64,
    items_failed: AtomicU64,
    items_skipped: AtomicU64,
    videos: AtomicU64,
    images: AtomicU64,
    audio: AtomicU64,
    covers: AtomicU64,
    avatars: AtomicU64,
    assets_skipped: AtomicU64,
    optional_failed: AtomicU64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            started: Instant::now(),
            items_total: AtomicU64::new(0),
            items_succeeded: AtomicU64::new(0),
            items_failed: AtomicU64::new(0),
            items_skipped: AtomicU64::new(0),
            videos: AtomicU64::new(0),
            images: AtomicU64::new(0),
            audio: AtomicU64::new(0),
            covers: AtomicU64::new(0),
            avatars: AtomicU64::new(0),
            assets_skipped: AtomicU64::new(0),
            optional_failed: AtomicU64::new(0),
        }
    }
}

impl RunStats {
    pub fn item_started(&self) {
        self.items_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn item_succeeded(&self) {
        self.items_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn item_failed(&self) {
        self.items_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Items skipped before download (ledger pre-filter or time window).
    pub fn items_skipped(&self, count: u64) {
        self.items_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn asset_downloaded(&self, kind: AssetKind) {
        let counter = match kind {
            AssetKind::Video => &self.videos,
            AssetKind::Image => &self.images,
            AssetKind::Music => &self.audio,
            AssetKind::Cover => &self.covers,
            AssetKind::Avatar => &self.avatars,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn asset_skipped(&self) {
        self.assets_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn optional_asset_failed(&self) {
        self.optional_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy for reporting.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            items_total: self.items_total.load(Ordering::Relaxed),
            items_succeeded: self.items_succeeded.load(Ordering::Relaxed),
            items_failed: self.items_failed.load(Ordering::Relaxed),
            items_skipped: self.items_skipped.load(Ordering::Relaxed),
            videos: self.videos.load(Ordering::Relaxed),
            images: self.images.load(Ordering::Relaxed),
            audio: self.audio.load(Ordering::Relaxed),
            covers: self.covers.load(Ordering::Relaxed),
            avatars: self.avatars.load(Ordering::Relaxed),
            assets_skipped: self.assets_skipped.load(Ordering::Relaxed),
            optional_failed: self.optional_failed.load(Ordering::Relaxed),
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }
}

/// Immutable view of the counters at one instant.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub items_total: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    pub items_skipped: u64,
    pub videos: u64,
    pub images: u64,
    pub audio: u64,
    pub covers: u64,
    pub avatars: u64,
    pub assets_skipped: u64,
    pub optional_failed: u64,
    pub elapsed_secs: f64,
}

impl StatsSnapshot {
    pub fn success_rate(&self) -> f64 {
        if self.items_total == 0 {
            return 0.0;
        }
        self.items_succeeded as f64 / self.items_total as f64 * 100.0
    }

    pub fn assets_downloaded(&self) -> u64 {
        self.videos + self.images + self.audio + self.covers + self.avatars
    }
}
