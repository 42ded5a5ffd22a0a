//! Per-item download planning.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::{asset_file_name, item_dir, item_stem, snapshot_file_name};
use crate::media::{extract_assets, AssetOptions, ItemDocument, MediaAsset};

/// One asset transfer: consumed exactly once by the worker pool.
///
/// Destinations are unique per item by construction, so no two in-flight
/// tasks ever target the same path.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub asset: MediaAsset,
    pub dest: PathBuf,
}

impl DownloadTask {
    pub fn is_mandatory(&self) -> bool {
        self.asset.kind.is_mandatory()
    }
}

/// Everything the pool needs to acquire one item.
#[derive(Debug)]
pub struct ItemPlan {
    pub dir: PathBuf,
    pub stem: String,
    pub tasks: Vec<DownloadTask>,
    /// Where to write the metadata snapshot, when configured.
    pub snapshot_path: Option<PathBuf>,
}

impl ItemPlan {
    /// An item with no mandatory asset cannot succeed; there is nothing to
    /// record.
    pub fn has_mandatory_assets(&self) -> bool {
        self.tasks.iter().any(DownloadTask::is_mandatory)
    }
}

/// Planning knobs derived from the run configuration.
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    pub assets: AssetOptions,
    pub save_snapshot: bool,
    pub folder_per_item: bool,
}

/// Build the download plan for one item.
pub fn plan_item(item: &ItemDocument, root: &Path, options: PlanOptions) -> Result<ItemPlan> {
    let stem = item_stem(item.created_at(), item.title());
    let dir = item_dir(root, item.author_name(), &stem, options.folder_per_item)?;

    let assets = extract_assets(item, options.assets);
    if assets.is_empty() {
        return Err(Error::Download(format!(
            "item {:?} exposes no downloadable assets",
            item.item_id()
        )));
    }

    let tasks = assets
        .into_iter()
        .map(|asset| {
            let dest = dir.join(asset_file_name(&stem, &asset));
            DownloadTask { asset, dest }
        })
        .collect();

    let snapshot_path = options
        .save_snapshot
        .then(|| dir.join(snapshot_file_name(&stem)));

    Ok(ItemPlan {
        dir,
        stem,
        tasks,
        snapshot_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::AssetKind;
    use serde_json::json;

    fn video_item() -> ItemDocument {
        ItemDocument::new(json!({
            "aweme_id": "7123456789012345678",
            "create_time": 1700000000,
            "desc": "clip",
            "author": {"sec_uid": "MS4wLjABAAAAxyz", "nickname": "someone"},
            "video": {
                "play_addr": {"url_list": ["https://cdn/play/v.mp4"]},
                "cover": {"url_list": ["https://cdn/cover.jpeg"]},
            },
            "music": {"play_url": {"url_list": ["https://cdn/m.mp3"]}},
        }))
    }

    fn options() -> PlanOptions {
        PlanOptions {
            assets: AssetOptions::default(),
            save_snapshot: true,
            folder_per_item: true,
        }
    }

    #[test]
    fn plan_places_all_files_under_the_item_dir() {
        let plan = plan_item(&video_item(), Path::new("/dl"), options()).unwrap();

        assert!(plan.has_mandatory_assets());
        assert!(plan.tasks.iter().all(|t| t.dest.starts_with(&plan.dir)));
        assert_eq!(
            plan.snapshot_path.as_ref().unwrap(),
            &plan.dir.join(format!("{}_data.json", plan.stem))
        );

        let kinds: Vec<AssetKind> = plan.tasks.iter().map(|t| t.asset.kind).collect();
        assert!(kinds.contains(&AssetKind::Video));
        assert!(kinds.contains(&AssetKind::Music));
    }

    #[test]
    fn task_destinations_are_unique() {
        let item = ItemDocument::new(json!({
            "aweme_id": "7",
            "create_time": 1700000000,
            "author": {"nickname": "a"},
            "images": [
                {"url_list": ["https://cdn/1.jpeg"]},
                {"url_list": ["https://cdn/2.jpeg"]},
            ],
        }));
        let plan = plan_item(&item, Path::new("/dl"), options()).unwrap();
        let mut dests: Vec<&PathBuf> = plan.tasks.iter().map(|t| &t.dest).collect();
        let before = dests.len();
        dests.sort();
        dests.dedup();
        assert_eq!(dests.len(), before);
    }

    #[test]
    fn assetless_item_fails_planning() {
        let item = ItemDocument::new(json!({"aweme_id": "7", "video": {}}));
        let err = plan_item(
            &item,
            Path::new("/dl"),
            PlanOptions {
                assets: AssetOptions {
                    music: false,
                    cover: false,
                    avatar: false,
                },
                save_snapshot: false,
                folder_per_item: true,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Download(_)));
    }

    #[test]
    fn cover_only_plan_has_no_mandatory_assets() {
        let item = ItemDocument::new(json!({
            "aweme_id": "7",
            "video": {"cover": {"url_list": ["https://cdn/c.jpeg"]}},
        }));
        let plan = plan_item(&item, Path::new("/dl"), options()).unwrap();
        assert!(!plan.has_mandatory_assets());
    }
}
