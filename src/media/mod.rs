//! Item metadata documents and the assets extracted from them.

pub mod assets;
pub mod item;

pub use assets::{extract_assets, AssetKind, AssetOptions, MediaAsset};
pub use item::ItemDocument;
