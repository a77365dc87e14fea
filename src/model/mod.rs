//! Domain types the mapper reads from and writes onto

mod asset;
mod entity;
mod metadata;

pub use asset::{Asset, AssetId, AssetTimestamps, TITLE_MAX_LENGTH};
pub use entity::{AssetCollection, EntityId, NamedEntity, Tag};
pub use metadata::MetaDataCollection;
