//! Database repositories for data access layer
//
// Media asset repositories
pub mod media;

pub use media::{AssetRepository, InMemoryAssetRepository, PgAssetRepository};
