mod asset;
mod memory;

pub use asset::{AssetRepository, PgAssetRepository};
pub use memory::InMemoryAssetRepository;
