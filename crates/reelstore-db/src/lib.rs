//! Reelstore DB Library
//!
//! Record store for media assets: the `AssetRepository` trait with a Postgres
//! implementation and an in-memory one for development and tests.

pub mod db;

pub use db::{AssetRepository, InMemoryAssetRepository, PgAssetRepository};
