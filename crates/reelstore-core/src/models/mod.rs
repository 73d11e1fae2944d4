//! Data models for the application
//!
//! Each sub-module represents a specific feature area.

mod media;
mod storage;
mod video;

pub use media::*;
pub use storage::*;
pub use video::*;
