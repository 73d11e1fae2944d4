//! Application state shared by all handlers.

use crate::auth::JwtService;
use crate::services::upload::UploadPipeline;
use reelstore_core::Config;
use reelstore_db::AssetRepository;
use reelstore_storage::LocalStorage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub assets: Arc<dyn AssetRepository>,
    pub pipeline: Arc<UploadPipeline>,
    pub jwt: Arc<JwtService>,
    /// Present when the local backend is active; serves `/objects` downloads.
    pub local_storage: Option<Arc<LocalStorage>>,
}
