//! Handler types and dependencies

use std::sync::Arc;

use reelcore::{Config, DbPool, ExtractionClient};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub extractor: Arc<ExtractionClient>,
    pub config: Arc<Config>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(db_pool: Arc<DbPool>, extractor: Arc<ExtractionClient>, config: Arc<Config>) -> Self {
        Self {
            db_pool,
            extractor,
            config,
        }
    }
}
