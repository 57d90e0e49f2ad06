use std::sync::Arc;

use crate::config::Config;
use crate::contracts::generator::GenerationDeps;
use crate::contracts::EntityStore;
use crate::export::DocumentEncoder;
use crate::layout::LayoutConfig;
use crate::storage::BlobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Client, project, template and contract records. Default: PgEntityStore.
    pub entities: Arc<dyn EntityStore>,
    /// Generated documents. Default: S3BlobStore (MinIO locally).
    pub blobs: Arc<dyn BlobStore>,
    /// Page model → stored bytes. Default: JsonPageEncoder.
    pub encoder: Arc<dyn DocumentEncoder>,
    pub config: Config,
    pub layout: LayoutConfig,
}

impl AppState {
    /// Borrows the collaborators for one pipeline run.
    pub fn generation_deps(&self) -> GenerationDeps<'_> {
        GenerationDeps {
            store: self.entities.as_ref(),
            blobs: self.blobs.as_ref(),
            encoder: Arc::clone(&self.encoder),
            company: &self.config.company,
            layout: &self.layout,
            bucket: &self.config.s3_bucket,
        }
    }
}
