//! Document exporter: turns the laid-out page model into stored bytes.
//!
//! Concrete binary formats (PDF) are produced by an external encoder that reads
//! the same page model. `JsonPageEncoder` ships the model itself so the
//! pipeline runs end to end.

use bytes::Bytes;
use thiserror::Error;

use crate::layout::LaidOutDocument;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("page model serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait DocumentEncoder: Send + Sync {
    fn mime_type(&self) -> &'static str;
    /// File extension, without the dot.
    fn extension(&self) -> &'static str;
    fn encode(&self, document: &LaidOutDocument) -> Result<Bytes, ExportError>;
}

/// Serialises the page model as JSON.
pub struct JsonPageEncoder;

impl DocumentEncoder for JsonPageEncoder {
    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn encode(&self, document: &LaidOutDocument) -> Result<Bytes, ExportError> {
        Ok(Bytes::from(serde_json::to_vec(document)?))
    }
}
