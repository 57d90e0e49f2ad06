use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// A generated contract. The generation request (`template_id`, `client_id`,
/// `project_id`, `expires_at`, `overrides`, signer) is kept so the document can
/// be regenerated from scratch under the same id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContractRow {
    pub id: Uuid,
    pub template_id: Uuid,
    pub client_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    /// Rendered markup, after placeholder substitution.
    pub body: String,
    pub status: String,
    /// Blob key of the exported document, once uploaded.
    pub file_path: Option<String>,
    pub page_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub overrides: Json<BTreeMap<String, String>>,
    pub signer_name: Option<String>,
    pub signer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
