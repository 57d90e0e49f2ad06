use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A reusable contract template. `body` is line-oriented markup with
/// `{{identifier}}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateRow {
    pub id: Uuid,
    pub title: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub template_type: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
