//! Axum route handlers for the Contracts and Template preview APIs.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contracts::generator::{
    contract_download_url, delete_contract, generate_contract, layout_prepared, prepare_contract,
    regenerate_contract, GenerateContractRequest, GeneratedContract,
};
use crate::contracts::variables::VariableSet;
use crate::errors::AppError;
use crate::layout::LaidOutDocument;
use crate::models::contract::ContractRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Body of the template preview endpoints; the template comes from the path.
#[derive(Debug, Deserialize)]
pub struct TemplatePreviewRequest {
    pub client_id: Uuid,
    pub project_id: Uuid,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    #[serde(default)]
    pub signer_name: Option<String>,
    #[serde(default)]
    pub signer_email: Option<String>,
}

impl TemplatePreviewRequest {
    fn for_template(self, template_id: Uuid) -> GenerateContractRequest {
        GenerateContractRequest {
            template_id,
            client_id: self.client_id,
            project_id: self.project_id,
            expires_at: self.expires_at,
            overrides: self.overrides,
            signer_name: self.signer_name,
            signer_email: self.signer_email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub title: String,
    pub body: String,
    pub variables: VariableSet,
    pub unresolved_placeholders: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LayoutPreviewResponse {
    pub page_count: usize,
    pub document: LaidOutDocument,
    pub unresolved_placeholders: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub url: String,
    pub expires_in_secs: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/contracts/generate
///
/// Full pipeline: resolve → render → layout → encode → upload → store.
pub async fn handle_generate_contract(
    State(state): State<AppState>,
    Json(request): Json<GenerateContractRequest>,
) -> Result<(StatusCode, Json<GeneratedContract>), AppError> {
    validate_request(&request)?;
    let generated = generate_contract(&state.generation_deps(), request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(generated)))
}

/// GET /api/v1/contracts/:id
pub async fn handle_get_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<ContractRow>, AppError> {
    Ok(Json(state.entities.get_contract(contract_id).await?))
}

/// POST /api/v1/contracts/:id/regenerate
///
/// Re-runs the pipeline with the stored request and fresh entity data.
pub async fn handle_regenerate_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<GeneratedContract>, AppError> {
    let regenerated =
        regenerate_contract(&state.generation_deps(), contract_id, Utc::now()).await?;
    Ok(Json(regenerated))
}

/// GET /api/v1/contracts/:id/download
pub async fn handle_download_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<DownloadResponse>, AppError> {
    let ttl = state.config.signed_url_ttl_secs;
    let url =
        contract_download_url(&state.generation_deps(), contract_id, Duration::from_secs(ttl))
            .await?;
    Ok(Json(DownloadResponse {
        url,
        expires_in_secs: ttl,
    }))
}

/// DELETE /api/v1/contracts/:id
pub async fn handle_delete_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_contract(&state.generation_deps(), contract_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/templates/:id/preview
///
/// Resolve + render only. Nothing is laid out or stored.
pub async fn handle_preview_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
    Json(request): Json<TemplatePreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let request = request.for_template(template_id);
    validate_request(&request)?;
    let prepared = prepare_contract(&state.generation_deps(), &request, Utc::now()).await?;
    Ok(Json(PreviewResponse {
        title: prepared.document.title,
        body: prepared.document.body,
        variables: prepared.variables,
        unresolved_placeholders: prepared.unresolved_placeholders,
    }))
}

/// POST /api/v1/templates/:id/layout
///
/// Resolve + render + layout. Returns the page model without storing it.
pub async fn handle_layout_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
    Json(request): Json<TemplatePreviewRequest>,
) -> Result<Json<LayoutPreviewResponse>, AppError> {
    let request = request.for_template(template_id);
    validate_request(&request)?;
    let prepared = prepare_contract(&state.generation_deps(), &request, Utc::now()).await?;
    let document =
        layout_prepared(prepared.document, &state.config.company, &state.layout).await?;
    Ok(Json(LayoutPreviewResponse {
        page_count: document.pages.len(),
        document,
        unresolved_placeholders: prepared.unresolved_placeholders,
    }))
}

fn validate_request(request: &GenerateContractRequest) -> Result<(), AppError> {
    if let Some(key) = request.overrides.keys().find(|k| k.trim().is_empty()) {
        return Err(AppError::Validation(format!(
            "override keys cannot be empty (got {key:?})"
        )));
    }
    if let Some(email) = request.signer_email.as_deref() {
        if !email.trim().is_empty() && !email.contains('@') {
            return Err(AppError::Validation(format!(
                "signer_email '{email}' is not an email address"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerateContractRequest {
        GenerateContractRequest {
            template_id: Uuid::nil(),
            client_id: Uuid::nil(),
            project_id: Uuid::nil(),
            expires_at: None,
            overrides: BTreeMap::new(),
            signer_name: None,
            signer_email: None,
        }
    }

    #[test]
    fn test_validate_rejects_blank_override_key() {
        let mut r = request();
        r.overrides.insert(" ".to_string(), "x".to_string());
        assert!(matches!(validate_request(&r), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_signer_email() {
        let mut r = request();
        r.signer_email = Some("not-an-email".to_string());
        assert!(matches!(validate_request(&r), Err(AppError::Validation(_))));

        r.signer_email = Some("jordan@acme.test".to_string());
        assert!(validate_request(&r).is_ok());

        r.signer_email = Some(String::new());
        assert!(validate_request(&r).is_ok());
    }
}
