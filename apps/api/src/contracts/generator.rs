//! Contract Generation: orchestrates the full document pipeline.
//!
//! Flow: template lookup → resolve variables → render title/body →
//!       layout (spawn_blocking) → encode → upload → upsert contract record.
//!
//! All entity I/O happens before layout starts and all blob I/O after it ends.
//! Any NotFound aborts before layout; nothing is uploaded or stored.
//!
//! Regeneration re-runs everything under the same contract id. Two concurrent
//! regenerations of one contract are not serialised: the upload key and the
//! record are last-writer-wins.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::CompanyProfile;
use crate::contracts::renderer::{render, unresolved_placeholders};
use crate::contracts::store::EntityStore;
use crate::contracts::variables::{resolve_variables, ResolveParams, VariableSet};
use crate::errors::AppError;
use crate::export::DocumentEncoder;
use crate::layout::{layout_document, LaidOutDocument, LayoutConfig, RenderedDocument};
use crate::models::contract::ContractRow;
use crate::models::template::TemplateRow;
use crate::storage::{BlobStore, StoredObject};

pub const STATUS_GENERATED: &str = "generated";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Collaborators for one pipeline run, borrowed from `AppState`.
pub struct GenerationDeps<'a> {
    pub store: &'a dyn EntityStore,
    pub blobs: &'a dyn BlobStore,
    pub encoder: Arc<dyn DocumentEncoder>,
    pub company: &'a CompanyProfile,
    pub layout: &'a LayoutConfig,
    pub bucket: &'a str,
}

/// Request body for contract generation.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContractRequest {
    pub template_id: Uuid,
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

impl GenerateContractRequest {
    /// Rebuilds the original request from a stored contract.
    fn from_contract(contract: &ContractRow) -> Self {
        Self {
            template_id: contract.template_id,
            client_id: contract.client_id,
            project_id: contract.project_id,
            expires_at: contract.expires_at,
            overrides: contract.overrides.0.clone(),
            signer_name: contract.signer_name.clone(),
            signer_email: contract.signer_email.clone(),
        }
    }
}

/// Output of resolve + render, before layout.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedContract {
    pub template_id: Uuid,
    pub variables: VariableSet,
    pub document: RenderedDocument,
    /// Placeholders left verbatim in the title or body, sorted.
    pub unresolved_placeholders: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedContract {
    pub contract: ContractRow,
    /// Where the encoded document was written.
    pub stored: StoredObject,
    pub unresolved_placeholders: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Resolves variables and renders the template. No layout, no storage.
pub async fn prepare_contract(
    deps: &GenerationDeps<'_>,
    request: &GenerateContractRequest,
    now: DateTime<Utc>,
) -> Result<PreparedContract, AppError> {
    let template = deps.store.get_template(request.template_id).await?;
    info!(template_id = %template.id, kind = %template.template_type, "Loaded contract template");

    let variables = resolve_variables(
        deps.store,
        deps.company,
        ResolveParams {
            client_id: request.client_id,
            project_id: request.project_id,
            overrides: &request.overrides,
            expires_at: request.expires_at,
            now,
        },
    )
    .await?;

    Ok(render_prepared(&template, variables, request))
}

fn render_prepared(
    template: &TemplateRow,
    variables: VariableSet,
    request: &GenerateContractRequest,
) -> PreparedContract {
    let title = render(&template.title, &variables);
    let body = render(&template.body, &variables);

    let mut unresolved = unresolved_placeholders(&template.title, &variables);
    unresolved.extend(unresolved_placeholders(&template.body, &variables));
    unresolved.sort();
    unresolved.dedup();
    if !unresolved.is_empty() {
        warn!(
            template_id = %template.id,
            placeholders = ?unresolved,
            "Template has unresolved placeholders; rendering them verbatim"
        );
    }

    let value = |key: &str| variables.get(key).unwrap_or_default().to_string();
    let document = RenderedDocument {
        title,
        body,
        client_name: value("client_name"),
        client_email: variables
            .get("client_email")
            .filter(|e| *e != "N/A")
            .map(str::to_string),
        project_title: value("project_title"),
        contract_date: value("contract_date"),
        signer_name: request.signer_name.clone(),
        signer_email: request.signer_email.clone(),
    };

    PreparedContract {
        template_id: template.id,
        variables,
        document,
        unresolved_placeholders: unresolved,
    }
}

/// Lays out a prepared contract on the blocking pool.
pub async fn layout_prepared(
    document: RenderedDocument,
    company: &CompanyProfile,
    layout: &LayoutConfig,
) -> Result<LaidOutDocument, AppError> {
    let company = company.clone();
    let layout = layout.clone();
    tokio::task::spawn_blocking(move || layout_document(&document, &company, &layout))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))
}

/// Generates a new contract under a fresh id.
pub async fn generate_contract(
    deps: &GenerationDeps<'_>,
    request: GenerateContractRequest,
    now: DateTime<Utc>,
) -> Result<GeneratedContract, AppError> {
    let contract_id = Uuid::new_v4();
    info!(%contract_id, client_id = %request.client_id, "Generating contract");
    produce(deps, contract_id, request, None, now).await
}

/// Re-runs the whole pipeline for an existing contract, overwriting its document.
pub async fn regenerate_contract(
    deps: &GenerationDeps<'_>,
    contract_id: Uuid,
    now: DateTime<Utc>,
) -> Result<GeneratedContract, AppError> {
    let existing = deps.store.get_contract(contract_id).await?;
    info!(%contract_id, "Regenerating contract");
    let request = GenerateContractRequest::from_contract(&existing);
    produce(deps, contract_id, request, Some(existing), now).await
}

async fn produce(
    deps: &GenerationDeps<'_>,
    contract_id: Uuid,
    request: GenerateContractRequest,
    existing: Option<ContractRow>,
    now: DateTime<Utc>,
) -> Result<GeneratedContract, AppError> {
    // Step 1: resolve + render (all entity lookups happen here)
    let prepared = prepare_contract(deps, &request, now).await?;

    // Step 2: layout + encode (CPU-bound)
    let encoder = Arc::clone(&deps.encoder);
    let document = prepared.document.clone();
    let company = deps.company.clone();
    let layout = deps.layout.clone();
    let (page_count, bytes) = tokio::task::spawn_blocking(move || {
        let laid_out = layout_document(&document, &company, &layout);
        encoder
            .encode(&laid_out)
            .map(|bytes| (laid_out.pages.len(), bytes))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))??;
    info!(%contract_id, pages = page_count, bytes = bytes.len(), "Contract laid out");

    // Step 3: upload
    let path = storage_path(
        request.client_id,
        contract_id,
        &prepared.document.title,
        deps.encoder.extension(),
    );
    let stored = deps
        .blobs
        .upload(deps.bucket, &path, bytes, deps.encoder.mime_type())
        .await?;
    info!(
        %contract_id,
        bucket = %stored.bucket,
        path = %stored.path,
        bytes = stored.size,
        "Stored contract document"
    );

    // Step 4: persist; the record must point at the new upload before anything is deleted
    let contract = ContractRow {
        id: contract_id,
        template_id: request.template_id,
        client_id: request.client_id,
        project_id: request.project_id,
        title: prepared.document.title.clone(),
        body: prepared.document.body.clone(),
        status: STATUS_GENERATED.to_string(),
        file_path: Some(path),
        page_count: i32::try_from(page_count).unwrap_or(i32::MAX),
        expires_at: request.expires_at,
        overrides: Json(request.overrides),
        signer_name: request.signer_name,
        signer_email: request.signer_email,
        created_at: existing.as_ref().map(|c| c.created_at).unwrap_or(now),
        updated_at: now,
    };
    deps.store.save_contract(&contract).await?;

    // Step 5: drop a stale document left under a different key
    if let Some(old_path) = existing.as_ref().and_then(|c| c.file_path.as_deref()) {
        if old_path != stored.path {
            if let Err(e) = deps.blobs.delete(deps.bucket, old_path).await {
                warn!(%contract_id, old_path, "Failed to delete stale contract document: {e}");
            }
        }
    }

    Ok(GeneratedContract {
        contract,
        stored,
        unresolved_placeholders: prepared.unresolved_placeholders,
    })
}

/// Time-limited download link for a stored contract document.
pub async fn contract_download_url(
    deps: &GenerationDeps<'_>,
    contract_id: Uuid,
    ttl: Duration,
) -> Result<String, AppError> {
    let contract = deps.store.get_contract(contract_id).await?;
    let path = contract.file_path.ok_or_else(|| {
        AppError::NotFound(format!("Contract {contract_id} has no stored document"))
    })?;
    Ok(deps.blobs.signed_url(deps.bucket, &path, ttl).await?)
}

/// Deletes the contract record. Removing its document is best-effort.
pub async fn delete_contract(deps: &GenerationDeps<'_>, contract_id: Uuid) -> Result<(), AppError> {
    let contract = deps.store.get_contract(contract_id).await?;
    if let Some(path) = contract.file_path.as_deref() {
        if let Err(e) = deps.blobs.delete(deps.bucket, path).await {
            warn!(%contract_id, path, "Failed to delete contract document: {e}");
        }
    }
    deps.store.delete_contract(contract_id).await?;
    info!(%contract_id, "Deleted contract");
    Ok(())
}

/// `contracts/<client>/<contract>/<slug>.<ext>`
pub fn storage_path(client_id: Uuid, contract_id: Uuid, title: &str, extension: &str) -> String {
    let mut name = slug::slugify(title);
    if name.is_empty() {
        name = "contract".to_string();
    }
    format!("contracts/{client_id}/{contract_id}/{name}.{extension}")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
