//! In-memory collaborators and fixtures shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::{CompanyProfile, Config};
use crate::contracts::EntityStore;
use crate::errors::AppError;
use crate::models::client::ClientRow;
use crate::models::contract::ContractRow;
use crate::models::project::{Milestone, ProjectRow};
use crate::models::template::TemplateRow;
use crate::storage::{BlobStore, StorageError, StoredObject};

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

pub const SAMPLE_CLIENT_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);
pub const SAMPLE_PROJECT_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0002);
pub const SAMPLE_TEMPLATE_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0003);

/// 2026-10-17T09:30:00Z
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub fn sample_company() -> CompanyProfile {
    CompanyProfile {
        name: "Northwind Talent".to_string(),
        email: "hello@northwind.test".to_string(),
        address: "1 Harbour St, Sydney".to_string(),
        phone: "+61 2 5550 0000".to_string(),
        website: "northwind.test".to_string(),
    }
}

pub fn sample_client() -> ClientRow {
    ClientRow {
        id: SAMPLE_CLIENT_ID,
        name: "Acme".to_string(),
        email: Some("ops@acme.test".to_string()),
        company: Some("Acme Pty Ltd".to_string()),
        phone: Some("+61 3 5550 1234".to_string()),
        address: Some("42 Collins St, Melbourne".to_string()),
        created_at: fixed_now(),
    }
}

pub fn sample_project() -> ProjectRow {
    ProjectRow {
        id: SAMPLE_PROJECT_ID,
        client_id: SAMPLE_CLIENT_ID,
        title: "Website Rebuild".to_string(),
        description: Some("Rebuild the marketing site.".to_string()),
        budget: Some(12_500.0),
        start_date: NaiveDate::from_ymd_opt(2026, 11, 2),
        due_date: NaiveDate::from_ymd_opt(2027, 2, 26),
        milestones: Json(vec![
            Milestone {
                title: "Discovery".to_string(),
                due_date: NaiveDate::from_ymd_opt(2026, 11, 20),
                completed: false,
            },
            Milestone {
                title: "Launch".to_string(),
                due_date: None,
                completed: false,
            },
        ]),
        created_at: fixed_now(),
    }
}

/// A service agreement whose title renders to "Service Agreement: Acme".
pub fn sample_template(body: &str) -> TemplateRow {
    TemplateRow {
        id: SAMPLE_TEMPLATE_ID,
        title: "Service Agreement: {{client_name}}".to_string(),
        template_type: "service_agreement".to_string(),
        body: body.to_string(),
        created_at: fixed_now(),
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/agency_test".to_string(),
        s3_bucket: "contracts".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        signed_url_ttl_secs: 600,
        company: sample_company(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryEntityStore
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryEntityStore {
    clients: RwLock<HashMap<Uuid, ClientRow>>,
    projects: RwLock<HashMap<Uuid, ProjectRow>>,
    templates: RwLock<HashMap<Uuid, TemplateRow>>,
    contracts: RwLock<HashMap<Uuid, ContractRow>>,
    fail_saves: AtomicBool,
}

impl MemoryEntityStore {
    /// Store seeded with the sample client, project and a template with `body`.
    pub async fn seeded(body: &str) -> Self {
        let store = Self::default();
        store.put_client(sample_client()).await;
        store.put_project(sample_project()).await;
        store.put_template(sample_template(body)).await;
        store
    }

    pub async fn put_client(&self, client: ClientRow) {
        self.clients.write().await.insert(client.id, client);
    }

    pub async fn put_project(&self, project: ProjectRow) {
        self.projects.write().await.insert(project.id, project);
    }

    pub async fn put_template(&self, template: TemplateRow) {
        self.templates.write().await.insert(template.id, template);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub async fn contract(&self, id: Uuid) -> Option<ContractRow> {
        self.contracts.read().await.get(&id).cloned()
    }

    pub async fn contract_count(&self) -> usize {
        self.contracts.read().await.len()
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn get_client(&self, id: Uuid) -> Result<ClientRow, AppError> {
        self.clients
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Client {id} not found")))
    }

    async fn get_project(&self, id: Uuid) -> Result<ProjectRow, AppError> {
        self.projects
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))
    }

    async fn get_template(&self, id: Uuid) -> Result<TemplateRow, AppError> {
        self.templates
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))
    }

    async fn get_contract(&self, id: Uuid) -> Result<ContractRow, AppError> {
        self.contract(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Contract {id} not found")))
    }

    async fn save_contract(&self, contract: &ContractRow) -> Result<(), AppError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "injected save failure for contract {}",
                contract.id
            )));
        }
        let mut contracts = self.contracts.write().await;
        let mut row = contract.clone();
        if let Some(existing) = contracts.get(&contract.id) {
            row.created_at = existing.created_at;
        }
        contracts.insert(row.id, row);
        Ok(())
    }

    async fn delete_contract(&self, id: Uuid) -> Result<(), AppError> {
        self.contracts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Contract {id} not found")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryBlobStore
// ────────────────────────────────────────────────────────────────────────────

struct MemoryObject {
    bytes: Bytes,
    mime_type: String,
}

/// Blob store keyed by `(bucket, path)` with switchable upload/delete failures.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<(String, String), MemoryObject>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn get(&self, bucket: &str, path: &str) -> Option<Bytes> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| o.bytes.clone())
    }

    pub async fn mime_type(&self, bucket: &str, path: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| o.mime_type.clone())
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> Result<StoredObject, StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Upload(format!("injected failure for {path}")));
        }
        let size = bytes.len();
        self.objects.write().await.insert(
            (bucket.to_string(), path.to_string()),
            MemoryObject {
                bytes,
                mime_type: mime_type.to_string(),
            },
        );
        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size,
        })
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!("memory://{bucket}/{path}?ttl={}", ttl.as_secs()))
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Delete(format!("injected failure for {path}")));
        }
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), path.to_string()));
        Ok(())
    }
}
