//! Entity lookup: the persistence collaborator of the contract pipeline.
//!
//! `AppState` holds an `Arc<dyn EntityStore>`; `PgEntityStore` is the production
//! backend. Missing rows surface as `AppError::NotFound`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::client::ClientRow;
use crate::models::contract::ContractRow;
use crate::models::project::ProjectRow;
use crate::models::template::TemplateRow;

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_client(&self, id: Uuid) -> Result<ClientRow, AppError>;
    async fn get_project(&self, id: Uuid) -> Result<ProjectRow, AppError>;
    async fn get_template(&self, id: Uuid) -> Result<TemplateRow, AppError>;
    async fn get_contract(&self, id: Uuid) -> Result<ContractRow, AppError>;
    /// Inserts or replaces the contract with `contract.id`. `created_at` of an
    /// existing row is kept.
    async fn save_contract(&self, contract: &ContractRow) -> Result<(), AppError>;
    async fn delete_contract(&self, id: Uuid) -> Result<(), AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL backend
// ────────────────────────────────────────────────────────────────────────────

pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn get_client(&self, id: Uuid) -> Result<ClientRow, AppError> {
        sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {id} not found")))
    }

    async fn get_project(&self, id: Uuid) -> Result<ProjectRow, AppError> {
        sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))
    }

    async fn get_template(&self, id: Uuid) -> Result<TemplateRow, AppError> {
        sqlx::query_as::<_, TemplateRow>("SELECT * FROM contract_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))
    }

    async fn get_contract(&self, id: Uuid) -> Result<ContractRow, AppError> {
        sqlx::query_as::<_, ContractRow>("SELECT * FROM contracts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contract {id} not found")))
    }

    async fn save_contract(&self, contract: &ContractRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO contracts
                (id, template_id, client_id, project_id, title, body, status, file_path,
                 page_count, expires_at, overrides, signer_name, signer_email,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                template_id  = EXCLUDED.template_id,
                client_id    = EXCLUDED.client_id,
                project_id   = EXCLUDED.project_id,
                title        = EXCLUDED.title,
                body         = EXCLUDED.body,
                status       = EXCLUDED.status,
                file_path    = EXCLUDED.file_path,
                page_count   = EXCLUDED.page_count,
                expires_at   = EXCLUDED.expires_at,
                overrides    = EXCLUDED.overrides,
                signer_name  = EXCLUDED.signer_name,
                signer_email = EXCLUDED.signer_email,
                updated_at   = EXCLUDED.updated_at
            "#,
        )
        .bind(contract.id)
        .bind(contract.template_id)
        .bind(contract.client_id)
        .bind(contract.project_id)
        .bind(&contract.title)
        .bind(&contract.body)
        .bind(&contract.status)
        .bind(&contract.file_path)
        .bind(contract.page_count)
        .bind(contract.expires_at)
        .bind(&contract.overrides)
        .bind(&contract.signer_name)
        .bind(&contract.signer_email)
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_contract(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM contracts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Contract {id} not found")));
        }
        Ok(())
    }
}
