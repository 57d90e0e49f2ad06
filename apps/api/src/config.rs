use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Bucket that holds generated contract documents.
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Lifetime of download links handed out for stored contracts.
    pub signed_url_ttl_secs: u64,
    pub company: CompanyProfile,
}

/// The agency's own details, printed on cover pages and signature blocks and
/// exposed to templates as the `company_*` variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub website: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            signed_url_ttl_secs: std::env::var("SIGNED_URL_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse::<u64>()
                .context("SIGNED_URL_TTL_SECS must be a whole number of seconds")?,
            company: CompanyProfile {
                name: env_or("COMPANY_NAME", "Talent Placement Agency"),
                email: env_or("COMPANY_EMAIL", "contracts@agency.example"),
                address: env_or("COMPANY_ADDRESS", ""),
                phone: env_or("COMPANY_PHONE", ""),
                website: env_or("COMPANY_WEBSITE", ""),
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
