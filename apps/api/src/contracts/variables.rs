//! Variable Resolver: gathers company, client, project and date facts into one
//! flat `VariableSet` for template rendering.
//!
//! Formatting and fallback rules are applied here, once. Downstream code only
//! ever sees strings:
//! - dates → long form ("March 3, 2026")
//! - money → "$12,500.00"
//! - milestones → numbered lines, or "No milestones defined"
//! - missing project dates / budget → "TBD"; missing contact fields → "N/A"
//!
//! Caller overrides are merged last and win for any key, computed ones included.

use std::collections::BTreeMap;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::CompanyProfile;
use crate::contracts::store::EntityStore;
use crate::errors::AppError;
use crate::models::client::ClientRow;
use crate::models::project::{Milestone, ProjectRow};

/// Every key the resolver computes.
#[cfg(test)]
pub const KNOWN_KEYS: [&str; 19] = [
    "company_name",
    "company_email",
    "company_address",
    "company_phone",
    "company_website",
    "client_name",
    "client_email",
    "client_company",
    "client_phone",
    "client_address",
    "project_title",
    "project_description",
    "project_budget",
    "project_start_date",
    "project_due_date",
    "project_milestones",
    "contract_date",
    "contract_expiry",
    "effective_date",
];

const NOT_AVAILABLE: &str = "N/A";
const TO_BE_DETERMINED: &str = "TBD";
const NO_MILESTONES: &str = "No milestones defined";
const DEFAULT_EXPIRY_MONTHS: u32 = 3;

// ────────────────────────────────────────────────────────────────────────────
// VariableSet
// ────────────────────────────────────────────────────────────────────────────

/// Flat key → value mapping for one generation. Ordered so that serialised
/// output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableSet(BTreeMap<String, String>);

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Applies caller overrides; they replace existing values unconditionally.
    pub fn merge_overrides(&mut self, overrides: &BTreeMap<String, String>) {
        for (key, value) in overrides {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resolution
// ────────────────────────────────────────────────────────────────────────────

/// Inputs for resolving a generation's variables.
pub struct ResolveParams<'a> {
    pub client_id: Uuid,
    pub project_id: Uuid,
    pub overrides: &'a BTreeMap<String, String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Frozen "now" for contract/effective dates and the default expiry.
    pub now: DateTime<Utc>,
}

/// Loads the client and project and builds the variable set.
///
/// Fails with `AppError::NotFound` if either entity is missing.
pub async fn resolve_variables(
    store: &dyn EntityStore,
    company: &CompanyProfile,
    params: ResolveParams<'_>,
) -> Result<VariableSet, AppError> {
    let client = store.get_client(params.client_id).await?;
    let project = store.get_project(params.project_id).await?;

    let variables = build_variables(company, &client, &project, &params);
    info!(
        client_id = %client.id,
        project_id = %project.id,
        variables = variables.len(),
        overrides = params.overrides.len(),
        "Resolved contract variables"
    );

    Ok(variables)
}

/// Pure part of resolution: entities + clock → `VariableSet`.
pub fn build_variables(
    company: &CompanyProfile,
    client: &ClientRow,
    project: &ProjectRow,
    params: &ResolveParams<'_>,
) -> VariableSet {
    let mut vars = VariableSet::new();

    vars.insert("company_name", company.name.clone());
    vars.insert("company_email", or_na(Some(company.email.as_str())));
    vars.insert("company_address", or_na(Some(company.address.as_str())));
    vars.insert("company_phone", or_na(Some(company.phone.as_str())));
    vars.insert("company_website", or_na(Some(company.website.as_str())));

    vars.insert("client_name", client.name.clone());
    vars.insert("client_email", or_na(client.email.as_deref()));
    vars.insert("client_company", or_na(client.company.as_deref()));
    vars.insert("client_phone", or_na(client.phone.as_deref()));
    vars.insert("client_address", or_na(client.address.as_deref()));

    vars.insert("project_title", project.title.clone());
    vars.insert("project_description", or_na(project.description.as_deref()));
    vars.insert(
        "project_budget",
        project
            .budget
            .map(format_currency)
            .unwrap_or_else(|| TO_BE_DETERMINED.to_string()),
    );
    vars.insert("project_start_date", date_or_tbd(project.start_date));
    vars.insert("project_due_date", date_or_tbd(project.due_date));
    vars.insert("project_milestones", format_milestones(&project.milestones));

    let today = params.now.date_naive();
    let expiry = params
        .expires_at
        .map(|at| at.date_naive())
        .unwrap_or_else(|| default_expiry(today));
    vars.insert("contract_date", format_long_date(today));
    vars.insert("contract_expiry", format_long_date(expiry));
    vars.insert("effective_date", format_long_date(today));

    if !params.overrides.is_empty() {
        debug!(keys = ?params.overrides.keys().collect::<Vec<_>>(), "Applying variable overrides");
    }
    vars.merge_overrides(params.overrides);
    vars
}

// ────────────────────────────────────────────────────────────────────────────
// Formatting helpers
// ────────────────────────────────────────────────────────────────────────────

/// "March 3, 2026"
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Three calendar months after `today`, clamped to the end of a shorter month.
pub fn default_expiry(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(DEFAULT_EXPIRY_MONTHS))
        .unwrap_or(today)
}

/// "$12,500.00", rounded to cents, thousands separated.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, c) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Numbered plain-text list, one milestone per line.
pub fn format_milestones(milestones: &[Milestone]) -> String {
    if milestones.is_empty() {
        return NO_MILESTONES.to_string();
    }
    milestones
        .iter()
        .enumerate()
        .map(|(i, m)| match m.due_date {
            Some(due) => format!("{}. {} (due {})", i + 1, m.title, format_long_date(due)),
            None => format!("{}. {}", i + 1, m.title),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn date_or_tbd(date: Option<NaiveDate>) -> String {
    date.map(format_long_date)
        .unwrap_or_else(|| TO_BE_DETERMINED.to_string())
}

fn or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixed_now, sample_client, sample_company, sample_project, MemoryEntityStore};

    fn params(overrides: &BTreeMap<String, String>) -> ResolveParams<'_> {
        ResolveParams {
            client_id: Uuid::nil(),
            project_id: Uuid::nil(),
            overrides,
            expires_at: None,
            now: fixed_now(),
        }
    }

    fn build(overrides: &BTreeMap<String, String>) -> VariableSet {
        build_variables(&sample_company(), &sample_client(), &sample_project(), &params(overrides))
    }

    #[test]
    fn test_all_known_keys_are_resolved() {
        let vars = build(&BTreeMap::new());
        for key in KNOWN_KEYS {
            assert!(vars.get(key).is_some(), "missing {key}");
        }
        assert_eq!(vars.len(), KNOWN_KEYS.len());
    }

    #[test]
    fn test_dates_are_long_form() {
        let vars = build(&BTreeMap::new());
        assert_eq!(vars.get("contract_date"), Some("October 17, 2026"));
        assert_eq!(vars.get("effective_date"), Some("October 17, 2026"));
        assert_eq!(vars.get("project_start_date"), Some("November 2, 2026"));
    }

    #[test]
    fn test_default_expiry_is_three_months_out() {
        let vars = build(&BTreeMap::new());
        assert_eq!(vars.get("contract_expiry"), Some("January 17, 2027"));
    }

    #[test]
    fn test_default_expiry_clamps_month_end() {
        let date = NaiveDate::from_ymd_opt(2026, 11, 30).expect("date");
        assert_eq!(
            default_expiry(date),
            NaiveDate::from_ymd_opt(2027, 2, 28).expect("date")
        );
    }

    #[test]
    fn test_explicit_expiry_wins_over_default() {
        let overrides = BTreeMap::new();
        let mut p = params(&overrides);
        p.expires_at = Some(
            "2027-06-30T12:00:00Z"
                .parse::<DateTime<Utc>>()
                .expect("timestamp"),
        );
        let vars = build_variables(&sample_company(), &sample_client(), &sample_project(), &p);
        assert_eq!(vars.get("contract_expiry"), Some("June 30, 2027"));
    }

    #[test]
    fn test_missing_due_date_is_tbd() {
        let mut project = sample_project();
        project.due_date = None;
        project.budget = None;
        let overrides = BTreeMap::new();
        let vars = build_variables(&sample_company(), &sample_client(), &project, &params(&overrides));
        assert_eq!(vars.get("project_due_date"), Some("TBD"));
        assert_eq!(vars.get("project_budget"), Some("TBD"));
    }

    #[test]
    fn test_missing_contact_fields_are_na() {
        let mut client = sample_client();
        client.phone = None;
        client.address = Some("   ".to_string());
        client.company = None;
        let overrides = BTreeMap::new();
        let vars = build_variables(&sample_company(), &client, &sample_project(), &params(&overrides));
        assert_eq!(vars.get("client_phone"), Some("N/A"));
        assert_eq!(vars.get("client_address"), Some("N/A"));
        assert_eq!(vars.get("client_company"), Some("N/A"));
        assert_eq!(vars.get("client_email"), Some("ops@acme.test"));
    }

    #[test]
    fn test_overrides_win_over_computed_values() {
        let overrides = BTreeMap::from([
            ("contract_date".to_string(), "2099-01-01".to_string()),
            ("governing_law".to_string(), "New South Wales".to_string()),
        ]);
        let vars = build(&overrides);
        assert_eq!(vars.get("contract_date"), Some("2099-01-01"));
        assert_eq!(vars.get("governing_law"), Some("New South Wales"));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(1000.0), "$1,000.00");
        assert_eq!(format_currency(12_500.0), "$12,500.00");
        assert_eq!(format_currency(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_currency(-42.0), "-$42.00");
    }

    #[test]
    fn test_format_milestones() {
        assert_eq!(format_milestones(&[]), "No milestones defined");
        let milestones = vec![
            Milestone {
                title: "Discovery".to_string(),
                due_date: NaiveDate::from_ymd_opt(2026, 12, 1),
                completed: false,
            },
            Milestone {
                title: "Launch".to_string(),
                due_date: None,
                completed: false,
            },
        ];
        assert_eq!(
            format_milestones(&milestones),
            "1. Discovery (due December 1, 2026)\n2. Launch"
        );
    }

    #[tokio::test]
    async fn test_resolve_reports_missing_client() {
        let store = MemoryEntityStore::default();
        let overrides = BTreeMap::new();
        let err = resolve_variables(&store, &sample_company(), params(&overrides))
            .await
            .expect_err("client is missing");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_reports_missing_project() {
        let store = MemoryEntityStore::default();
        let client = sample_client();
        store.put_client(client.clone()).await;
        let overrides = BTreeMap::new();
        let mut p = params(&overrides);
        p.client_id = client.id;
        p.project_id = Uuid::new_v4();
        let err = resolve_variables(&store, &sample_company(), p)
            .await
            .expect_err("project is missing");
        assert!(matches!(err, AppError::NotFound(msg) if msg.contains("Project")));
    }
}
