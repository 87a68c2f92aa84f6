use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sources_errors::SourceError;

/// The account axes a source can be queried on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Balance,
    Quota,
    PlanUsage,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Balance => write!(f, "Balance"),
            ResourceKind::Quota => write!(f, "Quota"),
            ResourceKind::PlanUsage => write!(f, "Coding plan"),
        }
    }
}

/// One configured source: identity, visibility flags and auth parameters.
///
/// Built by merging user configuration over the registry defaults for the
/// source id; immutable for the duration of one aggregation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub display_name: String,
    pub enabled: bool,
    pub show_balance: bool,
    pub show_quota: bool,
    pub show_plan: bool,
    pub api_url: String,
    /// Environment variable holding the primary credential, if any.
    pub env_var: Option<String>,
    /// Adapter-specific parameters (org ids, console tokens, base URLs).
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SourceDescriptor {
    pub fn new(id: &str, display_name: &str, api_url: &str) -> Self {
        SourceDescriptor {
            id: id.to_string(),
            display_name: display_name.to_string(),
            enabled: true,
            show_balance: true,
            show_quota: false,
            show_plan: false,
            api_url: api_url.to_string(),
            env_var: None,
            params: HashMap::new(),
        }
    }

    pub fn with_env_var(mut self, env_var: &str) -> Self {
        self.env_var = Some(env_var.to_string());
        self
    }

    pub fn participates_in(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Balance => self.show_balance,
            ResourceKind::Quota => self.show_quota,
            ResourceKind::PlanUsage => self.show_plan,
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Resolve a named parameter, letting the environment override the
    /// configured value.
    pub fn param_or_env(&self, key: &str, env_var: &str) -> Option<String> {
        std::env::var(env_var)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.param(key).map(str::to_string))
    }

    /// The primary credential from `env_var`, or a descriptive error naming
    /// the variable to set.
    pub fn credential(&self) -> Result<String, SourceError> {
        let env_var = self.env_var.as_deref().ok_or_else(|| {
            SourceError::MissingCredential(format!(
                "{} has no credential variable configured",
                self.display_name
            ))
        })?;
        match std::env::var(env_var) {
            Ok(value) if !value.is_empty() => Ok(value),
            _ => Err(SourceError::MissingCredential(format!(
                "{} API key required. Set the {} environment variable",
                self.display_name, env_var
            ))),
        }
    }
}

/// One source's balance snapshot, normalized into a common shape.
///
/// `None` amounts are the explicit "not applicable" sentinel; the stored
/// currency is always the source's native one.
#[derive(Debug, Clone, Serialize)]
pub struct CostRecord {
    pub source_id: String,
    pub amount: Option<f64>,
    pub currency: String,
    pub spent: Option<f64>,
    pub spent_currency: Option<String>,
    pub raw: Value,
}

/// One package/quota line inside a [`QuotaReport`].
#[derive(Debug, Clone, Serialize)]
pub struct QuotaEntry {
    pub label: String,
    pub used: Option<f64>,
    pub total: Option<f64>,
    pub remaining: Option<f64>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_info: Option<String>,
}

/// A source's token/package quota state.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaReport {
    pub source_id: String,
    pub entries: Vec<QuotaEntry>,
    pub raw: Value,
}

/// One usage window of a coding plan (session, daily, weekly, ...).
#[derive(Debug, Clone, Serialize)]
pub struct PlanWindow {
    pub level: String,
    pub percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<String>,
}

/// A source's coding-plan usage snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub source_id: String,
    pub status: String,
    pub windows: Vec<PlanWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    pub raw: Value,
}
