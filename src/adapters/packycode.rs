use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::sources::{
    CostRecord, PlanReport, PlanWindow, QuotaEntry, QuotaReport, RegistryEntry, SourceAdapter,
    SourceDescriptor, SourceError,
};

use super::fields;
use super::http::HttpFetcher;

pub const ID: &str = "packycode";

/// Quota units per USD on PackyCode relays.
const QUOTA_SCALE: f64 = 500_000.0;

/// Budget endpoint backing the coding-plan view.
const PLAN_URL: &str = "https://www.packycode.com/api/backend/users/info";

pub(super) fn entry() -> RegistryEntry {
    let mut defaults =
        SourceDescriptor::new(ID, "PackyCode", "https://packyapi.com/api/user/self")
            .with_env_var("PACKYCODE_API_USER_ID");
    defaults.enabled = false;
    defaults.show_quota = true;
    defaults.show_plan = true;
    RegistryEntry {
        defaults,
        factory: Box::new(|descriptor| {
            Ok(Arc::new(PackyCodeAdapter::new(descriptor.clone())) as Arc<dyn SourceAdapter>)
        }),
    }
}

/// PackyCode relay: one `user/self` call feeds both the balance and the
/// quota axes. Authenticated by the account's user id header.
pub struct PackyCodeAdapter {
    descriptor: SourceDescriptor,
    http: HttpFetcher,
}

impl PackyCodeAdapter {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        PackyCodeAdapter {
            descriptor,
            http: HttpFetcher::new(),
        }
    }

    async fn fetch_self(&self) -> Result<Value, SourceError> {
        let user_id = self.descriptor.credential()?;
        self.http
            .get_json(
                &self.descriptor.api_url,
                &[("new-api-user", user_id)],
                &[],
            )
            .await
    }

    fn quota_numbers(payload: &Value) -> (f64, f64, f64) {
        let total = fields::first_number(payload, &[&["data", "quota"]]).unwrap_or(0.0);
        let used = fields::first_number(payload, &[&["data", "used_quota"]]).unwrap_or(0.0);
        let remaining = (total - used).max(0.0);
        (total, used, remaining)
    }

    fn parse_balance(&self, payload: Value) -> Result<CostRecord, SourceError> {
        let (_, used, remaining) = Self::quota_numbers(&payload);
        let spent = (used > 0.0).then_some(used / QUOTA_SCALE);
        Ok(CostRecord {
            source_id: self.descriptor.display_name.clone(),
            amount: Some(remaining / QUOTA_SCALE),
            currency: "USD".to_string(),
            spent,
            spent_currency: spent.map(|_| "USD".to_string()),
            raw: payload,
        })
    }

    fn parse_plan(&self, payload: Value) -> Result<PlanReport, SourceError> {
        let mut windows = Vec::new();
        for (level, budget_key, spent_key) in [
            ("daily", "daily_budget_usd", "daily_spent_usd"),
            ("monthly", "monthly_budget_usd", "monthly_spent_usd"),
        ] {
            let budget = fields::first_number(&payload, &[&[budget_key], &["data", budget_key]]);
            let spent = fields::first_number(&payload, &[&[spent_key], &["data", spent_key]]);
            if let (Some(budget), Some(spent)) = (budget, spent) {
                if budget > 0.0 {
                    windows.push(PlanWindow {
                        level: level.to_string(),
                        percent: (spent / budget * 100.0).clamp(0.0, 100.0),
                        reset_time: None,
                    });
                }
            }
        }
        if windows.is_empty() {
            return Err(SourceError::Parse(
                "user info response carried no budget windows".to_string(),
            ));
        }
        let status = fields::first_string(&payload, &[&["plan_type"], &["data", "plan_type"]])
            .unwrap_or("active")
            .to_string();
        Ok(PlanReport {
            source_id: self.descriptor.display_name.clone(),
            status,
            windows,
            update_time: None,
            raw: payload,
        })
    }

    fn parse_quota(&self, payload: Value) -> Result<QuotaReport, SourceError> {
        let (total, used, remaining) = Self::quota_numbers(&payload);
        let entry = QuotaEntry {
            label: "claude,codex pay-as-you-go".to_string(),
            used: Some(used),
            total: Some(total),
            remaining: Some(remaining),
            status: "active".to_string(),
            expiry: None,
            reset_info: None,
        };
        Ok(QuotaReport {
            source_id: self.descriptor.display_name.clone(),
            entries: vec![entry],
            raw: payload,
        })
    }
}

#[async_trait]
impl SourceAdapter for PackyCodeAdapter {
    fn source_id(&self) -> &str {
        &self.descriptor.display_name
    }

    async fn fetch_balance(&self) -> Result<CostRecord, SourceError> {
        let payload = self.fetch_self().await?;
        self.parse_balance(payload)
    }

    async fn fetch_quota(&self) -> Result<QuotaReport, SourceError> {
        let payload = self.fetch_self().await?;
        self.parse_quota(payload)
    }

    async fn fetch_plan_usage(&self) -> Result<PlanReport, SourceError> {
        let user_id = self.descriptor.credential()?;
        let plan_url = self.descriptor.param("plan_url").unwrap_or(PLAN_URL);
        let payload = self
            .http
            .get_json(plan_url, &[("new-api-user", user_id)], &[])
            .await?;
        self.parse_plan(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> PackyCodeAdapter {
        PackyCodeAdapter::new(entry().defaults)
    }

    #[test]
    fn test_balance_rescales_quota_units_to_usd() {
        let payload = json!({"data": {"quota": 5_000_000, "used_quota": 1_000_000}});
        let record = adapter().parse_balance(payload).unwrap();
        assert_eq!(record.amount, Some(8.0));
        assert_eq!(record.spent, Some(2.0));
        assert_eq!(record.currency, "USD");
    }

    #[test]
    fn test_quota_report_keeps_raw_units() {
        let payload = json!({"data": {"quota": 5_000_000, "used_quota": 1_000_000}});
        let report = adapter().parse_quota(payload).unwrap();
        assert_eq!(report.entries.len(), 1);
        let entry = &report.entries[0];
        assert_eq!(entry.total, Some(5_000_000.0));
        assert_eq!(entry.used, Some(1_000_000.0));
        assert_eq!(entry.remaining, Some(4_000_000.0));
        assert_eq!(entry.status, "active");
    }

    #[test]
    fn test_plan_windows_from_budget_fields() {
        let payload = json!({
            "plan_type": "pro",
            "daily_budget_usd": 25.0,
            "daily_spent_usd": 5.0,
            "monthly_budget_usd": 500.0,
            "monthly_spent_usd": 125.0
        });
        let report = adapter().parse_plan(payload).unwrap();
        assert_eq!(report.status, "pro");
        assert_eq!(report.windows.len(), 2);
        assert_eq!(report.windows[0].level, "daily");
        assert!((report.windows[0].percent - 20.0).abs() < 1e-9);
        assert!((report.windows[1].percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_plan_without_budgets_is_a_parse_error() {
        let err = adapter().parse_plan(json!({"data": {}})).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn test_overdrawn_quota_clamps_remaining_to_zero() {
        let payload = json!({"data": {"quota": 100, "used_quota": 250}});
        let report = adapter().parse_quota(payload).unwrap();
        assert_eq!(report.entries[0].remaining, Some(0.0));
    }
}
