use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::sources::{
    CostRecord, RegistryEntry, SourceAdapter, SourceDescriptor, SourceError,
};

use super::fields;
use super::http::HttpFetcher;

pub const ID: &str = "openai";

/// Fixed default window start for the costs query: 2024-11-01 00:00 UTC.
/// Spend accumulates from here unless a `start_time` param overrides it.
const DEFAULT_START_TIME: &str = "1730419200";

pub(super) fn entry() -> RegistryEntry {
    RegistryEntry {
        defaults: SourceDescriptor::new(
            ID,
            "OpenAI",
            "https://api.openai.com/v1/organization/costs",
        )
        .with_env_var("OPENAI_ADMIN_KEY"),
        factory: Box::new(|descriptor| {
            Ok(Arc::new(OpenAiAdapter::new(descriptor.clone())) as Arc<dyn SourceAdapter>)
        }),
    }
}

/// OpenAI exposes organization spend, not a prepaid balance, so the
/// record carries a spend figure and the not-applicable sentinel for the
/// balance axis. Requires an admin key.
pub struct OpenAiAdapter {
    descriptor: SourceDescriptor,
    http: HttpFetcher,
}

impl OpenAiAdapter {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        OpenAiAdapter {
            descriptor,
            http: HttpFetcher::new(),
        }
    }

    fn parse_costs(&self, payload: Value) -> Result<CostRecord, SourceError> {
        let spent = fields::first_number(
            &payload,
            &[
                &["data", "0", "results", "0", "amount", "value"],
                &["data", "0", "amount", "value"],
            ],
        );
        let currency = fields::first_string(
            &payload,
            &[&["data", "0", "results", "0", "amount", "currency"]],
        )
        .map(str::to_uppercase)
        .unwrap_or_else(|| "USD".to_string());
        Ok(CostRecord {
            source_id: self.descriptor.display_name.clone(),
            amount: None,
            currency: currency.clone(),
            spent,
            spent_currency: spent.map(|_| currency),
            raw: payload,
        })
    }
}

#[async_trait]
impl SourceAdapter for OpenAiAdapter {
    fn source_id(&self) -> &str {
        &self.descriptor.display_name
    }

    async fn fetch_balance(&self) -> Result<CostRecord, SourceError> {
        let api_key = self.descriptor.credential()?;
        let start_time = self
            .descriptor
            .param("start_time")
            .unwrap_or(DEFAULT_START_TIME)
            .to_string();
        let payload = self
            .http
            .get_json(
                &self.descriptor.api_url,
                &[("Authorization", format!("Bearer {}", api_key))],
                &[("start_time", start_time), ("limit", "1".to_string())],
            )
            .await?;
        self.parse_costs(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_costs_buckets() {
        let adapter = OpenAiAdapter::new(entry().defaults);
        let payload = json!({
            "object": "page",
            "data": [
                {"results": [{"amount": {"value": 12.75, "currency": "usd"}}]}
            ]
        });
        let record = adapter.parse_costs(payload).unwrap();
        assert_eq!(record.amount, None);
        assert_eq!(record.spent, Some(12.75));
        assert_eq!(record.currency, "USD");
        assert_eq!(record.spent_currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_default_window_start_is_november_2024() {
        let seconds: i64 = DEFAULT_START_TIME.parse().unwrap();
        let start = chrono::DateTime::from_timestamp(seconds, 0).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-11-01T00:00:00+00:00");
    }

    #[test]
    fn test_empty_costs_are_sentinels() {
        let adapter = OpenAiAdapter::new(entry().defaults);
        let record = adapter.parse_costs(json!({"data": []})).unwrap();
        assert_eq!(record.amount, None);
        assert_eq!(record.spent, None);
        assert_eq!(record.currency, "USD");
    }
}
