use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::sources::{
    CostRecord, RegistryEntry, SourceAdapter, SourceDescriptor, SourceError,
};

use super::fields;
use super::http::HttpFetcher;

pub const ID: &str = "siliconflow";

pub(super) fn entry() -> RegistryEntry {
    RegistryEntry {
        defaults: SourceDescriptor::new(
            ID,
            "SiliconFlow",
            "https://api.siliconflow.cn/v1/user/info",
        )
        .with_env_var("SILICONFLOW_API_KEY"),
        factory: Box::new(|descriptor| {
            Ok(Arc::new(SiliconFlowAdapter::new(descriptor.clone())) as Arc<dyn SourceAdapter>)
        }),
    }
}

pub struct SiliconFlowAdapter {
    descriptor: SourceDescriptor,
    http: HttpFetcher,
}

impl SiliconFlowAdapter {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        SiliconFlowAdapter {
            descriptor,
            http: HttpFetcher::new(),
        }
    }

    fn parse_balance(&self, payload: Value) -> Result<CostRecord, SourceError> {
        // totalBalance = charge balance + gift balance
        let amount = fields::first_number(
            &payload,
            &[&["data", "totalBalance"], &["data", "balance"]],
        );
        let spent = fields::first_number(&payload, &[&["data", "chargeBalance", "used"]]);
        Ok(CostRecord {
            source_id: self.descriptor.display_name.clone(),
            amount,
            currency: "CNY".to_string(),
            spent,
            spent_currency: spent.map(|_| "CNY".to_string()),
            raw: payload,
        })
    }
}

#[async_trait]
impl SourceAdapter for SiliconFlowAdapter {
    fn source_id(&self) -> &str {
        &self.descriptor.display_name
    }

    async fn fetch_balance(&self) -> Result<CostRecord, SourceError> {
        let api_key = self.descriptor.credential()?;
        let payload = self
            .http
            .get_json(
                &self.descriptor.api_url,
                &[("Authorization", format!("Bearer {}", api_key))],
                &[],
            )
            .await?;
        self.parse_balance(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_total_balance() {
        let adapter = SiliconFlowAdapter::new(entry().defaults);
        let payload = json!({
            "code": 20000,
            "status": true,
            "data": {"name": "user", "balance": "98.00", "totalBalance": "118.42"}
        });
        let record = adapter.parse_balance(payload).unwrap();
        assert_eq!(record.amount, Some(118.42));
        assert_eq!(record.currency, "CNY");
    }

    #[test]
    fn test_falls_back_to_plain_balance() {
        let adapter = SiliconFlowAdapter::new(entry().defaults);
        let record = adapter
            .parse_balance(json!({"data": {"balance": 5}}))
            .unwrap();
        assert_eq!(record.amount, Some(5.0));
    }
}
