use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::sources::{
    CostRecord, RegistryEntry, SourceAdapter, SourceDescriptor, SourceError,
};

use super::fields;
use super::http::HttpFetcher;

pub const ID: &str = "deepseek";

pub(super) fn entry() -> RegistryEntry {
    RegistryEntry {
        defaults: SourceDescriptor::new(ID, "DeepSeek", "https://api.deepseek.com/v1/user/balance")
            .with_env_var("DEEPSEEK_API_KEY"),
        factory: Box::new(|descriptor| {
            Ok(Arc::new(DeepSeekAdapter::new(descriptor.clone())) as Arc<dyn SourceAdapter>)
        }),
    }
}

pub struct DeepSeekAdapter {
    descriptor: SourceDescriptor,
    http: HttpFetcher,
}

impl DeepSeekAdapter {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        DeepSeekAdapter {
            descriptor,
            http: HttpFetcher::new(),
        }
    }

    fn parse_balance(&self, payload: Value) -> Result<CostRecord, SourceError> {
        let amount = fields::first_number(&payload, &[&["balance_infos", "0", "total_balance"]]);
        let currency = fields::first_string(&payload, &[&["balance_infos", "0", "currency"]])
            .unwrap_or("CNY")
            .to_string();
        Ok(CostRecord {
            source_id: self.descriptor.display_name.clone(),
            amount,
            currency,
            spent: None,
            spent_currency: None,
            raw: payload,
        })
    }
}

#[async_trait]
impl SourceAdapter for DeepSeekAdapter {
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
