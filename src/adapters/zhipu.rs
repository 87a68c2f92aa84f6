use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::sources::{
    CostRecord, RegistryEntry, SourceAdapter, SourceDescriptor, SourceError,
};

use super::fields;
use super::http::HttpFetcher;

pub const ID: &str = "zhipu";

pub(super) fn entry() -> RegistryEntry {
    RegistryEntry {
        defaults: SourceDescriptor::new(
            ID,
            "Zhipu AI",
            "https://bigmodel.cn/api/biz/customer/accountSet",
        )
        .with_env_var("ZHIPU_CONSOLE_TOKEN"),
        factory: Box::new(|descriptor| {
            Ok(Arc::new(ZhipuAdapter::new(descriptor.clone())) as Arc<dyn SourceAdapter>)
        }),
    }
}

/// Zhipu's console has no key-based balance API; it wants the console
/// session token passed verbatim in the `authorization` header.
pub struct ZhipuAdapter {
    descriptor: SourceDescriptor,
    http: HttpFetcher,
}

impl ZhipuAdapter {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        ZhipuAdapter {
            descriptor,
            http: HttpFetcher::new(),
        }
    }

    fn parse_balance(&self, payload: Value) -> Result<CostRecord, SourceError> {
        let amount =
            fields::first_number(&payload, &[&["data", "basicCustomerInfo", "balance"]]);
        let currency = fields::first_string(&payload, &[&["data", "currency"]])
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
impl SourceAdapter for ZhipuAdapter {
    fn source_id(&self) -> &str {
        &self.descriptor.display_name
    }

    async fn fetch_balance(&self) -> Result<CostRecord, SourceError> {
        let token = self.descriptor.credential()?;
        let payload = self
            .http
            .get_json(&self.descriptor.api_url, &[("authorization", token)], &[])
            .await?;
        self.parse_balance(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_console_account_set() {
        let adapter = ZhipuAdapter::new(entry().defaults);
        let payload = json!({
            "code": 200,
            "msg": "ok",
            "success": true,
            "data": {"basicCustomerInfo": {"balance": 100.5}}
        });
        let record = adapter.parse_balance(payload).unwrap();
        assert_eq!(record.source_id, "Zhipu AI");
        assert_eq!(record.amount, Some(100.5));
        assert_eq!(record.currency, "CNY");
    }
}
