use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::sources::{
    CostRecord, RegistryEntry, SourceAdapter, SourceDescriptor, SourceError,
};

use super::fields;
use super::http::HttpFetcher;

pub const ID: &str = "oneapi";

pub(super) fn entry() -> RegistryEntry {
    let mut defaults =
        SourceDescriptor::new(ID, "One-API", "http://localhost:3000/api/user/self")
            .with_env_var("ONEAPI_API_KEY");
    // Self-hosted; off until the user points it at their deployment
    defaults.enabled = false;
    RegistryEntry {
        defaults,
        factory: Box::new(|descriptor| {
            Ok(Arc::new(OneApiAdapter::new(descriptor.clone())) as Arc<dyn SourceAdapter>)
        }),
    }
}

/// Generic adapter for One-API-compatible self-hosted relays. Deployments
/// differ in which field carries the balance, so extraction runs down a
/// prioritized candidate list, at the top level and under `user`.
pub struct OneApiAdapter {
    descriptor: SourceDescriptor,
    http: HttpFetcher,
}

const BALANCE_CANDIDATES: &[&[&str]] = &[
    &["data", "balance"],
    &["data", "quota"],
    &["data", "remaining_quota"],
    &["data", "credit"],
    &["data", "amount"],
    &["data", "user", "balance"],
    &["data", "user", "quota"],
];

const CURRENCY_CANDIDATES: &[&[&str]] = &[
    &["data", "currency"],
    &["data", "unit"],
    &["data", "currency_code"],
    &["data", "user", "currency"],
];

impl OneApiAdapter {
    pub fn new(mut descriptor: SourceDescriptor) -> Self {
        if let Some(base_url) = descriptor.param_or_env("base_url", "ONEAPI_BASE_URL") {
            descriptor.api_url = format!("{}/api/user/self", base_url.trim_end_matches('/'));
        }
        OneApiAdapter {
            descriptor,
            http: HttpFetcher::new(),
        }
    }

    fn parse_balance(&self, payload: Value) -> Result<CostRecord, SourceError> {
        let amount = fields::first_number(&payload, BALANCE_CANDIDATES);
        let currency = fields::first_string(&payload, CURRENCY_CANDIDATES)
            .map(str::to_uppercase)
            .unwrap_or_else(|| "USD".to_string());
        let spent = fields::first_number(
            &payload,
            &[&["data", "used_quota"], &["data", "user", "used_quota"]],
        );
        Ok(CostRecord {
            source_id: self.descriptor.display_name.clone(),
            amount,
            currency: currency.clone(),
            spent,
            spent_currency: spent.map(|_| currency),
            raw: payload,
        })
    }
}

#[async_trait]
impl SourceAdapter for OneApiAdapter {
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
