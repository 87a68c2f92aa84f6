use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::sources::{
    CostRecord, RegistryEntry, SourceAdapter, SourceDescriptor, SourceError,
};

use super::fields;
use super::http::HttpFetcher;

pub const ID: &str = "moonshot";

/// Organization console amounts come back in a fixed-point unit of
/// 1/100000 yuan.
const ORG_UNIT_SCALE: f64 = 100_000.0;

pub(super) fn entry() -> RegistryEntry {
    RegistryEntry {
        defaults: SourceDescriptor::new(
            ID,
            "Moonshot",
            "https://api.moonshot.cn/v1/users/me/balance",
        )
        .with_env_var("MOONSHOT_API_KEY"),
        factory: Box::new(|descriptor| {
            Ok(Arc::new(MoonshotAdapter::new(descriptor.clone())) as Arc<dyn SourceAdapter>)
        }),
    }
}

/// Moonshot has two auth paths: the plain API key, and the organization
/// console (token + org id) which additionally exposes spend. The console
/// path is preferred when configured and falls back to the key on failure.
pub struct MoonshotAdapter {
    descriptor: SourceDescriptor,
    http: HttpFetcher,
}

impl MoonshotAdapter {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        MoonshotAdapter {
            descriptor,
            http: HttpFetcher::new(),
        }
    }

    fn console_auth(&self) -> Option<(String, String)> {
        let token = self
            .descriptor
            .param_or_env("console_token", "MOONSHOT_CONSOLE_TOKEN")?;
        let org_id = self.descriptor.param_or_env("org_id", "MOONSHOT_ORG_ID")?;
        Some((token, org_id))
    }

    async fn fetch_with_api_key(&self) -> Result<CostRecord, SourceError> {
        let api_key = self.descriptor.credential()?;
        let payload = self
            .http
            .get_json(
                &self.descriptor.api_url,
                &[("Authorization", format!("Bearer {}", api_key))],
                &[],
            )
            .await?;
        self.parse_key_balance(payload)
    }

    async fn fetch_with_console(&self, token: &str, org_id: &str) -> Result<CostRecord, SourceError> {
        let url = format!(
            "https://platform.moonshot.cn/api?endpoint=organizationAccountInfo&oid={}",
            org_id
        );
        let payload = self
            .http
            .get_json(
                &url,
                &[
                    ("Authorization", format!("Bearer {}", token)),
                    (
                        "Referer",
                        "https://platform.moonshot.cn/console/account".to_string(),
                    ),
                ],
                &[],
            )
            .await?;
        self.parse_console_balance(payload)
    }

    fn parse_key_balance(&self, payload: Value) -> Result<CostRecord, SourceError> {
        // cash_balance is the real money; available_balance folds in
        // vouchers. Prefer cash when it is positive.
        let cash = fields::first_number(&payload, &[&["data", "cash_balance"]]).unwrap_or(0.0);
        let available =
            fields::first_number(&payload, &[&["data", "available_balance"]]).unwrap_or(0.0);
        let amount = if cash > 0.0 { cash } else { available };
        Ok(CostRecord {
            source_id: self.descriptor.display_name.clone(),
            amount: Some(amount),
            currency: "CNY".to_string(),
            spent: None,
            spent_currency: None,
            raw: payload,
        })
    }

    fn parse_console_balance(&self, payload: Value) -> Result<CostRecord, SourceError> {
        let balance = fields::first_number(&payload, &[&["data", "cur"]])
            .map(|raw| raw / ORG_UNIT_SCALE)
            .ok_or_else(|| {
                SourceError::Parse("organization account response carried no balance".to_string())
            })?;
        let spent = fields::first_number(&payload, &[&["data", "use"]])
            .map(|raw| raw / ORG_UNIT_SCALE)
            .filter(|spent| *spent > 0.0);
        Ok(CostRecord {
            source_id: self.descriptor.display_name.clone(),
            amount: Some(balance),
            currency: "CNY".to_string(),
            spent,
            spent_currency: spent.map(|_| "CNY".to_string()),
            raw: payload,
        })
    }
}

#[async_trait]
impl SourceAdapter for MoonshotAdapter {
    fn source_id(&self) -> &str {
        &self.descriptor.display_name
    }

    async fn fetch_balance(&self) -> Result<CostRecord, SourceError> {
        if let Some((token, org_id)) = self.console_auth() {
            match self.fetch_with_console(&token, &org_id).await {
                Ok(record) => return Ok(record),
                Err(err) => {
                    debug!("Moonshot console path failed ({}), trying API key", err);
                }
            }
        }
        self.fetch_with_api_key().await
    }
}
