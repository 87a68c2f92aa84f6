use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::constants::HTTP_TIMEOUT_SECS;
use crate::sources::SourceError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Shared HTTP plumbing for source adapters: JSON requests with a fixed
/// per-call timeout, status mapping and response-body auth sniffing.
pub struct HttpFetcher {
    client: Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        HttpFetcher::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        HttpFetcher {
            client: Client::new(),
        }
    }

    pub async fn get_json(
        &self,
        url: &str,
        headers: &[(&str, String)],
        query: &[(&str, String)],
    ) -> Result<Value, SourceError> {
        let mut request = self
            .client
            .get(url)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json");
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        self.finish(request).await
    }

    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &Value,
    ) -> Result<Value, SourceError> {
        let mut request = self
            .client
            .post(url)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .json(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        self.finish(request).await
    }

    async fn finish(&self, request: reqwest::RequestBuilder) -> Result<Value, SourceError> {
        let response = request.send().await?;
        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SourceError::Auth(format!(
                "HTTP {}: check your API key or login state",
                status.as_u16()
            )));
        }
        if status.as_u16() == 429 {
            return Err(SourceError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status));
        }
        let payload: Value = response.json().await?;
        sniff_rejection(&payload)?;
        Ok(payload)
    }
}

/// Some consoles answer 200 with an auth failure in the body. Recognize
/// the common shapes and surface them as auth errors instead of letting
/// field extraction come up empty.
pub fn sniff_rejection(payload: &Value) -> Result<(), SourceError> {
    const PATTERNS: &[(&str, &[&str])] = &[
        (
            "code",
            &[
                "consoleneedlogin",
                "unauthorized",
                "authenticationfailed",
                "invalidtoken",
                "invalidcsrftoken",
            ],
        ),
        (
            "message",
            &[
                "needlogin",
                "unauthorized",
                "authentication failed",
                "invalid token",
                "login required",
            ],
        ),
        (
            "error",
            &["unauthorized", "authenticationerror", "invalidtoken"],
        ),
    ];

    let Some(map) = payload.as_object() else {
        return Ok(());
    };

    for (field, patterns) in PATTERNS {
        if let Some(value) = map.get(*field).and_then(Value::as_str) {
            let lowered = value.to_lowercase();
            if patterns.iter().any(|pattern| lowered.contains(pattern)) {
                return Err(SourceError::Auth(format!(
                    "{}; log in again and retry",
                    value
                )));
            }
        }
    }

    if map.get("success").and_then(Value::as_bool) == Some(false) {
        let detail = map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("request rejected by the service");
        return Err(SourceError::Parse(detail.to_string()));
    }

    Ok(())
}
