use async_trait::async_trait;

use super::sources_errors::SourceError;
use super::sources_model::{CostRecord, PlanReport, QuotaReport, ResourceKind};

/// Fetch contract implemented by every source adapter.
///
/// An adapter serves exactly one source, owns no cross-source state and may
/// hold auth material resolved at construction or first use. Operations a
/// source does not offer keep the default `Unsupported` implementation; the
/// batch executor drops those silently, single-target calls surface them.
impl std::fmt::Debug for dyn SourceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceAdapter")
            .field("source_id", &self.source_id())
            .finish()
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Display name used in records and diagnostics.
    fn source_id(&self) -> &str;

    async fn fetch_balance(&self) -> Result<CostRecord, SourceError> {
        Err(SourceError::Unsupported(
            self.source_id().to_string(),
            ResourceKind::Balance,
        ))
    }

    async fn fetch_quota(&self) -> Result<QuotaReport, SourceError> {
        Err(SourceError::Unsupported(
            self.source_id().to_string(),
            ResourceKind::Quota,
        ))
    }

    async fn fetch_plan_usage(&self) -> Result<PlanReport, SourceError> {
        Err(SourceError::Unsupported(
            self.source_id().to_string(),
            ResourceKind::PlanUsage,
        ))
    }
}
