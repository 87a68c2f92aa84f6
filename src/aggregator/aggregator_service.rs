use std::sync::Arc;

use crate::fx::{CurrencyNormalizer, RateTable};
use crate::sources::{
    CostRecord, PlanReport, QuotaReport, ResourceKind, SourceDescriptor, SourceError,
    SourceRegistry,
};

use super::fan_out::{DiagnosticSink, FanOutExecutor};
use super::sorter::{sort_records, SortMode};

/// High-level entry point tying the fan-out executor, the currency
/// normalizer and the sorter together. Registry and rate table are
/// injected at construction, so tests can run against fakes.
pub struct AggregationService {
    executor: FanOutExecutor,
    normalizer: CurrencyNormalizer,
}

impl AggregationService {
    pub fn new(registry: Arc<SourceRegistry>, rates: RateTable) -> Self {
        AggregationService {
            executor: FanOutExecutor::new(registry),
            normalizer: CurrencyNormalizer::new(rates),
        }
    }

    pub fn with_pool_width(mut self, width: usize) -> Self {
        self.executor = self.executor.with_pool_width(width);
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.executor = self.executor.with_diagnostics(sink);
        self
    }

    /// Balance check across all eligible descriptors, ordered per `sort`.
    pub async fn check_all_balances(
        &self,
        descriptors: &[SourceDescriptor],
        sort: &SortMode,
    ) -> Result<Vec<CostRecord>, SourceError> {
        let mut records = self
            .executor
            .run_batch(descriptors, ResourceKind::Balance, |adapter| async move {
                adapter.fetch_balance().await
            })
            .await?;
        sort_records(&mut records, sort, &self.normalizer);
        Ok(records)
    }

    pub async fn check_balance(
        &self,
        descriptor: &SourceDescriptor,
    ) -> Result<CostRecord, SourceError> {
        self.executor
            .run_single(descriptor, |adapter| async move {
                adapter.fetch_balance().await
            })
            .await
    }

    pub async fn check_all_quotas(
        &self,
        descriptors: &[SourceDescriptor],
        sort: &SortMode,
    ) -> Result<Vec<QuotaReport>, SourceError> {
        let mut reports = self
            .executor
            .run_batch(descriptors, ResourceKind::Quota, |adapter| async move {
                adapter.fetch_quota().await
            })
            .await?;
        sort_records(&mut reports, sort, &self.normalizer);
        Ok(reports)
    }

    pub async fn check_quota(
        &self,
        descriptor: &SourceDescriptor,
    ) -> Result<QuotaReport, SourceError> {
        self.executor
            .run_single(descriptor, |adapter| async move {
                adapter.fetch_quota().await
            })
            .await
    }

    pub async fn check_all_plans(
        &self,
        descriptors: &[SourceDescriptor],
        sort: &SortMode,
    ) -> Result<Vec<PlanReport>, SourceError> {
        let mut reports = self
            .executor
            .run_batch(descriptors, ResourceKind::PlanUsage, |adapter| async move {
                adapter.fetch_plan_usage().await
            })
            .await?;
        sort_records(&mut reports, sort, &self.normalizer);
        Ok(reports)
    }

    pub async fn check_plan(
        &self,
        descriptor: &SourceDescriptor,
    ) -> Result<PlanReport, SourceError> {
        self.executor
            .run_single(descriptor, |adapter| async move {
                adapter.fetch_plan_usage().await
            })
            .await
    }

    pub fn normalizer(&self) -> &CurrencyNormalizer {
        &self.normalizer
    }

    /// Combined (balance, spent) totals converted into `target`. Derived
    /// only; the per-record native values stay untouched.
    pub fn combined_total(&self, records: &[CostRecord], target: &str) -> (f64, f64) {
        let mut total = 0.0;
        let mut total_spent = 0.0;
        for record in records {
            if let Some(amount) = record.amount {
                if amount.is_finite() && amount > 0.0 {
                    total += self.normalizer.convert(amount, &record.currency, target);
                }
            }
            if let Some(spent) = record.spent {
                let spent_currency = record
                    .spent_currency
                    .as_deref()
                    .unwrap_or(record.currency.as_str());
                if spent.is_finite() && spent > 0.0 {
                    total_spent += self.normalizer.convert(spent, spent_currency, target);
                }
            }
        }
        (total, total_spent)
    }
}
