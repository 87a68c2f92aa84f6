use crate::fx::CurrencyNormalizer;
use crate::sources::{CostRecord, PlanReport, QuotaReport};

/// Ordering policies over a collected result set. Sorting is pure: it
/// never triggers further I/O and tolerates records with missing amounts.
#[derive(Debug, Clone, PartialEq)]
pub enum SortMode {
    /// Case-insensitive lexicographic on source id. Deterministic
    /// regardless of fan-out completion order; the default.
    ByName,
    /// Descending by amount converted into the target currency.
    ByValue { target: String },
    /// Keep completion order as-is, for latency-sensitive callers.
    Unordered,
}

impl Default for SortMode {
    fn default() -> Self {
        SortMode::ByName
    }
}

/// Anything the sorter can rank: a source id, and optionally an amount
/// with its native currency.
pub trait Ranked {
    fn source_id(&self) -> &str;

    /// Amount and currency used for value ranking; `None` ranks as zero.
    fn ranking_value(&self) -> Option<(f64, &str)> {
        None
    }
}

impl Ranked for CostRecord {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn ranking_value(&self) -> Option<(f64, &str)> {
        self.amount.map(|amount| (amount, self.currency.as_str()))
    }
}

impl Ranked for QuotaReport {
    fn source_id(&self) -> &str {
        &self.source_id
    }
}

impl Ranked for PlanReport {
    fn source_id(&self) -> &str {
        &self.source_id
    }
}

/// Order `records` in place according to `mode`.
pub fn sort_records<R: Ranked>(records: &mut [R], mode: &SortMode, fx: &CurrencyNormalizer) {
    match mode {
        SortMode::Unordered => {}
        SortMode::ByName => {
            records.sort_by(|a, b| {
                a.source_id()
                    .to_lowercase()
                    .cmp(&b.source_id().to_lowercase())
            });
        }
        SortMode::ByValue { target } => {
            records.sort_by(|a, b| {
                let value_a = converted_value(a, target, fx);
                let value_b = converted_value(b, target, fx);
                value_b.total_cmp(&value_a)
            });
        }
    }
}

fn converted_value<R: Ranked>(record: &R, target: &str, fx: &CurrencyNormalizer) -> f64 {
    match record.ranking_value() {
        Some((amount, currency)) if amount.is_finite() => fx.convert(amount, currency, target),
        _ => 0.0,
    }
}
