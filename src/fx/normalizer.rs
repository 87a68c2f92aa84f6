use super::rate_table::RateTable;

/// Converts amounts between currencies for ranking and totals.
///
/// Conversion is only ever applied to derived values; a record's stored
/// amount and currency are never rewritten.
pub struct CurrencyNormalizer {
    table: RateTable,
}

impl CurrencyNormalizer {
    pub fn new(table: RateTable) -> Self {
        CurrencyNormalizer { table }
    }

    /// `amount * rate[from] / rate[to]`, identity when the codes match.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        if from == to {
            return amount;
        }
        let from_rate = self.table.rate(from);
        let to_rate = self.table.rate(to);
        amount * (from_rate / to_rate)
    }

    pub fn rate_table(&self) -> &RateTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn normalizer() -> CurrencyNormalizer {
        CurrencyNormalizer::new(RateTable::with_defaults())
    }

    #[test]
    fn test_identity_conversion() {
        let fx = normalizer();
        assert_eq!(fx.convert(123.45, "USD", "USD"), 123.45);
        assert_eq!(fx.convert(0.0, "XYZ", "XYZ"), 0.0);
    }

    #[test]
    fn test_usd_to_cny() {
        let fx = normalizer();
        let converted = fx.convert(10.0, "USD", "CNY");
        assert!((converted - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let fx = normalizer();
        for (from, to) in [("USD", "EUR"), ("GBP", "JPY"), ("KRW", "Points")] {
            let amount = 250.75;
            let round_tripped = fx.convert(fx.convert(amount, from, to), to, from);
            assert!(
                (round_tripped - amount).abs() < 1e-9,
                "{from}->{to} round trip drifted: {round_tripped}"
            );
        }
    }

    #[test]
    fn test_unknown_currency_treated_as_base() {
        let fx = normalizer();
        // rate 1.0 on both sides: the amount passes through unchanged
        assert_eq!(fx.convert(5.0, "DOGE", "CNY"), 5.0);
        let to_usd = fx.convert(7.2, "DOGE", "USD");
        assert!((to_usd - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_merged_override_feeds_conversion() {
        let mut table = RateTable::with_defaults();
        let mut overrides = HashMap::new();
        overrides.insert("USD".to_string(), 8.0);
        table.merge(&overrides);
        let fx = CurrencyNormalizer::new(table);
        assert!((fx.convert(2.0, "USD", "CNY") - 16.0).abs() < 1e-9);
    }
}
