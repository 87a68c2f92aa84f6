use std::collections::HashMap;

use log::warn;

use crate::constants::RATES_ENV_VAR;

/// Currency code -> units of the base currency (CNY) per one unit.
///
/// Overrides always merge over the defaults, they never replace the table
/// wholesale. Unknown codes are quoted at 1.0, i.e. treated as already
/// being in the base currency; a rough approximation, but it keeps ranking
/// total and never fails a batch over an exotic unit.
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable::with_defaults()
    }
}

impl RateTable {
    pub fn with_defaults() -> Self {
        let mut rates = HashMap::new();
        rates.insert("CNY".to_string(), 1.0);
        rates.insert("USD".to_string(), 7.2);
        rates.insert("EUR".to_string(), 7.8);
        rates.insert("GBP".to_string(), 9.1);
        rates.insert("JPY".to_string(), 0.048);
        rates.insert("KRW".to_string(), 0.0054);
        // Platform-specific point units
        rates.insert("Points".to_string(), 0.01);
        RateTable { rates }
    }

    /// Defaults plus any overrides from the `LLM_BALANCE_RATES` environment
    /// variable (a JSON object of code -> rate).
    pub fn from_env() -> Self {
        let mut table = RateTable::with_defaults();
        if let Ok(raw) = std::env::var(RATES_ENV_VAR) {
            match serde_json::from_str::<HashMap<String, f64>>(&raw) {
                Ok(overrides) => table.merge(&overrides),
                Err(err) => warn!("Ignoring malformed {}: {}", RATES_ENV_VAR, err),
            }
        }
        table
    }

    /// Merge a partial mapping over the current table.
    pub fn merge(&mut self, overrides: &HashMap<String, f64>) {
        for (code, rate) in overrides {
            self.rates.insert(code.clone(), *rate);
        }
    }

    pub fn rate(&self, code: &str) -> f64 {
        self.rates.get(code).copied().unwrap_or(1.0)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    /// All known (code, rate) pairs, sorted by code.
    pub fn entries(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> = self
            .rates
            .iter()
            .map(|(code, rate)| (code.as_str(), *rate))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_the_base_currency() {
        let table = RateTable::with_defaults();
        assert_eq!(table.rate("CNY"), 1.0);
        assert_eq!(table.rate("USD"), 7.2);
    }

    #[test]
    fn test_unknown_code_quotes_at_one() {
        let table = RateTable::with_defaults();
        assert_eq!(table.rate("DOGE"), 1.0);
        assert!(!table.contains("DOGE"));
    }

    #[test]
    fn test_merge_overrides_without_dropping_defaults() {
        let mut table = RateTable::with_defaults();
        let mut overrides = HashMap::new();
        overrides.insert("USD".to_string(), 7.0);
        overrides.insert("CHF".to_string(), 8.2);
        table.merge(&overrides);

        assert_eq!(table.rate("USD"), 7.0);
        assert_eq!(table.rate("CHF"), 8.2);
        // Untouched defaults survive the merge
        assert_eq!(table.rate("EUR"), 7.8);
    }

    #[test]
    fn test_entries_are_sorted_by_code() {
        let table = RateTable::with_defaults();
        let codes: Vec<&str> = table.entries().iter().map(|(code, _)| *code).collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        assert_eq!(codes, sorted);
    }
}
