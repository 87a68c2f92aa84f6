pub(crate) mod normalizer;
pub(crate) mod rate_table;

pub use normalizer::CurrencyNormalizer;
pub use rate_table::RateTable;
