/// Base currency for the rate table; every rate is expressed in units of
/// this currency per one unit of the quoted currency.
pub const BASE_CURRENCY: &str = "CNY";

/// Default target currency for totals and value-ranking.
pub const DEFAULT_TARGET_CURRENCY: &str = "CNY";

/// Number of fetches allowed in flight at once during a batch check.
pub const DEFAULT_POOL_WIDTH: usize = 5;

/// Per-request timeout for adapter HTTP calls, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Environment variable holding a JSON object of rate overrides,
/// merged over the built-in rate table.
pub const RATES_ENV_VAR: &str = "LLM_BALANCE_RATES";

/// Directory under the user's home that holds the config file.
pub const CONFIG_DIR_NAME: &str = ".llm-balance";

/// Config file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";
