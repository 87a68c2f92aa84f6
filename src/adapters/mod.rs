pub(crate) mod deepseek;
pub(crate) mod fields;
pub(crate) mod http;
pub(crate) mod moonshot;
pub(crate) mod oneapi;
pub(crate) mod openai;
pub(crate) mod packycode;
pub(crate) mod siliconflow;
pub(crate) mod zhipu;

pub use http::HttpFetcher;

use crate::sources::SourceRegistry;

/// Registry of every adapter shipped with the binary. Entries carry the
/// provider defaults; user configuration overrides them per source.
pub fn builtin_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(deepseek::entry());
    registry.register(moonshot::entry());
    registry.register(oneapi::entry());
    registry.register(openai::entry());
    registry.register(packycode::entry());
    registry.register(siliconflow::entry());
    registry.register(zhipu::entry());
    registry
}
