pub(crate) mod adapter_cache;
pub(crate) mod registry;
pub(crate) mod sources_errors;
pub(crate) mod sources_model;
pub(crate) mod sources_traits;

// Re-export the public interface
pub use adapter_cache::AdapterCache;
pub use registry::{AdapterFactory, RegistryEntry, SourceRegistry};
pub use sources_errors::SourceError;
pub use sources_model::{
    CostRecord, PlanReport, PlanWindow, QuotaEntry, QuotaReport, ResourceKind, SourceDescriptor,
};
pub use sources_traits::SourceAdapter;
