use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;

use super::sources_errors::SourceError;
use super::sources_model::SourceDescriptor;
use super::sources_traits::SourceAdapter;

pub type AdapterFactory =
    Box<dyn Fn(&SourceDescriptor) -> Result<Arc<dyn SourceAdapter>, SourceError> + Send + Sync>;

/// One registered source: its adapter factory plus the default descriptor
/// a user config is merged over.
pub struct RegistryEntry {
    pub defaults: SourceDescriptor,
    pub factory: AdapterFactory,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Mapping from source id to adapter factory and default parameters.
///
/// The built-in registry is initialized lazily, exactly once, and read-only
/// afterwards. Custom registries can be assembled in tests and injected
/// wherever an `Arc<SourceRegistry>` is taken.
#[derive(Default)]
pub struct SourceRegistry {
    entries: HashMap<String, RegistryEntry>,
}

lazy_static! {
    static ref BUILTIN: Arc<SourceRegistry> = Arc::new(crate::adapters::builtin_registry());
}

impl SourceRegistry {
    pub fn new() -> Self {
        SourceRegistry {
            entries: HashMap::new(),
        }
    }

    /// The registry of all built-in source adapters.
    pub fn builtin() -> Arc<SourceRegistry> {
        Arc::clone(&BUILTIN)
    }

    pub fn register(&mut self, entry: RegistryEntry) {
        self.entries.insert(entry.defaults.id.clone(), entry);
    }

    /// Look up a source id. An unknown id is a configuration error for the
    /// caller that asked for it, never a disabled source.
    pub fn resolve(&self, id: &str) -> Result<&RegistryEntry, SourceError> {
        self.entries
            .get(id)
            .ok_or_else(|| SourceError::UnknownSource(id.to_string()))
    }

    /// All known source ids, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
