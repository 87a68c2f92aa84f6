use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::registry::SourceRegistry;
use super::sources_errors::SourceError;
use super::sources_model::SourceDescriptor;
use super::sources_traits::SourceAdapter;

/// Per-aggregator memoization of one adapter instance per source id.
///
/// Double-checked: the common path is a shared read of the map; on a miss
/// the write lock is taken, the map re-checked, and only then is the
/// factory run. Construction is therefore at-most-once per id even when
/// many fan-out workers hit the same cold source together. Append-only,
/// no eviction.
#[derive(Default)]
pub struct AdapterCache {
    adapters: RwLock<HashMap<String, Arc<dyn SourceAdapter>>>,
}

impl AdapterCache {
    pub fn new() -> Self {
        AdapterCache {
            adapters: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_build(
        &self,
        descriptor: &SourceDescriptor,
        registry: &SourceRegistry,
    ) -> Result<Arc<dyn SourceAdapter>, SourceError> {
        // Poisoning only means a factory panicked while holding the lock.
        // The map is append-only and still consistent, so recover the guard.
        {
            let adapters = self.adapters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(adapter) = adapters.get(&descriptor.id) {
                return Ok(Arc::clone(adapter));
            }
        }

        let mut adapters = self.adapters.write().unwrap_or_else(|e| e.into_inner());
        // Re-check: another worker may have built it between the read and
        // the write lock.
        if let Some(adapter) = adapters.get(&descriptor.id) {
            return Ok(Arc::clone(adapter));
        }

        let entry = registry.resolve(&descriptor.id)?;
        let adapter = (entry.factory)(descriptor)?;
        adapters.insert(descriptor.id.clone(), Arc::clone(&adapter));
        Ok(adapter)
    }

    pub fn len(&self) -> usize {
        self.adapters.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
