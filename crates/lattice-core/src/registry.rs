use crate::{BootstrapOutcome, BootstrapStore, EntityFactory, RegistryError, TypeKey};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

static GLOBAL_REGISTRY: OnceLock<Arc<TypeRegistry>> = OnceLock::new();

#[derive(Default)]
struct RegistryState {
    by_registry_key: BTreeMap<String, TypeKey>,
    by_wire_type: BTreeMap<String, TypeKey>,
}

/// Maps type keys to entity factories.
///
/// Registration is first-writer-wins. A lookup miss runs the bootstrap store
/// once and retries before reporting the key as unregistered.
pub struct TypeRegistry {
    state: RwLock<RegistryState>,
    bootstrap: Arc<BootstrapStore>,
}

impl TypeRegistry {
    pub fn new(bootstrap: Arc<BootstrapStore>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            bootstrap,
        }
    }

    /// Registry with a private bootstrap store, for tests and embedding.
    pub fn standalone() -> Self {
        Self::new(Arc::new(BootstrapStore::new()))
    }

    /// Process-wide registry backed by [`BootstrapStore::global`].
    pub fn global() -> Arc<Self> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(Self::new(BootstrapStore::global())))
            .clone()
    }

    pub fn bootstrap_store(&self) -> &Arc<BootstrapStore> {
        &self.bootstrap
    }

    /// Returns `false` when the registry key was already taken.
    pub fn register(&self, key: &TypeKey) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.by_registry_key.entry(key.registry_key().to_string()) {
            Entry::Occupied(_) => {
                debug!(
                    registry_key = key.registry_key(),
                    "ignoring duplicate type registration"
                );
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(key.clone());
            }
        }
        state
            .by_wire_type
            .entry(key.wire_type().to_string())
            .or_insert_with(|| key.clone());
        true
    }

    /// Factory registered under `key`'s registry key.
    pub fn get(&self, key: &TypeKey) -> Result<EntityFactory, RegistryError> {
        self.resolve(key.registry_key())
            .map(|registered| registered.factory().clone())
    }

    /// Self-healing lookup by registry key.
    pub fn resolve(&self, registry_key: &str) -> Result<TypeKey, RegistryError> {
        if let Some(found) = self.find_by_registry_key(registry_key) {
            return Ok(found);
        }

        debug!(registry_key, "type registry miss; attempting bootstrap");
        if !self.bootstrap.try_bootstrap(self) {
            return Err(RegistryError::not_registered(
                registry_key,
                BootstrapOutcome::NoBootstrapper,
            ));
        }

        self.find_by_registry_key(registry_key).ok_or_else(|| {
            RegistryError::not_registered(registry_key, BootstrapOutcome::RanWithoutKey)
        })
    }

    pub fn find_by_registry_key(&self, registry_key: &str) -> Option<TypeKey> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.by_registry_key.get(registry_key).cloned()
    }

    pub fn find_by_wire_name(&self, wire_type: &str) -> Option<TypeKey> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.by_wire_type.get(wire_type).cloned()
    }

    pub fn registry_keys(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.by_registry_key.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.by_registry_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registration. The bootstrap store is left untouched.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.by_registry_key.clear();
        state.by_wire_type.clear();
    }
}
