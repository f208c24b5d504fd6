//! Process-wide slot for the callback that populates the type registry.

use crate::TypeRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

pub type Bootstrapper = Arc<dyn Fn(&TypeRegistry) + Send + Sync>;

static GLOBAL_BOOTSTRAP: OnceLock<Arc<BootstrapStore>> = OnceLock::new();

/// Holds at most one bootstrapper.
///
/// A failed attempt with an empty slot is remembered so hot lookup paths can
/// fail fast, but installing a bootstrapper later clears that memory.
#[derive(Default)]
pub struct BootstrapStore {
    slot: Mutex<Option<Bootstrapper>>,
    installed: AtomicBool,
    attempted: AtomicBool,
}

impl BootstrapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Arc<Self> {
        GLOBAL_BOOTSTRAP
            .get_or_init(|| Arc::new(Self::new()))
            .clone()
    }

    /// Install (or replace) the bootstrapper.
    pub fn set_bootstrapper(&self, bootstrapper: Bootstrapper) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(bootstrapper);
        self.installed.store(true, Ordering::Release);
        self.attempted.store(false, Ordering::Release);
    }

    pub fn has_bootstrapper(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Whether `try_bootstrap` has been called since the last install or reset.
    pub fn attempted(&self) -> bool {
        self.attempted.load(Ordering::Acquire)
    }

    /// Run the installed bootstrapper against `registry`.
    ///
    /// Returns `true` when a bootstrapper existed and ran.
    pub fn try_bootstrap(&self, registry: &TypeRegistry) -> bool {
        if self.attempted() && !self.has_bootstrapper() {
            return false;
        }

        let bootstrapper = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.attempted.store(true, Ordering::Release);

        match bootstrapper {
            Some(bootstrapper) => {
                bootstrapper(registry);
                true
            }
            None => false,
        }
    }

    pub fn reset(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        self.installed.store(false, Ordering::Release);
        self.attempted.store(false, Ordering::Release);
    }
}
