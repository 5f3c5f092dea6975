use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared view of the local Bluetooth adapter state.
///
/// Clones observe the same state, so the owner of the system adapter can flip it
/// while proxies holding a clone keep consulting it.
#[derive(Debug, Clone)]
pub struct Adapter {
    enabled: Arc<AtomicBool>,
}

impl Adapter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    /// Checks if the adapter is enabled and ready for use.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

impl Default for Adapter {
    fn default() -> Self {
        Self::new(true)
    }
}
