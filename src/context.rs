//! Settings shared by every spinner in a process

use crate::interrupt::InterruptSupervisor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared spinner context.
///
/// Holds the non-interactive override and, optionally, the interrupt
/// supervisor spinners register their cursor-restore callback with. Clones
/// share state, so flipping the override on one clone affects spinners built
/// from any of them afterwards.
#[derive(Debug, Clone, Default)]
pub struct Context {
    non_interactive: Arc<AtomicBool>,
    interrupts: Option<InterruptSupervisor>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from the environment (`TWIRL_NON_INTERACTIVE`)
    pub fn from_env() -> Self {
        let context = Self::new();
        if env_flag("TWIRL_NON_INTERACTIVE") {
            context.set_non_interactive(true);
        }
        context
    }

    pub fn with_interrupts(mut self, supervisor: InterruptSupervisor) -> Self {
        self.interrupts = Some(supervisor);
        self
    }

    /// Force every spinner built afterwards onto the non-animated path
    pub fn set_non_interactive(&self, enabled: bool) {
        self.non_interactive.store(enabled, Ordering::SeqCst);
    }

    pub fn is_non_interactive(&self) -> bool {
        self.non_interactive.load(Ordering::SeqCst)
    }

    pub fn interrupts(&self) -> Option<&InterruptSupervisor> {
        self.interrupts.as_ref()
    }
}

/// Truthy environment flag: `1`, `true`, `yes` or `on`
pub(crate) fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|value| {
            matches!(
                value.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}
