//! Dependencies injected into every store.

use std::sync::Arc;

use bistro_core::{Clock, SystemClock};

use crate::scheduler::{ImmediateScheduler, Scheduler};

/// Clock + scheduler pair handed to store constructors.
///
/// Stores never reach for ambient time or timers; tests build isolated
/// contexts per case (see [`StoreContext::immediate`]).
#[derive(Clone)]
pub struct StoreContext {
    pub clock: Arc<dyn Clock>,
    pub scheduler: Arc<dyn Scheduler>,
}

impl StoreContext {
    pub fn new(clock: Arc<dyn Clock>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self { clock, scheduler }
    }

    /// System clock with zero-latency inline execution.
    pub fn immediate() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(ImmediateScheduler))
    }
}

impl core::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StoreContext").finish_non_exhaustive()
    }
}
