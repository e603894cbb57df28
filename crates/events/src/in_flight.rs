//! "Operation in flight" tracking shared by the stores.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::observable::Observable;

/// Counts outstanding operations and exposes `count > 0` as an observable
/// flag.
///
/// The flag only emits on transitions (idle -> busy, busy -> idle). Each
/// counter change is reconciled against the flag under the observable's write
/// lock, so overlapping operations finishing out of order cannot leave the
/// flag reading "idle" while another operation is still running.
#[derive(Debug, Clone)]
pub struct InFlight {
    count: Arc<AtomicUsize>,
    flag: Observable<bool>,
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl InFlight {
    pub fn new() -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(0)),
            flag: Observable::new(false),
        }
    }

    /// Mark one operation as started. The returned guard marks it finished
    /// when dropped, whether the operation succeeded, failed, or was
    /// discarded by its scheduler.
    pub fn begin(&self) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        self.reconcile();
        InFlightGuard {
            owner: self.clone(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.flag.snapshot()
    }

    pub fn outstanding(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn stream(&self) -> &Observable<bool> {
        &self.flag
    }

    fn reconcile(&self) {
        let count = Arc::clone(&self.count);
        let _ = self.flag.try_update(move |current| {
            let busy = count.load(Ordering::Acquire) > 0;
            if busy == *current { Err(()) } else { Ok((busy, ())) }
        });
    }
}

/// Marks an operation finished on drop.
#[derive(Debug)]
#[must_use = "dropping the guard immediately ends the operation"]
pub struct InFlightGuard {
    owner: InFlight,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.owner.count.fetch_sub(1, Ordering::AcqRel);
        self.owner.reconcile();
    }
}
