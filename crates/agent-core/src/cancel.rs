//! Cooperative cancellation for agent runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Clonable stop signal checked by the loop before each model call.
///
/// Cancelling never interrupts an in-flight provider or tool call; the run
/// stops at the next step boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
