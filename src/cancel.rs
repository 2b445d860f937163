use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Write-once cooperative cancellation flag, shared between the driver and
/// its workers. Cancelling is idempotent; observers poll between loop
/// iterations, never preemptively.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
