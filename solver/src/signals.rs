//! Cooperative cancellation threaded explicitly through search and propagation.

use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A handle search and the fixed-point loop poll periodically to decide whether to stop
/// early. Cheap to clone (an `Arc` and an optional channel clone) and safe to share across
/// worker threads: any worker or the caller can trigger it, every worker observes it.
#[derive(Clone)]
pub struct Cancel {
    flag: Arc<AtomicBool>,
    external: Option<Receiver<()>>,
}

impl Cancel {
    /// A handle that never cancels on its own; callers can still cancel it via [`Cancel::trigger`].
    pub fn new() -> Self {
        Cancel {
            flag: Arc::new(AtomicBool::new(false)),
            external: None,
        }
    }

    /// A handle that also cancels as soon as `external` yields (or is dropped/closed).
    pub fn with_external_signal(external: Receiver<()>) -> Self {
        Cancel {
            flag: Arc::new(AtomicBool::new(false)),
            external: Some(external),
        }
    }

    /// Requests cancellation. Idempotent; safe from any thread.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested, either directly or via the external signal.
    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::SeqCst) {
            return true;
        }
        if let Some(rx) = &self.external {
            match rx.try_recv() {
                Ok(()) | Err(crossbeam_channel::TryRecvError::Disconnected) => {
                    self.flag.store(true, Ordering::SeqCst);
                    return true;
                }
                Err(crossbeam_channel::TryRecvError::Empty) => {}
            }
        }
        false
    }
}

impl Default for Cancel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_is_observed() {
        let cancel = Cancel::new();
        assert!(!cancel.is_cancelled());
        cancel.trigger();
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn cloned_handle_shares_state() {
        let cancel = Cancel::new();
        let other = cancel.clone();
        other.trigger();
        assert!(cancel.is_cancelled());
    }
}
