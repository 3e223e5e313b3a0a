use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// One-shot "ready" signal for hosts waiting on the UI.
///
/// [`ReadySignal::emit`] succeeds once per lifetime; later calls are ignored.
#[derive(Debug, Default)]
pub struct ReadySignal {
    emitted: AtomicBool,
    notify: Notify,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the signal. Returns `true` only for the first call.
    pub fn emit(&self) -> bool {
        if self.emitted.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.notify.notify_waiters();
        true
    }

    pub fn is_emitted(&self) -> bool {
        self.emitted.load(Ordering::Acquire)
    }

    /// Resolves once the signal has been emitted.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_emitted() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_emit_only_once() {
        let signal = ReadySignal::new();
        assert!(!signal.is_emitted());
        assert!(signal.emit());
        assert!(!signal.emit());
        assert!(signal.is_emitted());
    }

    #[tokio::test]
    async fn test_wait_resolves_after_emit() {
        let signal = Arc::new(ReadySignal::new());
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait().await })
        };
        tokio::task::yield_now().await;
        signal.emit();
        waiter.await.unwrap();

        // already emitted: returns immediately
        signal.wait().await;
    }
}
