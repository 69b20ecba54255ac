//! Search debouncing.
//!
//! Raw keystrokes go into `SearchDebouncer::input`; the settled value only
//! changes once the caller has been quiet for the configured window. A new
//! input aborts the pending timer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct SearchDebouncer {
    window: Duration,
    settled: Arc<watch::Sender<String>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchDebouncer {
    pub fn new(window: Duration) -> Self {
        Self::with_initial(window, String::new())
    }

    /// Start already settled on `initial` (e.g. a restored search term).
    pub fn with_initial(window: Duration, initial: String) -> Self {
        let (settled, _rx) = watch::channel(initial);
        Self {
            window,
            settled: Arc::new(settled),
            pending: Mutex::new(None),
        }
    }

    /// Record a new raw value. Must be called inside a tokio runtime.
    pub fn input(&self, text: impl Into<String>) {
        let text = text.into();
        if self.window.is_zero() {
            self.settle(text);
            return;
        }

        let tx = self.settled.clone();
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            tx.send_if_modified(|current| {
                if *current == text {
                    return false;
                }
                *current = text;
                true
            });
        });

        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Skip the timer and settle on `text` now (used for resets and restores).
    pub fn settle(&self, text: impl Into<String>) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
        let text = text.into();
        self.settled.send_if_modified(|current| {
            if *current == text {
                return false;
            }
            *current = text;
            true
        });
    }

    /// Drop any pending value without settling it.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }

    pub fn settled(&self) -> String {
        self.settled.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.settled.subscribe()
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_value_settles_after_quiet_window() {
        let debouncer = SearchDebouncer::new(DEFAULT_SEARCH_DEBOUNCE);
        debouncer.input("ac");

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(debouncer.settled(), "");

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(debouncer.settled(), "ac");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_input_only_settles_last_value() {
        let debouncer = SearchDebouncer::new(DEFAULT_SEARCH_DEBOUNCE);
        let mut rx = debouncer.subscribe();

        for text in ["a", "ac", "acm", "acme"] {
            debouncer.input(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(debouncer.settled(), "");

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "acme");
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_value() {
        let debouncer = SearchDebouncer::new(DEFAULT_SEARCH_DEBOUNCE);
        debouncer.input("globex");
        debouncer.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(debouncer.settled(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_is_immediate() {
        let debouncer = SearchDebouncer::with_initial(DEFAULT_SEARCH_DEBOUNCE, "acme".into());
        debouncer.input("acme labs");
        debouncer.settle("");
        assert_eq!(debouncer.settled(), "");

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(debouncer.settled(), "");
    }
}
