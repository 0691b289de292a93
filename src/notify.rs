//! Transient user-facing notifications with a single auto-dismiss timer.
//!
//! Invariant: at most one dismissal timer is pending. `show` cancels the
//! previous timer before arming its own, so a burst of calls leaves only the
//! last message on screen for its full timeout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    #[default]
    Info,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub visible: bool,
}

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    state: watch::Sender<Notification>,
    timer: Mutex<Option<PendingTimer>>,
    generation: AtomicU64,
    issued: AtomicU64,
    default_timeout: Duration,
}

/// Cloneable handle; clones share the same notification and timer.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Notifier {
    pub fn new(default_timeout: Duration) -> Self {
        let (state, _) = watch::channel(Notification::default());
        Self {
            inner: Arc::new(Inner {
                state,
                timer: Mutex::new(None),
                generation: AtomicU64::new(0),
                issued: AtomicU64::new(0),
                default_timeout,
            }),
        }
    }

    pub fn show<S: Into<String>>(&self, message: S, severity: Severity) {
        self.show_for(message, severity, self.inner.default_timeout);
    }

    /// Must be called from within a tokio runtime; the dismissal is a spawned sleep.
    pub fn show_for<S: Into<String>>(&self, message: S, severity: Severity, timeout: Duration) {
        let message = message.into();
        let mut slot = self.inner.timer.lock();
        if let Some(prev) = slot.take() {
            prev.handle.abort();
        }
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(target: "notify", ?severity, generation, "show: {}", message);
        self.inner.state.send_replace(Notification { message, severity, visible: true });
        self.inner.issued.fetch_add(1, Ordering::Relaxed);

        let inner = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let Some(inner) = inner.upgrade() else { return };
            let mut slot = inner.timer.lock();
            // A newer show may have replaced us after we woke; only the owner hides.
            if slot.as_ref().map(|t| t.generation) == Some(generation) {
                *slot = None;
                inner.state.send_modify(|n| n.visible = false);
            }
        });
        *slot = Some(PendingTimer { generation, handle });
    }

    pub fn success<S: Into<String>>(&self, message: S) { self.show(message, Severity::Success) }
    pub fn error<S: Into<String>>(&self, message: S) { self.show(message, Severity::Error) }
    pub fn info<S: Into<String>>(&self, message: S) { self.show(message, Severity::Info) }

    /// Cancel the pending timer and hide immediately.
    pub fn hide(&self) {
        let mut slot = self.inner.timer.lock();
        if let Some(prev) = slot.take() {
            prev.handle.abort();
        }
        self.inner.state.send_modify(|n| n.visible = false);
    }

    pub fn current(&self) -> Notification { self.inner.state.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<Notification> { self.inner.state.subscribe() }

    pub fn has_pending_timer(&self) -> bool { self.inner.timer.lock().is_some() }

    /// Number of notifications shown since creation.
    pub fn issued(&self) -> u64 { self.inner.issued.load(Ordering::Relaxed) }

    pub fn default_timeout(&self) -> Duration { self.inner.default_timeout }
}

impl Default for Notifier {
    fn default() -> Self { Self::new(Duration::from_millis(4000)) }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("current", &self.current())
            .field("pending_timer", &self.has_pending_timer())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn auto_dismiss_after_timeout() {
        let n = Notifier::new(Duration::from_millis(4000));
        n.success("saved");
        assert!(n.current().visible);
        assert!(n.has_pending_timer());

        tokio::time::sleep(Duration::from_millis(3999)).await;
        assert!(n.current().visible);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!n.current().visible);
        assert_eq!(n.current().message, "saved");
        assert!(!n.has_pending_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn burst_keeps_last_message_for_its_full_timeout() {
        let n = Notifier::new(Duration::from_millis(4000));
        n.info("one");
        n.error("two");
        n.show_for("three", Severity::Success, Duration::from_millis(1000));
        assert!(n.has_pending_timer());
        assert_eq!(n.issued(), 3);
        let cur = n.current();
        assert_eq!(cur.message, "three");
        assert_eq!(cur.severity, Severity::Success);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(n.current().visible);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!n.current().visible);

        // The cancelled 4s timers never fire into a later notification.
        n.info("four");
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert!(n.current().visible);
        assert_eq!(n.current().message, "four");
    }

    #[tokio::test(start_paused = true)]
    async fn hide_cancels_pending_timer() {
        let n = Notifier::default();
        let mut rx = n.subscribe();
        n.error("boom");
        rx.changed().await.unwrap();
        assert!(rx.borrow().visible);

        n.hide();
        assert!(!n.current().visible);
        assert!(!n.has_pending_timer());
        // hide on an already hidden notification is harmless
        n.hide();
        assert!(!n.current().visible);
    }
}
