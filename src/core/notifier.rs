//! Change notification
//!
//! A payload-free "the parameter set changed" signal. Consumers register a
//! callback and re-read the manager themselves when it fires.
//!
//! # Usage
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use param_sync::core::notifier::ChangeNotifier;
//!
//! let notifier = ChangeNotifier::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let counter = hits.clone();
//! let id = notifier.subscribe(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! notifier.notify();
//! assert!(notifier.unsubscribe(id));
//! notifier.notify();
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`ChangeNotifier::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback list for change notifications
pub struct ChangeNotifier {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a callback invoked on every notification.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a callback. Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Invoke every registered callback.
    ///
    /// Callbacks run after the listener lock is released, so they may
    /// subscribe, unsubscribe or read the manager.
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = self.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in snapshot {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        // A panicking listener never runs under this lock
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter(notifier: &ChangeNotifier) -> (ListenerId, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let clone = hits.clone();
        let id = notifier.subscribe(move || {
            clone.fetch_add(1, Ordering::SeqCst);
        });
        (id, hits)
    }

    #[test]
    fn test_notify_reaches_all_listeners() {
        let notifier = ChangeNotifier::new();
        let (_, a) = counter(&notifier);
        let (_, b) = counter(&notifier);

        notifier.notify();
        notifier.notify();

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let notifier = ChangeNotifier::new();
        let (id, hits) = counter(&notifier);
        assert_eq!(notifier.listener_count(), 1);

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        assert_eq!(notifier.listener_count(), 0);

        notifier.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_notify_without_listeners() {
        ChangeNotifier::new().notify();
    }

    #[test]
    fn test_listener_may_reenter() {
        let notifier = Arc::new(ChangeNotifier::new());
        let inner = notifier.clone();
        notifier.subscribe(move || {
            // Would deadlock if notify held the lock
            let _ = inner.listener_count();
        });
        notifier.notify();
    }
}
