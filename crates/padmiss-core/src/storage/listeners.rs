//! Callbacks invoked after every successful save.
//!
//! Collaborators that cache configuration values (device drivers, the sync
//! job, a web UI) register a zero-argument listener and re-read what they
//! need when it fires.  Listeners run in registration order.
//!
//! [`ListenerRegistry::notify`] calls a snapshot of the registered listeners
//! taken before the first call, with the registry lock released.  A listener
//! may therefore register or unregister listeners, or save the configuration
//! again, without deadlocking; such changes take effect from the next
//! notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// A change listener.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`ListenerRegistry::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered, thread-safe list of change listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, Listener)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `listener` to the list.
    pub fn register<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Removes the listener registered under `id`.
    ///
    /// Returns `false` if it was already removed.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Calls every registered listener once, in registration order.
    ///
    /// Returns the number of listeners called.
    pub fn notify(&self) -> usize {
        let snapshot: Vec<Listener> = self
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        debug!("notifying {} config listener(s)", snapshot.len());
        for listener in &snapshot {
            listener();
        }
        snapshot.len()
    }

    // A listener that panicked while another thread held the lock leaves the
    // Vec itself intact, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
