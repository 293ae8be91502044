// Typed publish/subscribe registry.
//
// Purpose
// - Let producers announce "something happened" without knowing who reacts.
//
// Responsibilities
// - Keep per-kind listeners and catch-all listeners in registration order.
// - On notify, run kind-specific listeners first, then catch-all listeners.
// - Contain listener failures: an Err or a panic is logged and the next listener still runs.
//
// Boundaries
// - Listeners run synchronously on the notifying task. Never hold the registry lock while calling them.

pub mod history;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

pub type Listener<E> = Arc<dyn Fn(&E) -> anyhow::Result<()> + Send + Sync>;

struct Entry<K, E> {
    id: u64,
    kind: Option<K>,
    listener: Listener<E>,
}

struct Registry<K, E> {
    next_id: u64,
    entries: Vec<Entry<K, E>>,
}

impl<K, E> Registry<K, E> {
    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle returned by `subscribe`. Dropping it keeps the listener registered;
/// call `unsubscribe` to detach.
pub struct Subscription {
    id: u64,
    detach: Box<dyn FnOnce(u64) -> bool + Send + Sync>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns false when the listener was already gone (registry dropped).
    pub fn unsubscribe(self) -> bool {
        (self.detach)(self.id)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

pub struct ListenerRegistry<K, E> {
    inner: Arc<Mutex<Registry<K, E>>>,
}

impl<K, E> Default for ListenerRegistry<K, E>
where
    K: Copy + PartialEq + std::fmt::Debug + Send + 'static,
    E: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> ListenerRegistry<K, E>
where
    K: Copy + PartialEq + std::fmt::Debug + Send + 'static,
    E: 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn subscribe<F>(&self, kind: K, listener: F) -> Subscription
    where
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(Some(kind), Arc::new(listener))
    }

    pub fn subscribe_all<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(None, Arc::new(listener))
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    /// Runs every listener interested in `kind` and returns how many failed.
    pub fn notify(&self, kind: K, event: &E) -> usize {
        let listeners: Vec<Listener<E>> = {
            let registry = lock(&self.inner);
            let specific = registry
                .entries
                .iter()
                .filter(|entry| entry.kind == Some(kind));
            let catch_all = registry.entries.iter().filter(|entry| entry.kind.is_none());
            specific
                .chain(catch_all)
                .map(|entry| entry.listener.clone())
                .collect()
        };

        let mut failures = 0;
        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    failures += 1;
                    tracing::warn!(?kind, %error, "event listener failed");
                }
                Err(_) => {
                    failures += 1;
                    tracing::error!(?kind, "event listener panicked");
                }
            }
        }
        failures
    }

    fn register(&self, kind: Option<K>, listener: Listener<E>) -> Subscription {
        let id = {
            let mut registry = lock(&self.inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Entry { id, kind, listener });
            id
        };
        let registry: Weak<Mutex<Registry<K, E>>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            detach: Box::new(move |id| match registry.upgrade() {
                Some(registry) => lock(&registry).remove(id),
                None => false,
            }),
        }
    }
}
