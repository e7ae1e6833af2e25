use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

use super::{
    Event, EventKind, KeyFilter, Listener, ListenerId, Output, Store, StoreError, Transform,
    Update, Value,
};

/// A single-process stand-in for the data grid.
///
/// Writes are optimistic: a transform runs against a snapshot taken outside the lock and only
/// commits if the key's version is still the one it saw. Otherwise it is run again against the
/// newer value. Listeners are notified after the commit, outside the lock. The store is cheap to
/// clone and every clone shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<InnerStore>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .map(|state| state.listeners.len())
            .unwrap_or_default()
    }
}

#[derive(Default)]
struct InnerStore {
    state: Mutex<State>,
    next_listener_id: AtomicU64,
}

#[derive(Default)]
struct State {
    keys: HashMap<Bytes, Entry>,
    listeners: BTreeMap<ListenerId, Registration>,
    // Monotonic commit counter, used as the per-key version.
    commits: u64,
}

struct Entry {
    value: Arc<Value>,
    version: u64,
}

struct Registration {
    filter: KeyFilter,
    listener: Arc<dyn Listener>,
}

impl InnerStore {
    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn apply(&self, key: &Bytes, transform: &Transform) -> Result<Output, StoreError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let (current, version) = {
                let state = self.lock()?;
                let entry = state.keys.get(key);
                (
                    entry.map(|e| e.value.clone()),
                    entry.map(|e| e.version),
                )
            };

            let applied = transform(current.as_deref())?;
            if applied.update == Update::Keep {
                return Ok(applied.output);
            }

            let mut state = self.lock()?;
            if state.keys.get(key).map(|e| e.version) != version {
                trace!(attempt, "key changed while applying, retrying");
                continue;
            }

            let event = state.commit(key, applied.update);
            let listeners = match &event {
                Some(event) => state.listeners_for(&event.key),
                None => Vec::new(),
            };
            drop(state);

            if let Some(event) = event {
                for listener in listeners {
                    listener.on_event(&event);
                }
            }

            return Ok(applied.output);
        }
    }
}

impl State {
    fn commit(&mut self, key: &Bytes, update: Update) -> Option<Event> {
        match update {
            Update::Keep => None,
            Update::Put(value) => {
                self.commits += 1;
                let value = Arc::new(value);
                let entry = Entry {
                    value: value.clone(),
                    version: self.commits,
                };
                let kind = match self.keys.insert(key.clone(), entry) {
                    Some(_) => EventKind::Modified,
                    None => EventKind::Created,
                };
                Some(Event {
                    key: key.clone(),
                    kind,
                    value: Some(value),
                })
            }
            Update::Remove => self.keys.remove(key).map(|_| Event {
                key: key.clone(),
                kind: EventKind::Removed,
                value: None,
            }),
        }
    }

    fn listeners_for(&self, key: &[u8]) -> Vec<Arc<dyn Listener>> {
        self.listeners
            .values()
            .filter(|registration| registration.filter.accept(key))
            .map(|registration| registration.listener.clone())
            .collect()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &Bytes) -> BoxFuture<'static, Result<Option<Arc<Value>>, StoreError>> {
        let inner = self.inner.clone();
        let key = key.clone();

        async move {
            let state = inner.lock()?;
            Ok(state.keys.get(&key).map(|entry| entry.value.clone()))
        }
        .boxed()
    }

    fn apply(&self, key: Bytes, transform: Transform) -> BoxFuture<'static, Result<Output, StoreError>> {
        let inner = self.inner.clone();

        async move { inner.apply(&key, &transform) }.boxed()
    }

    fn add_listener(
        &self,
        filter: KeyFilter,
        listener: Arc<dyn Listener>,
    ) -> BoxFuture<'static, Result<ListenerId, StoreError>> {
        let inner = self.inner.clone();

        async move {
            let id = ListenerId(inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
            inner
                .lock()?
                .listeners
                .insert(id, Registration { filter, listener });
            trace!(%id, "listener added");
            Ok(id)
        }
        .boxed()
    }

    fn remove_listener(&self, id: ListenerId) -> BoxFuture<'static, Result<(), StoreError>> {
        let inner = self.inner.clone();

        async move {
            if inner.lock()?.listeners.remove(&id).is_some() {
                trace!(%id, "listener removed");
            }
            Ok(())
        }
        .boxed()
    }
}
