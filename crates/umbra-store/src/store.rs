//! The `StateStore` service.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use umbra_service::{Service, ServiceBase, ServiceError, ServiceMap};
use umbra_types::Value;

use crate::Subscription;

/// Registered name of the store service.
pub const STATE_STORE: &str = "StateStore";

/// Called with `(new, old)` when the watched key changes.
pub type KeyListener = Rc<dyn Fn(&Value, &Value)>;

/// Called with `(key, new, old)` when any key changes.
pub type GlobalListener = Rc<dyn Fn(&str, &Value, &Value)>;

#[derive(Default)]
pub(crate) struct StoreInner {
    values: HashMap<String, Value>,
    key_listeners: HashMap<String, Vec<(u64, KeyListener)>>,
    global_listeners: Vec<(u64, GlobalListener)>,
    next_listener: u64,
}

impl StoreInner {
    fn next_id(&mut self) -> u64 {
        let id = self.next_listener;
        self.next_listener += 1;
        id
    }

    pub(crate) fn has_listener(&self, key: Option<&str>, id: u64) -> bool {
        match key {
            Some(key) => self
                .key_listeners
                .get(key)
                .is_some_and(|list| list.iter().any(|(lid, _)| *lid == id)),
            None => self.global_listeners.iter().any(|(lid, _)| *lid == id),
        }
    }

    /// Takes a key listener out of the store. The caller drops it once the
    /// store borrow is released.
    pub(crate) fn take_key_listener(&mut self, key: &str, id: u64) -> Option<KeyListener> {
        let list = self.key_listeners.get_mut(key)?;
        let index = list.iter().position(|(lid, _)| *lid == id)?;
        let (_, listener) = list.remove(index);
        if list.is_empty() {
            self.key_listeners.remove(key);
        }
        Some(listener)
    }

    /// Takes a global listener out of the store, same contract as
    /// [`take_key_listener`](Self::take_key_listener).
    pub(crate) fn take_global_listener(&mut self, id: u64) -> Option<GlobalListener> {
        let index = self.global_listeners.iter().position(|(lid, _)| *lid == id)?;
        let (_, listener) = self.global_listeners.remove(index);
        Some(listener)
    }
}

/// Keyed value store with per-key and global change listeners.
///
/// An absent key compares as [`Value::Nil`] when deciding whether a `set`
/// is a change. Setting a key to the value it already holds is a no-op:
/// nothing is written and no listener runs. Setting a key to `Nil` removes
/// it (listeners still see the change).
pub struct StateStore {
    base: ServiceBase,
    inner: Rc<RefCell<StoreInner>>,
}

impl StateStore {
    /// Creates an empty store.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            base: ServiceBase::new(STATE_STORE, &[]),
            inner: Rc::new(RefCell::new(StoreInner::default())),
        })
    }

    /// Stores `value` under `key` and notifies listeners if it changed.
    ///
    /// Key listeners run first, then global listeners, each in
    /// subscription order. A listener unsubscribed by an earlier listener
    /// during the same dispatch is skipped.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();

        let (old, key_listeners, global_listeners) = {
            let mut inner = self.inner.borrow_mut();
            let old = inner.values.get(key).cloned().unwrap_or(Value::Nil);
            if old == value {
                return;
            }
            if value == Value::Nil {
                inner.values.remove(key);
            } else {
                inner.values.insert(key.to_string(), value.clone());
            }
            let key_listeners = inner.key_listeners.get(key).cloned().unwrap_or_default();
            (old, key_listeners, inner.global_listeners.clone())
        };

        tracing::trace!(%key, new = ?value, old = ?old, "state changed");

        for (id, listener) in key_listeners {
            if self.inner.borrow().has_listener(Some(key), id) {
                listener(&value, &old);
            }
        }
        for (id, listener) in global_listeners {
            if self.inner.borrow().has_listener(None, id) {
                listener(key, &value, &old);
            }
        }
    }

    /// The value under `key`, if present.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().values.get(key).cloned()
    }

    /// The value under `key`, or `default` if absent.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Whether `key` holds a value.
    pub fn has(&self, key: &str) -> bool {
        self.inner.borrow().values.contains_key(key)
    }

    /// Deletes `key` without notifying listeners. Warns if absent.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.inner.borrow_mut().values.remove(key);
        if removed.is_none() {
            tracing::warn!(%key, "remove of absent key");
        }
        removed
    }

    /// Deletes every value. Listeners stay subscribed.
    pub fn clear(&self) {
        let cleared = std::mem::take(&mut self.inner.borrow_mut().values);
        tracing::debug!(count = cleared.len(), "state store cleared");
    }

    /// Watches one key.
    pub fn subscribe<F>(&self, key: &str, listener: F) -> Subscription
    where
        F: Fn(&Value, &Value) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id();
        inner
            .key_listeners
            .entry(key.to_string())
            .or_default()
            .push((id, Rc::new(listener)));
        Subscription {
            id,
            key: Some(key.to_string()),
            store: Rc::downgrade(&self.inner),
        }
    }

    /// Watches every key.
    pub fn subscribe_global<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&str, &Value, &Value) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id();
        inner.global_listeners.push((id, Rc::new(listener)));
        Subscription {
            id,
            key: None,
            store: Rc::downgrade(&self.inner),
        }
    }

    /// Keys currently holding a value, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.borrow().values.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        self.inner.borrow().values.len()
    }

    /// Whether the store holds no values.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().values.is_empty()
    }

    /// Listeners on `key`, not counting global listeners.
    pub fn listener_count(&self, key: &str) -> usize {
        self.inner.borrow().key_listeners.get(key).map_or(0, Vec::len)
    }

    /// Number of global listeners.
    pub fn global_listener_count(&self) -> usize {
        self.inner.borrow().global_listeners.len()
    }
}

impl Service for StateStore {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn init(&self, deps: &ServiceMap) -> Result<(), ServiceError> {
        self.base.init(deps).map(|_| ())
    }

    fn start(&self) -> Result<(), ServiceError> {
        self.base.start().map(|_| ())
    }

    /// Drops every listener. Values are kept for post-mortem reads.
    fn shutdown(&self) {
        if !self.base.shutdown() {
            return;
        }
        let (keyed, global) = {
            let mut inner = self.inner.borrow_mut();
            (
                std::mem::take(&mut inner.key_listeners),
                std::mem::take(&mut inner.global_listeners),
            )
        };
        tracing::debug!(
            keys = keyed.len(),
            global = global.len(),
            "state store listeners released"
        );
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("keys", &self.keys())
            .field("global_listeners", &self.global_listener_count())
            .finish()
    }
}
