//! Listener handles.

use std::cell::RefCell;
use std::rc::Weak;

use crate::store::StoreInner;

/// Handle returned by `subscribe` / `subscribe_global`.
///
/// Dropping the handle does **not** unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe). A handle outliving its store is
/// inert.
#[derive(Debug)]
pub struct Subscription {
    pub(crate) id: u64,
    /// `None` for a global listener.
    pub(crate) key: Option<String>,
    pub(crate) store: Weak<RefCell<StoreInner>>,
}

impl Subscription {
    /// Removes the listener. Returns `true` if it was still registered.
    pub fn unsubscribe(&self) -> bool {
        let Some(store) = self.store.upgrade() else {
            return false;
        };
        // Each taken listener outlives the `borrow_mut` temporary, so it is
        // dropped with the store unborrowed.
        match self.key.as_deref() {
            Some(key) => {
                let listener = store.borrow_mut().take_key_listener(key, self.id);
                listener.is_some()
            }
            None => {
                let listener = store.borrow_mut().take_global_listener(self.id);
                listener.is_some()
            }
        }
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.borrow().has_listener(self.key.as_deref(), self.id))
    }

    /// The key this listener watches, or `None` for a global listener.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}
