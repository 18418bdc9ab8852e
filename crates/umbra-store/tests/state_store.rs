//! Integration tests for the state store: notification order, change
//! suppression, unsubscribe semantics.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::Level;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use umbra_store::StateStore;
use umbra_types::{PlayerId, RoundState, Value};

type Log = Rc<RefCell<Vec<String>>>;

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn count_warnings(f: impl FnOnce()) -> usize {
    let counter = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&counter)));
    tracing::subscriber::with_default(subscriber, f);
    counter.load(Ordering::SeqCst)
}

// =========================================================================
// Get / Set
// =========================================================================

#[test]
fn test_get_returns_latest_set() {
    let store = StateStore::new();
    for n in [1_i64, 2, 2, 7, -3] {
        store.set("n", n);
        assert_eq!(store.get("n"), Some(Value::Int(n)));
    }
    store.set("state", RoundState::Playing);
    assert_eq!(store.get("state").and_then(|v| v.as_round()), Some(RoundState::Playing));
    assert_eq!(store.len(), 2);
    assert_eq!(store.keys(), vec!["n".to_string(), "state".to_string()]);
}

#[test]
fn test_unchanged_set_fires_nothing() {
    let store = StateStore::new();
    let log = new_log();

    let l = Rc::clone(&log);
    let _key = store.subscribe("n", move |_, _| l.borrow_mut().push("key".into()));
    let l = Rc::clone(&log);
    let _all = store.subscribe_global(move |_, _, _| l.borrow_mut().push("global".into()));

    store.set("n", 5_i64);
    store.set("n", 5_i64);
    store.set("n", 5_i64);

    assert_eq!(*log.borrow(), vec!["key", "global"]);
}

#[test]
fn test_repeated_nan_set_fires_once() {
    let store = StateStore::new();
    let fired = Rc::new(RefCell::new(0_usize));

    let f = Rc::clone(&fired);
    let _key = store.subscribe("ratio", move |_, _| *f.borrow_mut() += 1);

    store.set("ratio", f64::NAN);
    store.set("ratio", f64::NAN);
    store.set("ratio", f64::NAN);
    assert_eq!(*fired.borrow(), 1);

    store.set("ratio", 0.5);
    assert_eq!(*fired.borrow(), 2);
}

#[test]
fn test_key_listeners_then_global_in_subscription_order() {
    let store = StateStore::new();
    let log = new_log();

    let l = Rc::clone(&log);
    let _g1 = store.subscribe_global(move |key, _, _| l.borrow_mut().push(format!("g1 {key}")));
    let l = Rc::clone(&log);
    let _k1 = store.subscribe("RoundState", move |_, _| l.borrow_mut().push("k1".into()));
    let l = Rc::clone(&log);
    let _k2 = store.subscribe("RoundState", move |_, _| l.borrow_mut().push("k2".into()));
    let l = Rc::clone(&log);
    let _other = store.subscribe("Other", move |_, _| l.borrow_mut().push("other".into()));

    store.set("RoundState", RoundState::Intermission);

    assert_eq!(*log.borrow(), vec!["k1", "k2", "g1 RoundState"]);
}

#[test]
fn test_listener_sees_new_and_old() {
    let store = StateStore::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let s = Rc::clone(&seen);
    let _sub = store.subscribe("RoundState", move |new, old| {
        s.borrow_mut().push((old.as_round(), new.as_round()));
    });

    store.set("RoundState", RoundState::Intermission);
    store.set("RoundState", RoundState::Playing);

    assert_eq!(
        *seen.borrow(),
        vec![
            (None, Some(RoundState::Intermission)),
            (Some(RoundState::Intermission), Some(RoundState::Playing)),
        ]
    );
}

#[test]
fn test_listener_can_read_store_and_write_other_keys() {
    let store = StateStore::new();
    let weak = Rc::downgrade(&store);
    let _sub = store.subscribe("AlivePlayers", move |new, _| {
        if let Some(store) = weak.upgrade() {
            let count = new.as_players().map_or(0, <[PlayerId]>::len);
            assert_eq!(store.get("AlivePlayers").as_ref(), Some(new));
            store.set("AliveCount", count as i64);
        }
    });

    store.set("AlivePlayers", vec![PlayerId(1), PlayerId(2)]);

    assert_eq!(store.get("AliveCount"), Some(Value::Int(2)));
}

// =========================================================================
// Unsubscribe
// =========================================================================

#[test]
fn test_unsubscribe_is_idempotent() {
    let store = StateStore::new();
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    let sub = store.subscribe("k", move |_, _| *h.borrow_mut() += 1);

    assert!(sub.is_active());
    assert_eq!(sub.key(), Some("k"));
    assert_eq!(store.listener_count("k"), 1);

    assert!(sub.unsubscribe());
    assert!(!sub.unsubscribe());
    assert!(!sub.is_active());
    assert_eq!(store.listener_count("k"), 0);

    store.set("k", true);
    assert_eq!(*hits.borrow(), 0);
}

#[test]
fn test_listener_removed_mid_dispatch_is_skipped() {
    let store = StateStore::new();
    let log = new_log();
    let second: Rc<RefCell<Option<umbra_store::Subscription>>> = Rc::new(RefCell::new(None));

    let l = Rc::clone(&log);
    let victim = Rc::clone(&second);
    let _first = store.subscribe("k", move |_, _| {
        l.borrow_mut().push("first".into());
        if let Some(sub) = victim.borrow().as_ref() {
            sub.unsubscribe();
        }
    });
    let l = Rc::clone(&log);
    *second.borrow_mut() = Some(store.subscribe("k", move |_, _| l.borrow_mut().push("second".into())));

    store.set("k", 1_i64);

    assert_eq!(*log.borrow(), vec!["first"]);
}

#[test]
fn test_handle_outliving_store_is_inert() {
    let store = StateStore::new();
    let sub = store.subscribe_global(|_, _, _| {});
    drop(store);
    assert!(!sub.is_active());
    assert!(!sub.unsubscribe());
}

// =========================================================================
// Has / Remove / Clear
// =========================================================================

#[test]
fn test_remove_absent_key_warns_once() {
    let store = StateStore::new();
    store.set("k", "v");

    let warnings = count_warnings(|| {
        assert_eq!(store.remove("k"), Some(Value::Text("v".into())));
        assert_eq!(store.remove("k"), None);
    });

    assert_eq!(warnings, 1);
    assert!(!store.has("k"));
}

#[test]
fn test_remove_does_not_notify() {
    let store = StateStore::new();
    store.set("k", 1_i64);
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    let _sub = store.subscribe_global(move |_, _, _| *h.borrow_mut() += 1);

    store.remove("k");

    assert_eq!(*hits.borrow(), 0);
    assert_eq!(store.get_or("k", Value::Int(0)), Value::Int(0));
}

#[test]
fn test_clear_keeps_listeners() {
    let store = StateStore::new();
    store.set("a", 1_i64);
    store.set("b", 2_i64);
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    let _sub = store.subscribe("a", move |_, _| *h.borrow_mut() += 1);

    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.listener_count("a"), 1);

    // Old value was cleared, so setting 1 again is a change.
    store.set("a", 1_i64);
    assert_eq!(*hits.borrow(), 1);
}
