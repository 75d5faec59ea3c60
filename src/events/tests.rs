use super::*;
use crate::core::error::Error;
use crate::query::QueryShape;
use crate::storage::path_tree::PathTree;
use crate::types::{DataSnapshot, EventType, Path};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

type Seen = Arc<Mutex<Vec<Value>>>;

fn recorder() -> (Seen, Arc<ListenerFn>) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: Arc<ListenerFn> = Arc::new(move |snapshot: DataSnapshot| {
        sink.lock().push(snapshot.into_val());
    });
    (seen, callback)
}

fn tree() -> PathTree {
    let mut tree = PathTree::new();
    tree.reset(json!({
        "resumes": {
            "r1": {"user": "u1", "title": "one"},
            "r2": {"user": "u2", "title": "two"},
            "r3": {"user": "u1", "title": "three"}
        }
    }));
    tree
}

fn path(raw: &str) -> Path {
    Path::parse(raw).unwrap()
}

fn explode(_: DataSnapshot) {
    panic!("listener failure");
}

fn run_all(deliveries: Vec<Delivery>) {
    for delivery in deliveries {
        delivery.deliver();
    }
}

#[test]
fn value_subscription_gets_one_initial_event() {
    // Goal: value subscriptions see the current filtered value exactly once on register
    let registry = ListenerRegistry::new();
    let tree = tree();
    let (seen, callback) = recorder();
    let resumes = path("resumes");

    let (_, deliveries) = registry.subscribe(
        resumes.clone(),
        QueryShape::equality("user", json!("u1")),
        EventType::Value,
        callback,
        None,
        tree.get(&resumes),
    );
    assert_eq!(deliveries.len(), 1);
    run_all(deliveries);

    let seen = seen.lock();
    let value = seen[0].as_object().unwrap();
    assert_eq!(value.len(), 2);
    assert!(value.contains_key("r1") && value.contains_key("r3"));
}

#[test]
fn child_added_initial_events_cover_matching_children() {
    // Goal: child_added replays each existing matching child on register
    let registry = ListenerRegistry::new();
    let tree = tree();
    let (seen, callback) = recorder();
    let resumes = path("resumes");

    let (_, deliveries) = registry.subscribe(
        resumes.clone(),
        QueryShape::equality("user", json!("u1")),
        EventType::ChildAdded,
        callback,
        None,
        tree.get(&resumes),
    );
    let keys: Vec<_> = deliveries
        .iter()
        .map(|d| d.snapshot().key().unwrap().to_owned())
        .collect();
    assert_eq!(keys, vec!["r1", "r3"]);
    run_all(deliveries);
    assert_eq!(seen.lock().len(), 2);
}

#[test]
fn child_removed_carries_the_removed_record() {
    // Goal: removing a child emits its previous value to child_removed listeners
    let registry = ListenerRegistry::new();
    let mut tree = tree();
    let (seen, callback) = recorder();
    let resumes = path("resumes");

    let (_, initial) = registry.subscribe(
        resumes.clone(),
        QueryShape::new(),
        EventType::ChildRemoved,
        callback,
        None,
        tree.get(&resumes),
    );
    assert!(initial.is_empty());

    let removed = path("resumes/r2");
    tree.delete(&removed);
    let deliveries = registry.notify(&removed, |p| tree.get(p));
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].snapshot().key(), Some("r2"));
    run_all(deliveries);

    assert_eq!(seen.lock()[0], json!({"user": "u2", "title": "two"}));
}

#[test]
fn child_changed_and_filter_exit() {
    // Goal: a change inside a filtered child is child_changed; leaving the filter is child_removed
    let registry = ListenerRegistry::new();
    let mut tree = tree();
    let resumes = path("resumes");
    let shape = QueryShape::equality("user", json!("u1"));

    let (changed, on_changed) = recorder();
    let (removed, on_removed) = recorder();
    registry.subscribe(resumes.clone(), shape.clone(), EventType::ChildChanged, on_changed, None, tree.get(&resumes));
    registry.subscribe(resumes.clone(), shape, EventType::ChildRemoved, on_removed, None, tree.get(&resumes));

    let title = path("resumes/r1/title");
    tree.write(&title, json!("renamed"));
    run_all(registry.notify(&title, |p| tree.get(p)));
    assert_eq!(changed.lock().len(), 1);
    assert!(removed.lock().is_empty());

    let owner = path("resumes/r3/user");
    tree.write(&owner, json!("u2"));
    run_all(registry.notify(&owner, |p| tree.get(p)));
    assert_eq!(changed.lock().len(), 1);
    assert_eq!(removed.lock().len(), 1);
    assert_eq!(removed.lock()[0]["title"], json!("three"));
}

#[test]
fn notify_skips_unrelated_paths_and_orders_by_registration() {
    // Goal: only overlapping subscriptions recompute, in subscription order
    let registry = ListenerRegistry::new();
    let mut tree = tree();
    let (_, a) = recorder();
    let (_, b) = recorder();
    let (_, c) = recorder();

    let (first, _) = registry.subscribe(path("resumes/r1"), QueryShape::new(), EventType::Value, a, None, None);
    let (second, _) = registry.subscribe(path("resumes"), QueryShape::new(), EventType::Value, b, None, None);
    registry.subscribe(path("users"), QueryShape::new(), EventType::Value, c, None, None);

    let target = path("resumes/r1/title");
    tree.write(&target, json!("x"));
    let deliveries = registry.notify(&target, |p| tree.get(p));
    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0].snapshot().path(), first.path());
    assert_eq!(deliveries[1].snapshot().path(), second.path());
}

#[test]
fn unsubscribe_is_idempotent_and_suppresses_pending_delivery() {
    // Goal: cancelling a handle drops it from the registry and silences queued events
    let registry = Arc::new(ListenerRegistry::new());
    let tree = tree();
    let (seen, callback) = recorder();
    let resumes = path("resumes");

    let (subscription, deliveries) = registry.subscribe(
        resumes.clone(),
        QueryShape::new(),
        EventType::Value,
        callback,
        None,
        tree.get(&resumes),
    );
    let handle = ListenerHandle::new(subscription, &registry);
    assert!(handle.is_active());
    assert_eq!(registry.count_at(&resumes), 1);

    handle.unsubscribe();
    handle.unsubscribe();
    assert!(!handle.is_active());
    assert!(registry.is_empty());

    run_all(deliveries);
    assert!(seen.lock().is_empty());
}

#[test]
fn unsubscribe_all_only_touches_exact_path() {
    // Goal: off() semantics remove every kind at one path and nothing elsewhere
    let registry = ListenerRegistry::new();
    for kind in [EventType::Value, EventType::ChildAdded, EventType::ChildRemoved] {
        let (_, callback) = recorder();
        registry.subscribe(path("resumes"), QueryShape::new(), kind, callback, None, None);
    }
    let (_, callback) = recorder();
    registry.subscribe(path("resumes/r1"), QueryShape::new(), EventType::Value, callback, None, None);

    assert_eq!(registry.unsubscribe_all(&path("resumes")), 3);
    assert_eq!(registry.unsubscribe_all(&path("resumes")), 0);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.clear(), 1);
    assert!(registry.is_empty());
}

#[test]
fn panicking_listener_reports_to_error_callback() {
    // Goal: a panic in one callback is isolated and surfaced as ListenerPanicked
    let registry = ListenerRegistry::new();
    let errors: Arc<Mutex<Vec<Error>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let on_error: Arc<ErrorFn> = Arc::new(move |error: Error| sink.lock().push(error));
    let callback: Arc<ListenerFn> = Arc::new(explode);

    let (_, deliveries) = registry.subscribe(
        path("resumes"),
        QueryShape::new(),
        EventType::Value,
        callback,
        Some(on_error),
        None,
    );
    run_all(deliveries);

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], Error::ListenerPanicked { path, .. } if path == "resumes"));
}

#[test]
fn dispatcher_requires_a_runtime() {
    // Goal: scheduling outside tokio is an explicit error, not a silent drop
    let registry = ListenerRegistry::new();
    let (_, callback) = recorder();
    let (_, deliveries) = registry.subscribe(path("a"), QueryShape::new(), EventType::Value, callback, None, None);

    let dispatcher = Dispatcher::new();
    assert!(matches!(dispatcher.schedule(deliveries), Err(Error::NoRuntime)));
    assert!(dispatcher.schedule(Vec::new()).is_ok());
}

#[tokio::test]
async fn dispatcher_delivers_in_order_off_the_calling_stack() {
    // Goal: deliveries run later on the worker, preserving scheduling order
    let registry = ListenerRegistry::new();
    let mut tree = PathTree::new();
    let (seen, callback) = recorder();
    let counter = path("counter");
    registry.subscribe(counter.clone(), QueryShape::new(), EventType::Value, callback, None, None);

    let dispatcher = Dispatcher::new();
    for n in 0..5 {
        tree.write(&counter, json!(n));
        dispatcher.schedule(registry.notify(&counter, |p| tree.get(p))).unwrap();
    }
    assert!(dispatcher.is_running());

    for _ in 0..50 {
        if seen.lock().len() == 5 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(*seen.lock(), vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
}

#[test]
fn dispatcher_starts_one_worker_per_runtime() {
    // Goal: each runtime gets its own worker, and a dropped runtime's worker is forgotten
    let build = || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    };
    let dispatcher = Dispatcher::new();
    let first = build();
    let second = build();

    first.block_on(async { dispatcher.queue().unwrap() });
    second.block_on(async {
        dispatcher.queue().unwrap();
        dispatcher.queue().unwrap();
    });
    assert_eq!(dispatcher.worker_count(), 2);

    drop(first);
    assert_eq!(dispatcher.worker_count(), 1);
    assert!(dispatcher.is_running());
}
