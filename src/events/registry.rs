//! Listener registry.
//!
//! Subscriptions are grouped by the exact path they were registered at, each
//! carrying its own query shape and event kind. On every mutation the
//! registry recomputes the payload of each subscription whose path overlaps
//! the mutated path and returns the resulting deliveries; the caller hands
//! them to the [`Dispatcher`](crate::events::Dispatcher).
//!
//! Child events diff the filtered children set against the set remembered
//! from the previous computation, so a child that stops matching the filter
//! is reported as removed even though it still exists in the tree.

use crate::core::error::Error;
use crate::events::dispatcher::Delivery;
use crate::query::{filter, QueryShape};
use crate::system::Metrics;
use crate::types::{DataSnapshot, EventType, Path};
use crate::log_debug;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Identifier of one subscription
pub type SubscriptionId = u64;

/// Closure type for event listeners
pub type ListenerFn = dyn Fn(DataSnapshot) + Send + Sync;

/// Closure type for listener error callbacks
pub type ErrorFn = dyn Fn(Error) + Send + Sync;

/// A live registration of (path, shape, kind, callback)
pub struct Subscription {
    id: SubscriptionId,
    path: Path,
    shape: QueryShape,
    kind: EventType,
    callback: Arc<ListenerFn>,
    on_error: Option<Arc<ErrorFn>>,
    active: AtomicBool,
    /// Filtered children as of the last computation (child events only)
    last_children: Mutex<Map<String, Value>>,
}

impl Subscription {
    /// Subscription id
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Path the subscription was registered at
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Query shape captured at registration
    pub fn shape(&self) -> &QueryShape {
        &self.shape
    }

    /// Event kind
    pub fn kind(&self) -> EventType {
        self.kind
    }

    /// False once unsubscribed
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn callback(&self) -> Arc<ListenerFn> {
        Arc::clone(&self.callback)
    }

    pub(crate) fn error_callback(&self) -> Option<Arc<ErrorFn>> {
        self.on_error.clone()
    }

    /// Mark cancelled; returns true if this call did the cancelling
    fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    /// Payloads for the initial delivery after registration
    fn initial(&self, current: Option<&Value>) -> Vec<DataSnapshot> {
        match self.kind {
            EventType::Value => vec![self.value_snapshot(current)],
            EventType::ChildAdded => self
                .last_children
                .lock()
                .iter()
                .map(|(key, child)| self.child_snapshot(key, child))
                .collect(),
            EventType::ChildRemoved | EventType::ChildChanged => Vec::new(),
        }
    }

    /// Payloads after a mutation, given the current value at the path
    fn recompute(&self, current: Option<&Value>) -> Vec<DataSnapshot> {
        if self.kind == EventType::Value {
            return vec![self.value_snapshot(current)];
        }

        let next = filter::children(current, &self.shape);
        let previous = std::mem::replace(&mut *self.last_children.lock(), next.clone());

        match self.kind {
            EventType::ChildRemoved => previous
                .iter()
                .filter(|(key, _)| !next.contains_key(key.as_str()))
                .map(|(key, old)| self.child_snapshot(key, old))
                .collect(),
            EventType::ChildAdded => next
                .iter()
                .filter(|(key, _)| !previous.contains_key(key.as_str()))
                .map(|(key, new)| self.child_snapshot(key, new))
                .collect(),
            EventType::ChildChanged => next
                .iter()
                .filter(|(key, new)| previous.get(key.as_str()).is_some_and(|old| old != *new))
                .map(|(key, new)| self.child_snapshot(key, new))
                .collect(),
            EventType::Value => Vec::new(),
        }
    }

    fn value_snapshot(&self, current: Option<&Value>) -> DataSnapshot {
        DataSnapshot::new(self.path.clone(), filter::apply(current.cloned(), &self.shape))
    }

    fn child_snapshot(&self, key: &str, value: &Value) -> DataSnapshot {
        DataSnapshot::new(self.path.join(key), Some(value.clone()))
    }
}

/// Registry of every live subscription on one database
pub struct ListenerRegistry {
    subscriptions: Mutex<HashMap<Path, Vec<Arc<Subscription>>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a subscription against the current value at `path`.
    ///
    /// Registration takes effect immediately. The returned deliveries are the
    /// initial events (`value` once, `child_added` per matching child) and
    /// must be scheduled, never invoked in-line.
    pub fn subscribe(
        &self,
        path: Path,
        shape: QueryShape,
        kind: EventType,
        callback: Arc<ListenerFn>,
        on_error: Option<Arc<ErrorFn>>,
        current: Option<&Value>,
    ) -> (Arc<Subscription>, Vec<Delivery>) {
        let last_children = if kind.is_child_event() {
            filter::children(current, &shape)
        } else {
            Map::new()
        };

        let subscription = Arc::new(Subscription {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            path: path.clone(),
            shape,
            kind,
            callback,
            on_error,
            active: AtomicBool::new(true),
            last_children: Mutex::new(last_children),
        });

        self.subscriptions
            .lock()
            .entry(path)
            .or_default()
            .push(Arc::clone(&subscription));
        Metrics::global().listeners.active_subscriptions.inc();

        log_debug!(
            "Subscribed {} #{} at {}",
            subscription.kind,
            subscription.id,
            subscription.path
        );

        let deliveries = subscription
            .initial(current)
            .into_iter()
            .map(|snapshot| Delivery::new(Arc::clone(&subscription), snapshot))
            .collect();
        (subscription, deliveries)
    }

    /// Recompute every subscription affected by a mutation at `mutated`.
    ///
    /// `read` returns the current value at a subscription path. Deliveries
    /// come back in registration order.
    pub fn notify<'a, F>(&self, mutated: &Path, read: F) -> Vec<Delivery>
    where
        F: Fn(&Path) -> Option<&'a Value>,
    {
        let mut affected: Vec<Arc<Subscription>> = {
            let subscriptions = self.subscriptions.lock();
            subscriptions
                .iter()
                .filter(|(path, _)| path.overlaps(mutated))
                .flat_map(|(_, list)| list.iter().cloned())
                .collect()
        };
        affected.sort_by_key(|subscription| subscription.id);

        let mut deliveries = Vec::new();
        for subscription in affected {
            let current = read(&subscription.path);
            for snapshot in subscription.recompute(current) {
                deliveries.push(Delivery::new(Arc::clone(&subscription), snapshot));
            }
        }
        deliveries
    }

    /// True when a mutation at `path` would recompute some subscription
    pub fn watches(&self, path: &Path) -> bool {
        self.subscriptions.lock().keys().any(|p| p.overlaps(path))
    }

    /// Remove one subscription. Safe to call repeatedly.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        if !subscription.deactivate() {
            return false;
        }
        let mut subscriptions = self.subscriptions.lock();
        if let Some(list) = subscriptions.get_mut(&subscription.path) {
            list.retain(|s| s.id != subscription.id);
            if list.is_empty() {
                subscriptions.remove(&subscription.path);
            }
        }
        Metrics::global().listeners.active_subscriptions.dec();
        log_debug!("Unsubscribed #{} at {}", subscription.id, subscription.path);
        true
    }

    /// Remove every subscription registered at exactly `path`, any shape
    /// and any kind. Returns how many were removed.
    pub fn unsubscribe_all(&self, path: &Path) -> usize {
        let removed = self.subscriptions.lock().remove(path).unwrap_or_default();
        let count = removed.iter().filter(|s| s.deactivate()).count();
        Metrics::global()
            .listeners
            .active_subscriptions
            .sub(count as i64);
        log_debug!("Removed {} listeners at {}", count, path);
        count
    }

    /// Remove every subscription
    pub fn clear(&self) -> usize {
        let drained: Vec<Arc<Subscription>> = self
            .subscriptions
            .lock()
            .drain()
            .flat_map(|(_, list)| list)
            .collect();
        let count = drained.iter().filter(|s| s.deactivate()).count();
        Metrics::global()
            .listeners
            .active_subscriptions
            .sub(count as i64);
        count
    }

    /// Number of live subscriptions at exactly `path`
    pub fn count_at(&self, path: &Path) -> usize {
        self.subscriptions.lock().get(path).map_or(0, Vec::len)
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.subscriptions.lock().values().map(Vec::len).sum()
    }

    /// True when nothing is subscribed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `on`, used to cancel that one subscription
#[derive(Clone)]
pub struct ListenerHandle {
    subscription: Arc<Subscription>,
    registry: Weak<ListenerRegistry>,
}

impl ListenerHandle {
    pub(crate) fn new(subscription: Arc<Subscription>, registry: &Arc<ListenerRegistry>) -> Self {
        Self {
            subscription,
            registry: Arc::downgrade(registry),
        }
    }

    /// Subscription id
    pub fn id(&self) -> SubscriptionId {
        self.subscription.id
    }

    /// Event kind this handle listens for
    pub fn kind(&self) -> EventType {
        self.subscription.kind
    }

    /// False once cancelled, individually or via `off`
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Cancel this subscription only. Idempotent; takes effect before the
    /// next delivery tick.
    pub fn unsubscribe(&self) {
        match self.registry.upgrade() {
            Some(registry) => {
                registry.unsubscribe(&self.subscription);
            }
            None => {
                self.subscription.deactivate();
            }
        }
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.subscription.id)
            .field("path", &self.subscription.path.to_string())
            .field("kind", &self.subscription.kind)
            .field("active", &self.is_active())
            .finish()
    }
}
