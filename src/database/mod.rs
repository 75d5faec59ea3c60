//! The emulated realtime database.
//!
//! A [`Database`] owns the tree, the listener registry and the delivery
//! queue. Every mutation follows the same sequence: take the tree write lock,
//! apply the change, downgrade to a read lock, recompute affected
//! subscriptions, queue the deliveries, release. Holding the read lock while
//! queueing keeps deliveries in mutation order.

/// Path handles with reads, writes and subscriptions
pub mod reference;
/// Server value placeholders
pub mod server_value;

pub use reference::Reference;
pub use server_value::ServerValue;

use crate::core::error::{Error, Result};
use crate::events::registry::Subscription;
use crate::events::{self, Delivery, Dispatcher, ListenerRegistry};
use crate::storage::path_tree::PathTree;
use crate::system::Metrics;
use crate::types::{Path, PushIdGenerator};
use crate::{log_debug, log_info, time_operation};
use dashmap::DashMap;
use parking_lot::{RwLock, RwLockWriteGuard};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

struct DatabaseInner {
    uuid: Uuid,
    tree: RwLock<PathTree>,
    listeners: Arc<ListenerRegistry>,
    dispatcher: Dispatcher,
    reference_ids: DashMap<Path, Uuid>,
    push_ids: PushIdGenerator,
    initializations: AtomicU64,
}

/// Handle to one emulated database. Clones share the same data.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Create an empty database
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                uuid: Uuid::new_v4(),
                tree: RwLock::new(PathTree::new()),
                listeners: Arc::new(ListenerRegistry::new()),
                dispatcher: Dispatcher::new(),
                reference_ids: DashMap::new(),
                push_ids: PushIdGenerator::new(),
                initializations: AtomicU64::new(0),
            }),
        }
    }

    /// The process-wide database
    pub fn global() -> &'static Database {
        crate::core::app_state::Emulator::global().database()
    }

    /// Stable identifier of this database
    pub fn uuid(&self) -> Uuid {
        self.inner.uuid
    }

    /// Reference to `path`.
    ///
    /// Leading, trailing and repeated slashes are ignored. Fails with
    /// [`Error::InvalidPath`] when nothing is left. Repeated calls for the
    /// same path yield equal references with the same uuid and no query.
    pub fn reference(&self, path: &str) -> Result<Reference> {
        let path = Path::parse(path)?;
        Ok(self.reference_at(path))
    }

    pub(crate) fn reference_at(&self, path: Path) -> Reference {
        let uuid = *self
            .inner
            .reference_ids
            .entry(path.clone())
            .or_insert_with(Uuid::new_v4)
            .value();
        Reference::new(self.clone(), path, uuid)
    }

    /// Replace the whole tree with `seed`. Existing subscriptions survive and
    /// are notified.
    pub fn initialize(&self, seed: Value) -> Result<()> {
        if !seed.is_object() {
            return Err(Error::seed("seed root must be a JSON object"));
        }
        self.mutate("initialize", &Path::root(), |tree| tree.reset(seed))?;
        self.inner.initializations.fetch_add(1, Ordering::Relaxed);
        Metrics::global().store.initializations.inc();
        log_info!("Database {} initialized", self.inner.uuid);
        Ok(())
    }

    /// Replace the whole tree with the JSON object stored in `file`
    pub fn initialize_from_file(&self, file: impl AsRef<std::path::Path>) -> Result<()> {
        let file = file.as_ref();
        let content = std::fs::read_to_string(file)
            .map_err(|e| Error::seed(format!("failed to read {}: {}", file.display(), e)))?;
        let seed: Value = serde_json::from_str(&content)?;
        self.initialize(seed)
    }

    /// Number of successful [`Database::initialize`] calls
    pub fn initialization_count(&self) -> u64 {
        self.inner.initializations.load(Ordering::Relaxed)
    }

    /// Copy of the whole tree
    pub fn dump(&self) -> Value {
        self.inner
            .tree
            .read()
            .read(&Path::root())
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    pub(crate) fn listeners(&self) -> &Arc<ListenerRegistry> {
        &self.inner.listeners
    }

    pub(crate) fn read(&self, path: &Path) -> Option<Value> {
        self.inner.tree.read().read(path)
    }

    pub(crate) fn next_push_key(&self) -> String {
        self.inner.push_ids.generate(ServerValue::timestamp())
    }

    /// Apply `change` under the write lock, then recompute and queue events
    /// for every subscription overlapping `path`.
    ///
    /// When a subscription is watching `path` the delivery queue is resolved
    /// before the tree is touched, so a missing runtime fails the call with
    /// the tree and every subscription left as they were.
    pub(crate) fn mutate<F>(&self, op: &'static str, path: &Path, change: F) -> Result<()>
    where
        F: FnOnce(&mut PathTree),
    {
        let metrics = &Metrics::global().store;
        time_operation!(metrics.mutation_duration, {
            let mut tree = self.inner.tree.write();
            let queue = if self.inner.listeners.watches(path) {
                Some(self.inner.dispatcher.queue()?)
            } else {
                None
            };

            change(&mut tree);
            let tree = RwLockWriteGuard::downgrade(tree);
            metrics.mutations.with_label_values(&[op]).inc();

            // Registration needs the tree lock, so nothing new can be watching.
            if let Some(queue) = queue {
                let deliveries = self.inner.listeners.notify(path, |p| tree.get(p));
                log_debug!("{} at {} queued {} events", op, path, deliveries.len());
                events::enqueue(&queue, deliveries);
            }
            Ok(())
        })
    }

    /// Register a subscription against the current value at `path` and queue
    /// its initial events. The registration is rolled back when no runtime
    /// can deliver them.
    pub(crate) fn subscribe<F>(&self, path: &Path, register: F) -> Result<Arc<Subscription>>
    where
        F: FnOnce(&ListenerRegistry, Option<&Value>) -> (Arc<Subscription>, Vec<Delivery>),
    {
        let tree = self.inner.tree.read();
        let (subscription, deliveries) = register(&self.inner.listeners, tree.get(path));
        if let Err(error) = self.inner.dispatcher.schedule(deliveries) {
            self.inner.listeners.unsubscribe(&subscription);
            return Err(error);
        }
        Ok(subscription)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("uuid", &self.inner.uuid)
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}
