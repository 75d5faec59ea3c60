//! Path references.
//!
//! A [`Reference`] is a cheap value combining a database, a normalized path
//! and an optional equality query. Query builders consume and return the
//! reference, so a query never leaks into later `reference(path)` calls.

use crate::core::error::Result;
use crate::database::Database;
use crate::events::{ErrorFn, ListenerHandle, ListenerFn};
use crate::query::{filter, QueryShape};
use crate::system::Metrics;
use crate::types::{DataSnapshot, EventType, Path};
use crate::log_debug;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Handle to one location in a [`Database`]
#[derive(Clone)]
pub struct Reference {
    database: Database,
    path: Path,
    uuid: Uuid,
    shape: QueryShape,
}

impl Reference {
    pub(crate) fn new(database: Database, path: Path, uuid: Uuid) -> Self {
        Self {
            database,
            path,
            uuid,
            shape: QueryShape::new(),
        }
    }

    /// Identifier shared by every reference to this path
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Normalized path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last path segment
    pub fn key(&self) -> Option<&str> {
        self.path.key()
    }

    /// Database this reference points into
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Reference to the parent location, `None` for top-level paths
    pub fn parent(&self) -> Option<Reference> {
        self.path
            .parent()
            .filter(|parent| !parent.is_root())
            .map(|parent| self.database.reference_at(parent))
    }

    /// Reference to a descendant
    pub fn child(&self, relative: &str) -> Reference {
        self.database.reference_at(self.path.join(relative))
    }

    /// Filter children on `field`. Calling it again replaces the field.
    pub fn order_by_child(mut self, field: impl Into<String>) -> Self {
        self.shape.set_order_by_child(field);
        self
    }

    /// Keep children whose filter field equals `value`. Calling it again
    /// replaces the value.
    pub fn equal_to(mut self, value: impl Into<Value>) -> Self {
        self.shape.set_equal_to(value.into());
        self
    }

    /// Query carried by this reference
    pub fn query_shape(&self) -> &QueryShape {
        &self.shape
    }

    /// Read the current filtered value once
    pub async fn once(&self, kind: EventType) -> DataSnapshot {
        Metrics::global()
            .store
            .reads
            .with_label_values(&[kind.as_str()])
            .inc();
        let snapshot = DataSnapshot::new(
            self.path.clone(),
            filter::apply(self.database.read(&self.path), &self.shape),
        );
        tokio::task::yield_now().await;
        snapshot
    }

    /// Subscribe to `kind` events at this path under this reference's query
    pub fn on<F>(&self, kind: EventType, callback: F) -> Result<ListenerHandle>
    where
        F: Fn(DataSnapshot) + Send + Sync + 'static,
    {
        self.subscribe(kind, Arc::new(callback), None)
    }

    /// Like [`Reference::on`], with a callback for delivery failures.
    ///
    /// A panicking `callback` has run up to the panic when `on_error`
    /// receives [`Error::ListenerPanicked`](crate::core::error::Error::ListenerPanicked).
    pub fn on_with_error<F, E>(&self, kind: EventType, callback: F, on_error: E) -> Result<ListenerHandle>
    where
        F: Fn(DataSnapshot) + Send + Sync + 'static,
        E: Fn(crate::core::error::Error) + Send + Sync + 'static,
    {
        self.subscribe(kind, Arc::new(callback), Some(Arc::new(on_error)))
    }

    fn subscribe(
        &self,
        kind: EventType,
        callback: Arc<ListenerFn>,
        on_error: Option<Arc<ErrorFn>>,
    ) -> Result<ListenerHandle> {
        let subscription = self.database.subscribe(&self.path, |registry, current| {
            registry.subscribe(
                self.path.clone(),
                self.shape.clone(),
                kind,
                callback,
                on_error,
                current,
            )
        })?;
        Ok(ListenerHandle::new(subscription, self.database.listeners()))
    }

    /// Remove every listener registered at this path, whatever its query or
    /// event kind
    pub fn off(&self) -> usize {
        self.database.listeners().unsubscribe_all(&self.path)
    }

    /// Replace the value at this path. Null removes it.
    pub async fn set(&self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.database
            .mutate("set", &self.path, |tree| tree.write(&self.path, value))?;
        tokio::task::yield_now().await;
        Ok(())
    }

    /// Merge the fields of `partial` into the value at this path.
    ///
    /// Field names may be relative paths and null fields remove. A
    /// non-object `partial` replaces the value.
    pub async fn update(&self, partial: impl Into<Value>) -> Result<()> {
        let partial = partial.into();
        self.database
            .mutate("update", &self.path, |tree| tree.merge(&self.path, partial))?;
        tokio::task::yield_now().await;
        Ok(())
    }

    /// Remove the value at this path
    pub async fn remove(&self) -> Result<()> {
        self.database.mutate("remove", &self.path, |tree| {
            tree.delete(&self.path);
        })?;
        tokio::task::yield_now().await;
        Ok(())
    }

    /// Write `value` under a new chronologically ordered child key and
    /// return the child's reference
    pub async fn push(&self, value: impl Into<Value>) -> Result<Reference> {
        let child = self.child(&self.database.next_push_key());
        let value = value.into();
        log_debug!("Push to {}", child.path);
        self.database
            .mutate("push", &child.path, |tree| tree.write(&child.path, value))?;
        tokio::task::yield_now().await;
        Ok(child)
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.database.uuid() == other.database.uuid() && self.path == other.path
    }
}

impl Eq for Reference {}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("path", &self.path.to_string())
            .field("uuid", &self.uuid)
            .field("shape", &self.shape)
            .finish()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path)
    }
}
