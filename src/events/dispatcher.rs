//! Deferred event delivery.
//!
//! Deliveries computed during a mutation are pushed onto a `flume` channel
//! and drained by a single worker task, so callbacks never run inside the
//! mutating call and always run in scheduling order. There is one worker per
//! tokio runtime that schedules work, keyed by runtime id, so an idle or
//! dropped runtime never holds deliveries scheduled from another one. Order
//! is guaranteed among deliveries scheduled from the same runtime.

use crate::core::error::{Error, Result};
use crate::events::registry::Subscription;
use crate::system::Metrics;
use crate::types::DataSnapshot;
use crate::{log_debug, log_warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// One event bound for one subscription
pub struct Delivery {
    subscription: Arc<Subscription>,
    snapshot: DataSnapshot,
}

impl Delivery {
    /// Pair a snapshot with the subscription it is addressed to
    pub(crate) fn new(subscription: Arc<Subscription>, snapshot: DataSnapshot) -> Self {
        Self { subscription, snapshot }
    }

    /// Snapshot carried by this delivery
    pub fn snapshot(&self) -> &DataSnapshot {
        &self.snapshot
    }

    /// Invoke the callback, isolating panics.
    ///
    /// Cancelled subscriptions are skipped. A panicking callback is reported
    /// to the subscription's error callback when it has one.
    pub(crate) fn deliver(self) {
        let metrics = &Metrics::global().listeners;
        let subscription = self.subscription;

        if !subscription.is_active() {
            metrics.events_dropped.inc();
            return;
        }

        let callback = subscription.callback();
        let outcome = catch_unwind(AssertUnwindSafe(|| callback(self.snapshot)));
        match outcome {
            Ok(()) => metrics.events_delivered.inc(),
            Err(_) => {
                metrics.listener_panics.inc();
                log_warn!(
                    "Listener {} for {} at {} panicked",
                    subscription.id(),
                    subscription.kind(),
                    subscription.path()
                );
                if let Some(on_error) = subscription.error_callback() {
                    let error = Error::ListenerPanicked {
                        event: subscription.kind().to_string(),
                        path: subscription.path().to_string(),
                    };
                    let _ = catch_unwind(AssertUnwindSafe(|| on_error(error)));
                }
            }
        }
    }
}

/// Sending side of the worker that runs on one runtime
pub type Queue = flume::Sender<Delivery>;

/// Per-runtime delivery workers
pub struct Dispatcher {
    workers: Mutex<HashMap<tokio::runtime::Id, Queue>>,
}

impl Dispatcher {
    /// Create a dispatcher; no worker is started until the first schedule
    pub fn new() -> Self {
        Self {
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Queue of the worker on the current runtime, starting one if needed.
    ///
    /// Fails with [`Error::NoRuntime`] outside a tokio runtime. Workers of
    /// runtimes that have been dropped are forgotten here.
    pub fn queue(&self) -> Result<Queue> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let mut workers = self.workers.lock();
        workers.retain(|_, tx| !tx.is_disconnected());

        let tx = workers
            .entry(handle.id())
            .or_insert_with(|| start_worker(&handle));
        Ok(tx.clone())
    }

    /// Queue deliveries on the current runtime's worker.
    ///
    /// Fails with [`Error::NoRuntime`] outside a tokio runtime, unless there
    /// is nothing to deliver.
    pub fn schedule(&self, deliveries: Vec<Delivery>) -> Result<()> {
        if deliveries.is_empty() {
            return Ok(());
        }
        let queue = self.queue()?;
        enqueue(&queue, deliveries);
        Ok(())
    }

    /// Number of workers whose runtime is still alive
    pub fn worker_count(&self) -> usize {
        self.workers
            .lock()
            .values()
            .filter(|tx| !tx.is_disconnected())
            .count()
    }

    /// True while at least one worker is reachable
    pub fn is_running(&self) -> bool {
        self.worker_count() > 0
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Push deliveries onto a worker queue obtained from [`Dispatcher::queue`].
///
/// Deliveries are dropped with a warning if the worker's runtime shut down
/// in between.
pub fn enqueue(queue: &Queue, deliveries: Vec<Delivery>) {
    let total = deliveries.len();
    for (sent, delivery) in deliveries.into_iter().enumerate() {
        if queue.send(delivery).is_err() {
            let lost = total - sent;
            Metrics::global().listeners.events_dropped.inc_by(lost as u64);
            log_warn!("Dispatcher worker stopped, dropped {} deliveries", lost);
            return;
        }
    }
}

fn start_worker(handle: &tokio::runtime::Handle) -> Queue {
    let (tx, rx) = flume::unbounded::<Delivery>();

    handle.spawn(async move {
        while let Ok(delivery) = rx.recv_async().await {
            delivery.deliver();
        }
    });

    Metrics::global().listeners.dispatcher_starts.inc();
    log_debug!("Dispatcher worker started on runtime {}", handle.id());
    tx
}
