//! Change notification: subscription bookkeeping and deferred delivery

/// Deferred delivery queue
pub mod dispatcher;
/// Subscription registry and per-event recompute
pub mod registry;

pub use dispatcher::{enqueue, Delivery, Dispatcher, Queue};
pub use registry::{ErrorFn, ListenerFn, ListenerHandle, ListenerRegistry, SubscriptionId};

#[cfg(test)]
mod tests;
