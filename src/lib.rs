//! Massive Stub - an in-process realtime database and auth emulator
//!
//! Massive Stub lets client code run against a fake backend without network
//! access. It keeps a hierarchical JSON tree addressed by slash-separated
//! paths, serves point-in-time reads and live subscriptions with a
//! single-field equality query, and offers an anonymous-only auth stub.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;
pub mod constants;
pub mod types;

// Main functional modules
pub mod storage;
pub mod query;
pub mod events;
pub mod database;
pub mod security;
pub mod fixtures;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{Config, Emulator, Error, Result};
pub use database::{Database, Reference, ServerValue};
pub use events::ListenerHandle;
pub use query::QueryShape;
pub use security::{Auth, User};
pub use types::{DataSnapshot, EventType, Path};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging and metrics for the emulator
pub fn init(config: &Config) -> Result<()> {
    config.validate()?;
    crate::core::logging::init_logging(&config.logging);

    tracing::info!("Initializing {} v{}", NAME, VERSION);

    system::metrics::init_registry();

    Ok(())
}
