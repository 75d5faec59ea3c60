//! Type definitions shared across the emulator

/// Normalized store paths
pub mod path;
/// Event kinds delivered to subscribers
pub mod event;
/// Immutable read results
pub mod snapshot;
/// Push key generation
pub mod ids;

pub use event::EventType;
pub use ids::PushIdGenerator;
pub use path::Path;
pub use snapshot::DataSnapshot;
