//! Global constants used throughout the Massive Stub codebase
//!
//! This module contains compile-time constants that are shared across
//! multiple modules to ensure consistency and avoid magic numbers.

/// Path separator for store paths
pub const PATH_SEPARATOR: char = '/';

/// Character set used for push keys
///
/// Ordered by ASCII value so that lexicographic ordering of generated keys
/// matches their generation order.
pub const PUSH_CHARS: &[u8] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Number of leading push key characters encoding the timestamp
pub const PUSH_TIMESTAMP_LENGTH: usize = 8;

/// Number of trailing push key characters carrying randomness
pub const PUSH_RANDOM_LENGTH: usize = 12;

/// Default config file looked up by the CLI
pub const DEFAULT_CONFIG_FILE: &str = "massive-stub.toml";

/// Environment variable prefix for config overrides
pub const ENV_PREFIX: &str = "MS_";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";
