//! Core system types and foundations
//!
//! Error handling, configuration, logging and the emulator context that
//! ties the database and auth stub together.

pub mod error;
pub mod config;
pub mod logging;
pub mod app_state;

// Re-export commonly used items
pub use error::{Error, Result};
pub use config::Config;
pub use app_state::Emulator;
