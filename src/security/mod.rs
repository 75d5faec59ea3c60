//! Authentication stub

/// Anonymous sign-in and state observers
pub mod auth;
/// User records
pub mod user;

pub use auth::{Auth, AuthErrorFn, AuthObserverFn, AuthObserverHandle};
pub use user::{User, UserID};
