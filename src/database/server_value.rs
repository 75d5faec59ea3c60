//! Server-side value placeholders

use chrono::Utc;

/// Values the real service would fill in on write
pub struct ServerValue;

impl ServerValue {
    /// Current wall-clock time in milliseconds since the epoch, evaluated
    /// when called
    pub fn timestamp() -> i64 {
        Utc::now().timestamp_millis()
    }
}
