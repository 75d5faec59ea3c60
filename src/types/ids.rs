//! Chronologically ordered keys for `push`.
//!
//! A push key is 20 characters: 8 encoding the millisecond timestamp and 12
//! random characters. Keys generated within the same millisecond reuse the
//! previous random tail incremented by one, so keys always sort in
//! generation order.

use crate::constants::{PUSH_CHARS, PUSH_RANDOM_LENGTH, PUSH_TIMESTAMP_LENGTH};
use parking_lot::Mutex;
use rand::{rng, Rng};

/// Generator state shared by every push on one database
pub struct PushIdGenerator {
    state: Mutex<PushState>,
}

struct PushState {
    last_timestamp: i64,
    last_random: [u8; PUSH_RANDOM_LENGTH],
}

impl PushIdGenerator {
    /// Create a new generator
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PushState {
                last_timestamp: i64::MIN,
                last_random: [0; PUSH_RANDOM_LENGTH],
            }),
        }
    }

    /// Generate a key for the given millisecond timestamp
    pub fn generate(&self, timestamp_ms: i64) -> String {
        let mut state = self.state.lock();

        if timestamp_ms == state.last_timestamp {
            // Same millisecond: increment the random tail, carrying leftwards
            for digit in state.last_random.iter_mut().rev() {
                if (*digit as usize) < PUSH_CHARS.len() - 1 {
                    *digit += 1;
                    break;
                }
                *digit = 0;
            }
        } else {
            let mut rng = rng();
            for digit in state.last_random.iter_mut() {
                *digit = rng.random_range(0..PUSH_CHARS.len()) as u8;
            }
            state.last_timestamp = timestamp_ms;
        }

        let mut key = Vec::with_capacity(PUSH_TIMESTAMP_LENGTH + PUSH_RANDOM_LENGTH);
        let mut remaining = timestamp_ms.max(0) as u64;
        let mut time_chars = [0u8; PUSH_TIMESTAMP_LENGTH];
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        key.extend_from_slice(&time_chars);
        key.extend(state.last_random.iter().map(|&d| PUSH_CHARS[d as usize]));

        // PUSH_CHARS is ASCII
        String::from_utf8(key).unwrap_or_default()
    }
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
