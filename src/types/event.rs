//! Event kinds surfaced to subscribers

use crate::core::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of change a subscription listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Whole (filtered) value at the path
    Value,
    /// A child entered the (filtered) children set
    ChildAdded,
    /// A child left the (filtered) children set
    ChildRemoved,
    /// A child stayed in the set but its value changed
    ChildChanged,
}

impl EventType {
    /// Wire name of this event kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Value => "value",
            EventType::ChildAdded => "child_added",
            EventType::ChildRemoved => "child_removed",
            EventType::ChildChanged => "child_changed",
        }
    }

    /// True for the child_* kinds
    pub fn is_child_event(&self) -> bool {
        !matches!(self, EventType::Value)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(EventType::Value),
            "child_added" => Ok(EventType::ChildAdded),
            "child_removed" => Ok(EventType::ChildRemoved),
            "child_changed" => Ok(EventType::ChildChanged),
            other => Err(Error::config(format!("Unknown event type: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in [
            EventType::Value,
            EventType::ChildAdded,
            EventType::ChildRemoved,
            EventType::ChildChanged,
        ] {
            assert_eq!(kind.as_str().parse::<EventType>().unwrap(), kind);
        }
        assert!("child_moved".parse::<EventType>().is_err());
    }
}
