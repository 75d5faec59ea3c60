//! Signed-in user records

use crate::core::error::Result;
use serde::{Deserialize, Serialize};

/// User identifier as issued by the auth stub
pub type UserID = String;

/// A user as seen by client code, both from sign-in and under the `users` path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier
    pub uid: UserID,

    /// Display name for UI
    pub display_name: String,

    /// Anonymous sessions have no email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// True for users created through anonymous sign-in
    #[serde(default)]
    pub is_anonymous: bool,
}

impl User {
    /// Create an anonymous user record
    pub fn anonymous(uid: impl Into<UserID>, display_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            email: None,
            is_anonymous: true,
        }
    }

    /// Serialize for storage in the tree
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
