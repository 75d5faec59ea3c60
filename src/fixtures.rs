//! Built-in seed data.
//!
//! Two users and three resumes, of which the first user owns two, plus the
//! connection flag under `.info/connected`.

use crate::core::error::Result;
use crate::security::user::User;
use serde_json::{json, Map, Value};

/// Path of user records
pub const USERS_PATH: &str = "users";
/// Path of resume records
pub const RESUMES_PATH: &str = "resumes";
/// Path of the connection-state flag
pub const CONNECTED_PATH: &str = ".info/connected";

/// Uid handed out by anonymous sign-in
pub const ANONYMOUS_USER_1_UID: &str = "anonym123";
/// Display name handed out by anonymous sign-in
pub const ANONYMOUS_USER_1_NAME: &str = "Anonymous User 1";
/// Uid of the second seeded user
pub const ANONYMOUS_USER_2_UID: &str = "anonym456";
/// Display name of the second seeded user
pub const ANONYMOUS_USER_2_NAME: &str = "Anonymous User 2";

/// First demo resume, owned by user 1
pub const DEMO_STATE_RESUME_1_ID: &str = "demore1";
/// Second demo resume, owned by user 2
pub const DEMO_STATE_RESUME_2_ID: &str = "demore2";
/// Blank resume, owned by user 1
pub const INITIAL_STATE_RESUME_ID: &str = "initre";

/// The user returned by anonymous sign-in
pub fn anonymous_user_1() -> User {
    User::anonymous(ANONYMOUS_USER_1_UID, ANONYMOUS_USER_1_NAME)
}

/// The second seeded user
pub fn anonymous_user_2() -> User {
    User::anonymous(ANONYMOUS_USER_2_UID, ANONYMOUS_USER_2_NAME)
}

fn resume(id: &str, user: &str, name: &str, created_at: i64) -> Value {
    json!({
        "id": id,
        "user": user,
        "name": name,
        "preview": "",
        "createdAt": created_at,
        "updatedAt": created_at,
        "profile": {
            "firstName": "",
            "lastName": "",
            "subtitle": ""
        },
        "metadata": {
            "template": "onyx",
            "font": "Montserrat"
        }
    })
}

/// The three seeded resumes keyed by id
pub fn resumes() -> Map<String, Value> {
    let mut resumes = Map::new();
    resumes.insert(
        DEMO_STATE_RESUME_1_ID.to_string(),
        resume(DEMO_STATE_RESUME_1_ID, ANONYMOUS_USER_1_UID, "Demo Resume 1", 1_599_000_000_000),
    );
    resumes.insert(
        DEMO_STATE_RESUME_2_ID.to_string(),
        resume(DEMO_STATE_RESUME_2_ID, ANONYMOUS_USER_2_UID, "Demo Resume 2", 1_599_000_100_000),
    );
    resumes.insert(
        INITIAL_STATE_RESUME_ID.to_string(),
        resume(INITIAL_STATE_RESUME_ID, ANONYMOUS_USER_1_UID, "Initial Resume", 1_599_000_200_000),
    );
    resumes
}

/// The two seeded users keyed by uid, in their stored shape
pub fn users() -> Result<Map<String, Value>> {
    let mut users = Map::new();
    for user in [anonymous_user_1(), anonymous_user_2()] {
        users.insert(user.uid.clone(), user.to_value()?);
    }
    Ok(users)
}

/// Full seed tree
pub fn default_seed(connected: bool) -> Result<Value> {
    Ok(json!({
        USERS_PATH: users()?,
        RESUMES_PATH: resumes(),
        ".info": { "connected": connected }
    }))
}
