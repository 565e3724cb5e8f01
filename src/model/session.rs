use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

///
/// An authenticated session. Logout deletes it; introspection loads it.
///
/// A lock applied while a session is live does not invalidate the session -
/// the guard only re-evaluates remediation and role gates on each check.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    pub session_token: String,
    pub account_id: String,
    pub logged_in_at: bson::DateTime,
}

impl Session {
    pub fn new(session_token: String, account_id: &str, now: DateTime<Utc>) -> Self {
        Session {
            session_token,
            account_id: account_id.to_string(),
            logged_in_at: bson::DateTime::from_chrono(now),
        }
    }
}
