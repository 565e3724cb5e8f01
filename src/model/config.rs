use chrono::Utc;
use serde::{Deserialize, Serialize};

///
/// The config singleton document - points at the active security policy.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub config_id: String,
    pub active_policy_id: String,
    pub activated_on: bson::DateTime,
}

pub const SINGLETON: &str = "SINGLETON";

impl Default for Config {
    fn default() -> Self {
        Config {
            config_id: SINGLETON.to_string(),
            active_policy_id: "DEFAULT".to_string(),
            activated_on: bson::DateTime::from_chrono(Utc::now()),
        }
    }
}
