pub mod config;
pub mod context;
pub mod errors;
pub mod health;
pub mod time_provider;

#[cfg(feature = "kafka")]
pub mod kafka;

use uuid::Uuid;

///
/// Generate a unique identifier - account ids, session tokens, event ids.
///
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
