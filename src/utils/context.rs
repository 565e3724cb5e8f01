use std::sync::Arc;
use serde_json::Value;
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, lock_api::RwLockReadGuard};
use crate::db::AccountStore;
use crate::model::events::AuditEvent;
use crate::model::policy::{ActivePolicy, SecurityPolicy};
use crate::utils::{config::Configuration, errors::{ErrorCode, WardenError}, time_provider::TimeProvider};

#[cfg(feature = "kafka")]
use rdkafka::producer::FutureProducer;

///
/// The context is available to all gRPC service endpoints and gives them
/// access to the store, the active policy, the clock and notifications.
/// Nothing security-relevant is reachable any other way - no ambient
/// singletons.
///
pub struct ServiceContext {
    store: Arc<dyn AccountStore>,
    config: Configuration,
    active_policy: RwLock<ActivePolicy>,
    time_provider: RwLock<TimeProvider>,

    #[cfg(feature = "kafka")]
    producer: FutureProducer,
}

impl ServiceContext {
    pub fn new(config: Configuration, store: Arc<dyn AccountStore>, active_policy: ActivePolicy) -> Self {
        ServiceContext {
            store,
            config: config.clone(),
            active_policy: RwLock::new(active_policy),
            time_provider: RwLock::new(TimeProvider::default()),

            #[cfg(feature = "kafka")]
            producer: crate::utils::kafka::producer::producer(&config),
        }
    }

    pub fn store(&self) -> &dyn AccountStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time_provider.read().now()
    }

    ///
    /// Set or clear the fixed time.
    ///
    pub fn set_now(&self, now: Option<DateTime<Utc>>) {
        self.time_provider.write().fix(now);
    }

    ///
    /// Returns the active security policy with a read-lock guard.
    ///
    pub fn active_policy(&self) -> RwLockReadGuard<'_, parking_lot::RawRwLock, ActivePolicy> {
        self.active_policy.read()
    }

    ///
    /// A clone of the active policy - requests take a snapshot rather than
    /// hold the read lock over their io.
    ///
    pub fn policy_snapshot(&self) -> SecurityPolicy {
        self.active_policy.read().policy.clone()
    }

    ///
    /// Update the current, in-memory active security policy.
    ///
    pub fn apply_policy(&self, policy: SecurityPolicy, activated_on: DateTime<Utc>) {
        let mut lock = self.active_policy.write();
        *lock = ActivePolicy { policy, activated_on };
    }

    ///
    /// Durably record a security transition, then fan it out.
    ///
    /// The state change this event describes has already committed - a failed
    /// append surfaces as AuditWriteFailed so it can be alerted on, it never
    /// rolls the state change back.
    ///
    pub async fn audit(&self, event: AuditEvent) -> Result<(), WardenError> {
        tracing::info!("Audit {}: account={:?} actor={} reason={:?}",
            event.kind, event.account_id, event.actor, event.reason);

        if let Err(err) = self.store.append_audit(&event).await {
            return Err(ErrorCode::AuditWriteFailed
                .with_msg(&format!("The audit write for {} failed: {}", event.kind, err.message())))
        }

        self.send(event.kind.topic(), serde_json::to_value(&event)?, 1).await?;
        Ok(())
    }

    #[allow(unused_variables)]
    pub async fn send(&self, topic: &str, payload: Value, version: u8) -> Result<(), WardenError> {
        #[cfg(feature = "kafka")]
        crate::utils::kafka::producer::send(
            &self.producer,
            &self.config,
            topic,
            &payload.to_string(),
            version).await?;

        Ok(())
    }
}
