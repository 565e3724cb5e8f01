pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::model::account::Account;
use crate::model::events::AuditEvent;
use crate::model::policy::SecurityPolicy;
use crate::model::session::Session;
use crate::utils::errors::WardenError;

///
/// Collection and field names shared by the MongoDB implementation and the
/// schema set-up.
///
pub mod prelude {
    pub const ACCOUNTS: &str = "Accounts";
    pub const SESSIONS: &str = "Sessions";
    pub const AUDIT:    &str = "AuditEvents";
    pub const POLICIES: &str = "Policies";
    pub const CONFIG:   &str = "Config";

    pub const ACCOUNT_ID:            &str = "account_id";
    pub const EMAIL:                 &str = "email";
    pub const PHC:                   &str = "phc";
    pub const FAILED_LOGIN_ATTEMPTS: &str = "failed_login_attempts";
    pub const LAST_FAILED_LOGIN:     &str = "last_failed_login";
    pub const ACCOUNT_LOCKED:        &str = "account_locked";
    pub const LOCK_EXPIRES_AT:       &str = "lock_expires_at";
    pub const CHANGE_REQUIRED:       &str = "change_password_required";
    pub const MFA_REQUIRED:          &str = "mfa_required";
    pub const MFA_ENABLED:           &str = "mfa_enabled";
    pub const CHANGED_ON:            &str = "changed_on";
    pub const LAST_SUCCESS:          &str = "last_success";
    pub const RESET_CODE:            &str = "reset_code";
    pub const RESET_STARTED_AT:      &str = "reset_started_at";
    pub const SESSION_TOKEN:         &str = "session_token";
    pub const POLICY_ID:             &str = "policy_id";
    pub const CONFIG_ID:             &str = "config_id";
    pub const ACTIVE_POLICY_ID:      &str = "active_policy_id";
    pub const ACTIVATED_ON:          &str = "activated_on";
}

///
/// Everything the service needs from persistent storage.
///
/// The contract matters more than the backend: counter bumps are server-side
/// increments that report the post-increment value, and every lock or unlock
/// is a conditional update filtered on the current lock state, so exactly one
/// of any number of concurrent callers performs a given transition. Per
/// account that is all the serialisation the lockout machine needs; accounts
/// are independent of each other.
///
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn ping(&self) -> Result<(), WardenError>;

    /// Create indexes and seed the default policy and config documents.
    async fn ensure_schema(&self) -> Result<(), WardenError>;

    async fn load_account(&self, email: &str) -> Result<Option<Account>, WardenError>;

    async fn load_account_by_id(&self, account_id: &str) -> Result<Option<Account>, WardenError>;

    /// Fails with EmailInUse if the email is already registered.
    async fn insert_account(&self, account: &Account) -> Result<(), WardenError>;

    /// Atomically bump the failure counter, returning the post-increment
    /// count - the authoritative value for the threshold comparison.
    async fn record_failure(&self, account_id: &str, now: DateTime<Utc>) -> Result<u32, WardenError>;

    /// Lock the account unless it is already locked. Returns whether this
    /// call performed the transition.
    async fn try_lock(&self, account_id: &str, expires_at: Option<DateTime<Utc>>) -> Result<bool, WardenError>;

    /// Release a lock whose expiry has passed. Returns whether this call
    /// performed the transition.
    async fn try_auto_unlock(&self, account_id: &str, now: DateTime<Utc>) -> Result<bool, WardenError>;

    async fn record_success(&self, account_id: &str, now: DateTime<Utc>) -> Result<(), WardenError>;

    /// Clear all lockout state on a locked account. Returns false when the
    /// account was not locked (nothing to do).
    async fn clear_lockout(&self, account_id: &str) -> Result<bool, WardenError>;

    /// Store a new credential hash. Always returns the account to good
    /// standing: counters zeroed, lock released, any reset voided. When
    /// expected_phc is given the write only applies if the stored hash still
    /// matches it; false means the guard failed.
    async fn set_password(
        &self,
        account_id: &str,
        phc: &str,
        require_change: bool,
        expected_phc: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, WardenError>;

    async fn set_change_required(&self, account_id: &str) -> Result<(), WardenError>;

    async fn set_mfa(&self, account_id: &str, mfa_required: bool, mfa_enabled: bool) -> Result<(), WardenError>;

    async fn set_reset_code(&self, account_id: &str, reset_code: &str, now: DateTime<Utc>) -> Result<(), WardenError>;

    async fn create_session(&self, session: &Session) -> Result<(), WardenError>;

    async fn load_session(&self, session_token: &str) -> Result<Option<Session>, WardenError>;

    async fn delete_session(&self, session_token: &str) -> Result<(), WardenError>;

    /// Append-only. A failure here must surface to the caller.
    async fn append_audit(&self, event: &AuditEvent) -> Result<(), WardenError>;

    async fn load_policy(&self, policy_id: &str) -> Result<Option<SecurityPolicy>, WardenError>;

    async fn upsert_policy(&self, policy: &SecurityPolicy) -> Result<(), WardenError>;

    async fn load_active_policy(&self) -> Result<(SecurityPolicy, DateTime<Utc>), WardenError>;

    async fn set_active_policy(&self, policy_id: &str, now: DateTime<Utc>) -> Result<(), WardenError>;
}
