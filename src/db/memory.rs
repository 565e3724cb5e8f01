use std::collections::HashMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use crate::db::AccountStore;
use crate::model::account::Account;
use crate::model::events::AuditEvent;
use crate::model::policy::SecurityPolicy;
use crate::model::session::Session;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// An in-process store with the same atomic contract as MongoDB - every
/// mutation happens under the store mutex, so read-modify-write sequences
/// are serialised per call. Selected with STORAGE=memory; the test suites run
/// the whole service against it.
///
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    email_index: HashMap<String, String>,
    sessions: HashMap<String, Session>,
    audit: Vec<AuditEvent>,
    policies: HashMap<String, SecurityPolicy>,
    active_policy_id: String,
    activated_on: Option<DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore { inner: Mutex::new(Inner::default()) }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {

    async fn ping(&self) -> Result<(), WardenError> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), WardenError> {
        let mut inner = self.inner.lock();
        let default = SecurityPolicy::default();

        inner.policies.entry(default.policy_id.clone()).or_insert_with(|| default.clone());

        if inner.active_policy_id.is_empty() {
            inner.active_policy_id = default.policy_id;
            inner.activated_on = Some(Utc::now());
        }

        Ok(())
    }

    async fn load_account(&self, email: &str) -> Result<Option<Account>, WardenError> {
        let inner = self.inner.lock();
        Ok(inner.email_index.get(email).and_then(|id| inner.accounts.get(id)).cloned())
    }

    async fn load_account_by_id(&self, account_id: &str) -> Result<Option<Account>, WardenError> {
        Ok(self.inner.lock().accounts.get(account_id).cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), WardenError> {
        let mut inner = self.inner.lock();

        if inner.email_index.contains_key(&account.email) {
            return Err(ErrorCode::EmailInUse.with_msg("an account with that email already exists"))
        }

        inner.email_index.insert(account.email.clone(), account.account_id.clone());
        inner.accounts.insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn record_failure(&self, account_id: &str, now: DateTime<Utc>) -> Result<u32, WardenError> {
        let mut inner = self.inner.lock();

        let account = inner.accounts.get_mut(account_id)
            .ok_or_else(|| ErrorCode::AccountNotFound.with_msg("the account no longer exists"))?;

        account.failed_login_attempts += 1;
        account.last_failed_login = Some(now.into());
        Ok(account.failed_login_attempts)
    }

    async fn try_lock(&self, account_id: &str, expires_at: Option<DateTime<Utc>>) -> Result<bool, WardenError> {
        let mut inner = self.inner.lock();

        match inner.accounts.get_mut(account_id) {
            Some(account) if !account.account_locked => {
                account.account_locked = true;
                account.lock_expires_at = expires_at.map(bson::DateTime::from_chrono);
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    async fn try_auto_unlock(&self, account_id: &str, now: DateTime<Utc>) -> Result<bool, WardenError> {
        let mut inner = self.inner.lock();

        match inner.accounts.get_mut(account_id) {
            Some(account) if account.account_locked && account.lock_expired(now) => {
                account.account_locked = false;
                account.lock_expires_at = None;
                account.failed_login_attempts = 0;
                account.last_failed_login = None;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    async fn record_success(&self, account_id: &str, now: DateTime<Utc>) -> Result<(), WardenError> {
        if let Some(account) = self.inner.lock().accounts.get_mut(account_id) {
            account.failed_login_attempts = 0;
            account.last_failed_login = None;
            account.last_success = Some(now.into());
        }
        Ok(())
    }

    async fn clear_lockout(&self, account_id: &str) -> Result<bool, WardenError> {
        let mut inner = self.inner.lock();

        match inner.accounts.get_mut(account_id) {
            Some(account) if account.account_locked => {
                account.account_locked = false;
                account.lock_expires_at = None;
                account.failed_login_attempts = 0;
                account.last_failed_login = None;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    async fn set_password(
        &self,
        account_id: &str,
        phc: &str,
        require_change: bool,
        expected_phc: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, WardenError> {

        let mut inner = self.inner.lock();

        let account = match inner.accounts.get_mut(account_id) {
            Some(account) => account,
            None => return Ok(false),
        };

        if let Some(expected) = expected_phc {
            if account.phc != expected {
                return Ok(false)
            }
        }

        account.phc = phc.to_string();
        account.changed_on = bson::DateTime::from_chrono(now);
        account.change_password_required = require_change;
        account.failed_login_attempts = 0;
        account.last_failed_login = None;
        account.account_locked = false;
        account.lock_expires_at = None;
        account.reset_code = None;
        account.reset_started_at = None;
        Ok(true)
    }

    async fn set_change_required(&self, account_id: &str) -> Result<(), WardenError> {
        if let Some(account) = self.inner.lock().accounts.get_mut(account_id) {
            account.change_password_required = true;
        }
        Ok(())
    }

    async fn set_mfa(&self, account_id: &str, mfa_required: bool, mfa_enabled: bool) -> Result<(), WardenError> {
        if let Some(account) = self.inner.lock().accounts.get_mut(account_id) {
            account.mfa_required = mfa_required;
            account.mfa_enabled = mfa_enabled;
        }
        Ok(())
    }

    async fn set_reset_code(&self, account_id: &str, reset_code: &str, now: DateTime<Utc>) -> Result<(), WardenError> {
        if let Some(account) = self.inner.lock().accounts.get_mut(account_id) {
            account.reset_code = Some(reset_code.to_string());
            account.reset_started_at = Some(now.into());
        }
        Ok(())
    }

    async fn create_session(&self, session: &Session) -> Result<(), WardenError> {
        self.inner.lock().sessions.insert(session.session_token.clone(), session.clone());
        Ok(())
    }

    async fn load_session(&self, session_token: &str) -> Result<Option<Session>, WardenError> {
        Ok(self.inner.lock().sessions.get(session_token).cloned())
    }

    async fn delete_session(&self, session_token: &str) -> Result<(), WardenError> {
        self.inner.lock().sessions.remove(session_token);
        Ok(())
    }

    async fn append_audit(&self, event: &AuditEvent) -> Result<(), WardenError> {
        self.inner.lock().audit.push(event.clone());
        Ok(())
    }

    async fn load_policy(&self, policy_id: &str) -> Result<Option<SecurityPolicy>, WardenError> {
        Ok(self.inner.lock().policies.get(policy_id).cloned())
    }

    async fn upsert_policy(&self, policy: &SecurityPolicy) -> Result<(), WardenError> {
        self.inner.lock().policies.insert(policy.policy_id.clone(), policy.clone());
        Ok(())
    }

    async fn load_active_policy(&self) -> Result<(SecurityPolicy, DateTime<Utc>), WardenError> {
        let inner = self.inner.lock();

        let activated_on = inner.activated_on
            .ok_or_else(|| ErrorCode::ConfigDocumentNotFound.with_msg("The config document was not found"))?;

        match inner.policies.get(&inner.active_policy_id) {
            Some(policy) => Ok((policy.clone(), activated_on)),
            None => Err(ErrorCode::ActivePolicyNotFound
                .with_msg(&format!("The configured active policy '{}' was not found", inner.active_policy_id))),
        }
    }

    async fn set_active_policy(&self, policy_id: &str, now: DateTime<Utc>) -> Result<(), WardenError> {
        let mut inner = self.inner.lock();
        inner.active_policy_id = policy_id.to_string();
        inner.activated_on = Some(now);
        Ok(())
    }
}
