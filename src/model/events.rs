use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use crate::model::account::{Account, Role};

///
/// Everything the audit trail distinguishes. The display tags are the stable
/// identifiers that appear in logs, the audit store and topic payloads.
///
#[derive(Clone, Copy, Debug, Deserialize, Display, Serialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditKind {
    #[display(fmt = "REGISTERED")]
    Registered,
    #[display(fmt = "LOGIN_SUCCEEDED")]
    LoginSucceeded,
    #[display(fmt = "LOGIN_FAILED")]
    LoginFailed,
    #[display(fmt = "LOGIN_REJECTED_LOCKED")]
    LoginRejectedLocked,
    #[display(fmt = "ACCOUNT_LOCKED")]
    AccountLocked,
    #[display(fmt = "ACCOUNT_UNLOCKED")]
    AccountUnlocked,
    #[display(fmt = "EMERGENCY_UNLOCK")]
    EmergencyUnlock,
    #[display(fmt = "PASSWORD_CHANGED")]
    PasswordChanged,
    #[display(fmt = "PASSWORD_RESET_STARTED")]
    PasswordResetStarted,
    #[display(fmt = "PASSWORD_RESET_COMPLETED")]
    PasswordResetCompleted,
    #[display(fmt = "FORCED_PASSWORD_CHANGE")]
    ForcedPasswordChange,
    #[display(fmt = "MFA_UPDATED")]
    MfaUpdated,
    #[display(fmt = "ACCESS_DENIED")]
    AccessDenied,
    #[display(fmt = "POLICY_ACTIVATED")]
    PolicyActivated,
}

impl AuditKind {
    ///
    /// The notification topic a transition of this kind publishes on.
    ///
    pub fn topic(&self) -> &'static str {
        match self {
            AuditKind::Registered             => "warden.account.registered",
            AuditKind::LoginSucceeded         => "warden.account.login.succeeded",
            AuditKind::LoginFailed            => "warden.account.login.failed",
            AuditKind::LoginRejectedLocked    => "warden.account.login.rejected",
            AuditKind::AccountLocked          => "warden.account.locked",
            AuditKind::AccountUnlocked        => "warden.account.unlocked",
            AuditKind::EmergencyUnlock        => "warden.account.emergency.unlock",
            AuditKind::PasswordChanged        => "warden.account.password.changed",
            AuditKind::PasswordResetStarted   => "warden.account.password.reset.started",
            AuditKind::PasswordResetCompleted => "warden.account.password.reset.completed",
            AuditKind::ForcedPasswordChange   => "warden.account.password.change.forced",
            AuditKind::MfaUpdated             => "warden.account.mfa.updated",
            AuditKind::AccessDenied           => "warden.account.access.denied",
            // The bare activation notice peers consume goes out separately on
            // warden.policy.activated - this is the audit record.
            AuditKind::PolicyActivated        => "warden.audit.policy.activated",
        }
    }
}

///
/// An immutable record of a security-relevant state transition.
///
/// Events are appended to the store before the operation that caused them is
/// reported as complete; a failed append surfaces rather than being dropped.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub kind: AuditKind,
    pub occurred_at: bson::DateTime,
    pub account_id: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub actor: String,
    pub reason: Option<String>,
}

impl AuditEvent {
    pub fn new(kind: AuditKind, occurred_at: DateTime<Utc>) -> Self {
        AuditEvent {
            event_id: crate::utils::generate_id(),
            kind,
            occurred_at: bson::DateTime::from_chrono(occurred_at),
            account_id: None,
            email: None,
            role: None,
            actor: "system".to_string(),
            reason: None,
        }
    }

    pub fn for_account(mut self, account: &Account) -> Self {
        self.account_id = Some(account.account_id.clone());
        self.email = Some(account.email.clone());
        self.role = Some(account.role);
        self
    }

    pub fn for_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn by_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    pub fn because(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }
}
