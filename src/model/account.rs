use std::str::FromStr;
use derive_more::Display;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::grpc::warden as api;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// The portal roles. Only used here for audit context, the superadmin unlock
/// path and the access guard - authorisation beyond that lives with the web
/// tier.
///
#[derive(Clone, Copy, Debug, Deserialize, Display, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display(fmt = "patient")]
    Patient,
    #[display(fmt = "provider")]
    Provider,
    #[display(fmt = "admin")]
    Admin,
    #[display(fmt = "superadmin")]
    SuperAdmin,
}

impl FromStr for Role {
    type Err = WardenError;

    fn from_str(input: &str) -> Result<Role, Self::Err> {
        match input {
            "patient"    => Ok(Role::Patient),
            "provider"   => Ok(Role::Provider),
            "admin"      => Ok(Role::Admin),
            "superadmin" => Ok(Role::SuperAdmin),
            _ => Err(ErrorCode::InvalidRole.with_msg(&format!("'{}' is not a recognised role", input))),
        }
    }
}

///
/// The account security record - one per portal user.
///
/// The plaintext credential is never stored, only the PHC string produced by
/// the active policy's hashing algorithm.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Account {
    pub account_id: String,
    pub email: String,
    pub phc: String,
    pub role: Role,
    pub failed_login_attempts: u32,
    pub last_failed_login: Option<bson::DateTime>,
    pub account_locked: bool,
    pub lock_expires_at: Option<bson::DateTime>,
    pub change_password_required: bool,
    pub mfa_required: bool,
    pub mfa_enabled: bool,
    pub created_on: bson::DateTime,
    pub changed_on: bson::DateTime,
    pub last_success: Option<bson::DateTime>,
    pub reset_code: Option<String>,
    pub reset_started_at: Option<bson::DateTime>,
}

impl Account {
    ///
    /// A freshly-provisioned record: unlocked, counters at zero.
    ///
    pub fn new(account_id: String, email: String, phc: String, role: Role, now: DateTime<Utc>) -> Self {
        Account {
            account_id,
            email,
            phc,
            role,
            failed_login_attempts: 0,
            last_failed_login: None,
            account_locked: false,
            lock_expires_at: None,
            change_password_required: false,
            mfa_required: false,
            mfa_enabled: false,
            created_on: bson::DateTime::from_chrono(now),
            changed_on: bson::DateTime::from_chrono(now),
            last_success: None,
            reset_code: None,
            reset_started_at: None,
        }
    }

    ///
    /// A lock with an expiry in the past is eligible for lazy auto-unlock on
    /// the next evaluation. Indefinite locks (no expiry) never qualify.
    ///
    pub fn lock_expired(&self, now: DateTime<Utc>) -> bool {
        match self.lock_expires_at {
            Some(expires_at) => now >= expires_at.to_chrono(),
            None => false,
        }
    }
}

impl From<&Account> for api::Account {
    fn from(account: &Account) -> Self {
        api::Account {
            account_id: account.account_id.clone(),
            email: account.email.clone(),
            role: account.role.to_string(),
            change_password_required: account.change_password_required,
            mfa_required: account.mfa_required,
            mfa_enabled: account.mfa_enabled,
        }
    }
}
