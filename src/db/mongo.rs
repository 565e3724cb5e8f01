use std::fs;
use chrono::{DateTime, Utc};
use async_trait::async_trait;
use tracing::{debug, info};
use mongodb::error::ErrorKind;
use mongodb::{Client, Database, IndexModel};
use mongodb::bson::{self, doc, Document};
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, IndexOptions, ReplaceOptions, ReturnDocument, UpdateOptions};
use crate::db::{prelude::*, AccountStore};
use crate::model::account::Account;
use crate::model::config::{self, Config};
use crate::model::events::AuditEvent;
use crate::model::policy::SecurityPolicy;
use crate::model::session::Session;
use crate::utils::config::Configuration;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// The production store - account security records as documents, with every
/// lockout mutation pushed down to the server as an atomic operator so
/// concurrent logins against one account serialise in MongoDB, not here.
///
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(app_name: &str, config: &Configuration) -> Result<Self, WardenError> {

        let uri = match &config.mongo_credentials {
            Some(filename) => {
                debug!("Loading MongoDB credentials from secrets file {}", filename);

                // Read username and password from a secrets file.
                let credentials = fs::read_to_string(filename)
                    .map_err(|err| ErrorCode::UnableToReadCredentials
                        .with_msg(&format!("Unable to read credentials from {}: {}", filename, err)))?;
                let mut credentials = credentials.lines();
                let uri = config.mongo_uri.replace("$USERNAME", credentials.next().unwrap_or_default());
                uri.replace("$PASSWORD", credentials.next().unwrap_or_default())
            },
            None => config.mongo_uri.clone(),
        };

        let mut client_options = ClientOptions::parse(&uri).await?;
        client_options.app_name = Some(app_name.to_string());

        let client = Client::with_options(client_options)?;

        info!("Connecting to MongoDB...");

        let db = client.database(&config.db_name);
        db.run_command(doc! { "ping": 1 }, None).await?;

        info!("Connected to MongoDB");
        Ok(MongoStore { db })
    }

    fn accounts(&self) -> mongodb::Collection<Account> {
        self.db.collection(ACCOUNTS)
    }

    fn account_docs(&self) -> mongodb::Collection<Document> {
        self.db.collection(ACCOUNTS)
    }

    async fn create_init_indexes(&self) -> Result<(), WardenError> {
        let unique = |name: &str| IndexOptions::builder()
            .unique(true)
            .name(name.to_string())
            .build();

        self.accounts().create_index(
            IndexModel::builder().keys(doc!{ ACCOUNT_ID: 1 }).options(unique("idx_account_id")).build(), None).await?;
        self.accounts().create_index(
            IndexModel::builder().keys(doc!{ EMAIL: 1 }).options(unique("idx_email")).build(), None).await?;
        self.db.collection::<Session>(SESSIONS).create_index(
            IndexModel::builder().keys(doc!{ SESSION_TOKEN: 1 }).options(unique("idx_session_token")).build(), None).await?;
        self.db.collection::<SecurityPolicy>(POLICIES).create_index(
            IndexModel::builder().keys(doc!{ POLICY_ID: 1 }).options(unique("idx_policy_id")).build(), None).await?;
        self.db.collection::<Config>(CONFIG).create_index(
            IndexModel::builder().keys(doc!{ CONFIG_ID: 1 }).options(unique("idx_config_id")).build(), None).await?;

        Ok(())
    }

    ///
    /// Create a policy with an id of DEFAULT - unless one already exists.
    ///
    async fn create_default_policy(&self) -> Result<(), WardenError> {
        match self.db.collection::<SecurityPolicy>(POLICIES).insert_one(SecurityPolicy::default(), None).await {
            Ok(_) => Ok(()),
            Err(err) => {
                match is_duplicate_err(&err) {
                    true  => Ok(()),
                    false => Err(WardenError::from(err)),
                }
            },
        }
    }

    ///
    /// Create the default config document IF IT DOESN'T EXIST.
    ///
    async fn create_default_config(&self) -> Result<(), WardenError> {
        let _ignored = self.db.collection::<Config>(CONFIG).insert_one(Config::default(), None).await;
        Ok(())
    }
}

///
/// Indicates if the MongoDB error is from a duplicate key violation.
///
pub fn is_duplicate_err(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we)) => we.code == 11000, /* Duplicate insert */
        _ => false,
    }
}

fn upsert() -> UpdateOptions {
    UpdateOptions::builder().upsert(true).build()
}

#[async_trait]
impl AccountStore for MongoStore {

    async fn ping(&self) -> Result<(), WardenError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), WardenError> {
        self.create_init_indexes().await?;
        self.create_default_policy().await?;
        self.create_default_config().await?;
        Ok(())
    }

    async fn load_account(&self, email: &str) -> Result<Option<Account>, WardenError> {
        Ok(self.accounts().find_one(doc!{ EMAIL: email }, None).await?)
    }

    async fn load_account_by_id(&self, account_id: &str) -> Result<Option<Account>, WardenError> {
        Ok(self.accounts().find_one(doc!{ ACCOUNT_ID: account_id }, None).await?)
    }

    async fn insert_account(&self, account: &Account) -> Result<(), WardenError> {
        match self.accounts().insert_one(account, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_err(&err) =>
                Err(ErrorCode::EmailInUse.with_msg("an account with that email already exists")),
            Err(err) => Err(WardenError::from(err)),
        }
    }

    async fn record_failure(&self, account_id: &str, now: DateTime<Utc>) -> Result<u32, WardenError> {
        let update = doc!{
            "$inc": { FAILED_LOGIN_ATTEMPTS: 1 },
            "$set": { LAST_FAILED_LOGIN: bson::DateTime::from_chrono(now) },
        };

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        match self.accounts().find_one_and_update(doc!{ ACCOUNT_ID: account_id }, update, options).await? {
            Some(account) => Ok(account.failed_login_attempts),
            None => Err(ErrorCode::AccountNotFound.with_msg("the account no longer exists")),
        }
    }

    async fn try_lock(&self, account_id: &str, expires_at: Option<DateTime<Utc>>) -> Result<bool, WardenError> {
        // Filtering on the unlocked state means exactly one concurrent caller
        // performs the transition.
        let filter = doc!{ ACCOUNT_ID: account_id, ACCOUNT_LOCKED: false };

        let update = match expires_at {
            Some(expires_at) => doc!{
                "$set": {
                    ACCOUNT_LOCKED: true,
                    LOCK_EXPIRES_AT: bson::DateTime::from_chrono(expires_at),
                },
            },
            None => doc!{
                "$set": { ACCOUNT_LOCKED: true },
                "$unset": { LOCK_EXPIRES_AT: "" },
            },
        };

        let result = self.account_docs().update_one(filter, update, None).await?;
        Ok(result.modified_count == 1)
    }

    async fn try_auto_unlock(&self, account_id: &str, now: DateTime<Utc>) -> Result<bool, WardenError> {
        // An indefinite lock has no expiry field, so the $lte can never match it.
        let filter = doc!{
            ACCOUNT_ID: account_id,
            ACCOUNT_LOCKED: true,
            LOCK_EXPIRES_AT: { "$lte": bson::DateTime::from_chrono(now) },
        };

        let update = doc!{
            "$set": { ACCOUNT_LOCKED: false, FAILED_LOGIN_ATTEMPTS: 0 },
            "$unset": { LOCK_EXPIRES_AT: "", LAST_FAILED_LOGIN: "" },
        };

        let result = self.account_docs().update_one(filter, update, None).await?;
        Ok(result.modified_count == 1)
    }

    async fn record_success(&self, account_id: &str, now: DateTime<Utc>) -> Result<(), WardenError> {
        let update = doc!{
            "$set": {
                FAILED_LOGIN_ATTEMPTS: 0,
                LAST_SUCCESS: bson::DateTime::from_chrono(now),
            },
            "$unset": { LAST_FAILED_LOGIN: "" },
        };

        self.account_docs().update_one(doc!{ ACCOUNT_ID: account_id }, update, None).await?;
        Ok(())
    }

    async fn clear_lockout(&self, account_id: &str) -> Result<bool, WardenError> {
        let filter = doc!{ ACCOUNT_ID: account_id, ACCOUNT_LOCKED: true };

        let update = doc!{
            "$set": { ACCOUNT_LOCKED: false, FAILED_LOGIN_ATTEMPTS: 0 },
            "$unset": { LOCK_EXPIRES_AT: "", LAST_FAILED_LOGIN: "" },
        };

        let result = self.account_docs().update_one(filter, update, None).await?;
        Ok(result.modified_count == 1)
    }

    async fn set_password(
        &self,
        account_id: &str,
        phc: &str,
        require_change: bool,
        expected_phc: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, WardenError> {

        let mut filter = doc!{ ACCOUNT_ID: account_id };
        if let Some(expected) = expected_phc {
            filter.insert(PHC, expected);
        }

        // A new credential always restores good standing.
        let update = doc!{
            "$set": {
                PHC: phc,
                CHANGED_ON: bson::DateTime::from_chrono(now),
                CHANGE_REQUIRED: require_change,
                FAILED_LOGIN_ATTEMPTS: 0,
                ACCOUNT_LOCKED: false,
            },
            "$unset": {
                LOCK_EXPIRES_AT: "",
                LAST_FAILED_LOGIN: "",
                RESET_CODE: "",
                RESET_STARTED_AT: "",
            },
        };

        let result = self.account_docs().update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }

    async fn set_change_required(&self, account_id: &str) -> Result<(), WardenError> {
        let update = doc!{ "$set": { CHANGE_REQUIRED: true } };
        self.account_docs().update_one(doc!{ ACCOUNT_ID: account_id }, update, None).await?;
        Ok(())
    }

    async fn set_mfa(&self, account_id: &str, mfa_required: bool, mfa_enabled: bool) -> Result<(), WardenError> {
        let update = doc!{ "$set": { MFA_REQUIRED: mfa_required, MFA_ENABLED: mfa_enabled } };
        self.account_docs().update_one(doc!{ ACCOUNT_ID: account_id }, update, None).await?;
        Ok(())
    }

    async fn set_reset_code(&self, account_id: &str, reset_code: &str, now: DateTime<Utc>) -> Result<(), WardenError> {
        let update = doc!{
            "$set": {
                RESET_CODE: reset_code,
                RESET_STARTED_AT: bson::DateTime::from_chrono(now),
            },
        };

        self.account_docs().update_one(doc!{ ACCOUNT_ID: account_id }, update, None).await?;
        Ok(())
    }

    async fn create_session(&self, session: &Session) -> Result<(), WardenError> {
        self.db.collection::<Session>(SESSIONS).insert_one(session, None).await?;
        Ok(())
    }

    async fn load_session(&self, session_token: &str) -> Result<Option<Session>, WardenError> {
        Ok(self.db.collection::<Session>(SESSIONS).find_one(doc!{ SESSION_TOKEN: session_token }, None).await?)
    }

    async fn delete_session(&self, session_token: &str) -> Result<(), WardenError> {
        self.db.collection::<Session>(SESSIONS).delete_one(doc!{ SESSION_TOKEN: session_token }, None).await?;
        Ok(())
    }

    async fn append_audit(&self, event: &AuditEvent) -> Result<(), WardenError> {
        self.db.collection::<AuditEvent>(AUDIT).insert_one(event, None).await?;
        Ok(())
    }

    async fn load_policy(&self, policy_id: &str) -> Result<Option<SecurityPolicy>, WardenError> {
        Ok(self.db.collection::<SecurityPolicy>(POLICIES).find_one(doc!{ POLICY_ID: policy_id }, None).await?)
    }

    async fn upsert_policy(&self, policy: &SecurityPolicy) -> Result<(), WardenError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.db.collection::<SecurityPolicy>(POLICIES)
            .replace_one(doc!{ POLICY_ID: &policy.policy_id }, policy, options)
            .await?;
        Ok(())
    }

    ///
    /// Using the config singleton document, load and return the active policy.
    ///
    async fn load_active_policy(&self) -> Result<(SecurityPolicy, DateTime<Utc>), WardenError> {
        let config = match self.db.collection::<Config>(CONFIG).find_one(doc!{ CONFIG_ID: config::SINGLETON }, None).await? {
            Some(config) => config,
            None => return Err(ErrorCode::ConfigDocumentNotFound.with_msg("The config document was not found")),
        };

        match self.load_policy(&config.active_policy_id).await? {
            Some(policy) => Ok((policy, config.activated_on.to_chrono())),
            None => Err(ErrorCode::ActivePolicyNotFound
                .with_msg(&format!("The configured active policy '{}' was not found", config.active_policy_id))),
        }
    }

    async fn set_active_policy(&self, policy_id: &str, now: DateTime<Utc>) -> Result<(), WardenError> {
        let update = doc!{
            "$set": {
                ACTIVE_POLICY_ID: policy_id,
                ACTIVATED_ON: bson::DateTime::from_chrono(now),
            },
        };

        self.db.collection::<Document>(CONFIG)
            .update_one(doc!{ CONFIG_ID: config::SINGLETON }, update, upsert())
            .await?;
        Ok(())
    }
}
