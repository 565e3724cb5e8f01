use bcrypt::BcryptError;
use mongodb::bson;
use tokio::task::JoinError;
use tonic::{Code, Status};
use bson::document::ValueAccessError;

#[cfg(feature = "kafka")]
use rdkafka::{error::KafkaError, message::OwnedMessage};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ErrorCode {
    TonicStartError                 = 0400,
    HashThreadingIssue              = 0401,
    UnableToReadCredentials         = 0500,
    ConfigDocumentNotFound          = 0501,
    ActivePolicyNotFound            = 0502,
    MongoDBError                    = 0503,
    InvalidBSON                     = 0504,
    InvalidJSON                     = 0505,
    KafkaSendError                  = 0506,
    BSONFieldNotFound               = 0507,
    InvalidAlgorithmConfig          = 0508,
    HashingError                    = 0509,
    InvalidPHCFormat                = 0510,
    UnknownAlgorithmVariant         = 0511,
    AuditWriteFailed                = 0512,
    StorageConflict                 = 0513,
    IOError                         = 0514,
    PolicyMandatory                 = 1000,
    PolicyNotFound                  = 1001,
    InvalidPolicy                   = 1002,
    PasswordContainsBannedPhrase    = 2001,
    PasswordTooShort                = 2002,
    PasswordTooLong                 = 2003,
    NotEnoughLetters                = 2005,
    NotEnoughNumbers                = 2007,
    NotEnoughSymbols                = 2009,
    NotMixedCase                    = 2011,
    AccountNotFound                 = 2101,
    AccountLocked                   = 2102,
    InvalidCredentials              = 2103,
    ChangePasswordRequired          = 2104,
    MfaSetupRequired                = 2105,
    RoleForbidden                   = 2106,
    SessionNotFound                 = 2107,
    EmailInUse                      = 2108,
    InvalidRole                     = 2109,
    NoResetCode                     = 2200,
    ResetCodeMismatch               = 2201,
    ResetWindowExpired              = 2202,
    SelfServiceResetDisabled        = 2203,
    NoActionNeeded                  = 2300,
}

impl ErrorCode {
    pub fn with_msg(&self, message: &str) -> WardenError {
        WardenError::new(*self, message)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WardenError {
    error_code: ErrorCode,
    message: String,
}

impl WardenError {
    pub fn new(error_code: ErrorCode, message: &str) -> Self {
        WardenError { error_code, message: message.to_string() }
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<tonic::transport::Error> for WardenError {
    fn from(error: tonic::transport::Error) -> Self {
        ErrorCode::TonicStartError.with_msg(&format!("Failed to start gRPC server: {}", error))
    }
}

impl From<argon2::Error> for WardenError {
    fn from(error: argon2::Error) -> Self {
        ErrorCode::InvalidAlgorithmConfig.with_msg(&format!("Invalid configuration for algorithm: {}", error))
    }
}

impl From<password_hash::Error> for WardenError {
    fn from(error: password_hash::Error) -> Self {
        ErrorCode::HashingError.with_msg(&format!("Unable to hash password: {}", error))
    }
}

impl From<BcryptError> for WardenError {
    fn from(error: BcryptError) -> Self {
        ErrorCode::HashingError.with_msg(&format!("Unable to hash password: {}", error))
    }
}

impl From<serde_json::Error> for WardenError {
    fn from(error: serde_json::Error) -> Self {
        ErrorCode::InvalidJSON.with_msg(&format!("Unable to convert to json: {}", error))
    }
}

impl From<mongodb::error::Error> for WardenError {
    fn from(error: mongodb::error::Error) -> Self {
        ErrorCode::MongoDBError.with_msg(&format!("MongoDB error: {}", error))
    }
}

impl From<ValueAccessError> for WardenError {
    fn from(error: ValueAccessError) -> Self {
        ErrorCode::BSONFieldNotFound.with_msg(&format!("Unable to read BSON: {}", error))
    }
}

impl From<bson::ser::Error> for WardenError {
    fn from(error: bson::ser::Error) -> Self {
        ErrorCode::InvalidBSON.with_msg(&format!("Unable to serialise BSON: {}", error))
    }
}

impl From<bson::de::Error> for WardenError {
    fn from(error: bson::de::Error) -> Self {
        ErrorCode::InvalidBSON.with_msg(&format!("Unable to deserialise BSON: {}", error))
    }
}

impl From<JoinError> for WardenError {
    fn from(error: JoinError) -> Self {
        ErrorCode::HashThreadingIssue.with_msg(&format!("Unable to hash: {}", error))
    }
}

#[cfg(feature = "kafka")]
impl From<(KafkaError, OwnedMessage)> for WardenError {
    fn from((error, message): (KafkaError, OwnedMessage)) -> Self {
        ErrorCode::KafkaSendError.with_msg(&format!("Kafka error: {}, message: {:?}", error, message))
    }
}

///
/// Convert our internal error into a gRPC status response.
///
impl From<WardenError> for Status {
    fn from(error: WardenError) -> Self {
        use ErrorCode::*;

        let code = match &error.error_code {
            ActivePolicyNotFound    |
            AuditWriteFailed        |
            BSONFieldNotFound       |
            ConfigDocumentNotFound  |
            HashThreadingIssue      |
            HashingError            |
            IOError                 |
            InvalidAlgorithmConfig  |
            InvalidBSON             |
            InvalidJSON             |
            InvalidPHCFormat        |
            KafkaSendError          |
            MongoDBError            |
            TonicStartError         |
            UnableToReadCredentials |
            UnknownAlgorithmVariant => Code::Internal,

            StorageConflict => Code::Unavailable,

            AccountNotFound |
            PolicyNotFound  => Code::NotFound,

            InvalidPolicy                 |
            InvalidRole                   |
            NotEnoughLetters              |
            NotEnoughNumbers              |
            NotEnoughSymbols              |
            NotMixedCase                  |
            PasswordContainsBannedPhrase  |
            PasswordTooLong               |
            PasswordTooShort              |
            PolicyMandatory => Code::InvalidArgument,

            AccountLocked      |
            InvalidCredentials |
            NoResetCode        |
            ResetCodeMismatch  |
            SessionNotFound => Code::Unauthenticated,

            ResetWindowExpired => Code::DeadlineExceeded,

            RoleForbidden            |
            SelfServiceResetDisabled => Code::PermissionDenied,

            ChangePasswordRequired |
            MfaSetupRequired       |
            NoActionNeeded => Code::FailedPrecondition,

            EmailInUse => Code::AlreadyExists,
        };

        Status::with_details(code, error.message, format!("{}", error.error_code as u32).into())
    }
}
