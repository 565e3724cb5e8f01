use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::grpc::admin as api;
use crate::model::lockout::LockoutPolicy;
use crate::model::algorithm::{Algorithm, argon::ArgonPolicy, bcrypt::BcryptPolicy, pbkdf2::Pbkdf2Policy};
use crate::utils::errors::{ErrorCode, WardenError};

///
/// The security policy: lockout thresholds, credential complexity rules, the
/// self-service reset window and the hashing algorithm configuration.
///
/// Policies are persisted documents; exactly one is active at a time and a
/// snapshot of it is taken per request.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SecurityPolicy {
    pub policy_id: String,
    pub created_on: bson::DateTime,
    pub max_failures: u32,
    pub lockout_seconds: u32,
    pub min_length: u32,
    pub max_length: u32,
    pub min_letters: u32,
    pub min_numbers: u32,
    pub min_symbols: u32,
    pub mixed_case_required: bool,
    pub prohibited_phrases: Vec<String>,
    pub reset_timeout_seconds: u32,
    pub algorithm_type: Algorithm,
    pub argon_policy: Option<ArgonPolicy>,
    pub bcrypt_policy: Option<BcryptPolicy>,
    pub pbkdf2_policy: Option<Pbkdf2Policy>,
}

///
/// The currently-active policy plus when it was activated, held in memory
/// behind a read-write lock on the service context.
///
#[derive(Clone, Debug)]
pub struct ActivePolicy {
    pub policy: SecurityPolicy,
    pub activated_on: DateTime<Utc>,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        SecurityPolicy {
            policy_id: String::from("DEFAULT"),
            created_on: bson::DateTime::from_chrono(Utc::now()),
            max_failures: 5,
            lockout_seconds: 30 * 60,
            min_length: 8,
            max_length: 128,
            min_letters: 1,
            min_numbers: 1,
            min_symbols: 1,
            mixed_case_required: true,
            prohibited_phrases: vec!(
                "password".to_string(),
                "qwerty".to_string()),
            reset_timeout_seconds: 15 * 60,
            algorithm_type: Algorithm::Argon,
            argon_policy: Some(ArgonPolicy::default()),
            bcrypt_policy: None,
            pbkdf2_policy: None,
        }
    }
}

impl SecurityPolicy {
    pub fn lockout(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_failures: self.max_failures,
            lockout_seconds: self.lockout_seconds,
        }
    }

    ///
    /// Check the plain text password doesn't violate this policy's format.
    ///
    pub fn validate_pattern(&self, plain_text_password: &str) -> Result<(), WardenError> {

        for phrase in &self.prohibited_phrases {
            if plain_text_password.to_lowercase().contains(phrase.as_str()) {
                return Err(ErrorCode::PasswordContainsBannedPhrase
                    .with_msg(&format!("the phrase '{}' is not allowed", phrase)))
            }
        }

        if plain_text_password.len() < self.min_length as usize {
            return Err(ErrorCode::PasswordTooShort
                .with_msg(&format!("passwords must be at least {} characters", self.min_length)))
        }

        if plain_text_password.len() > self.max_length as usize {
            return Err(ErrorCode::PasswordTooLong
                .with_msg(&format!("passwords may not be more than {} characters", self.max_length)))
        }

        let letters = plain_text_password
            .chars()
            .filter(|c| c.is_alphabetic())
            .count();

        if letters < self.min_letters as usize {
            return Err(ErrorCode::NotEnoughLetters
                .with_msg(&format!("a password must contain at least {} letters", self.min_letters)))
        }

        let numbers = plain_text_password
            .chars()
            .filter(|c| c.is_numeric())
            .count();

        if numbers < self.min_numbers as usize {
            return Err(ErrorCode::NotEnoughNumbers
                .with_msg(&format!("a password must contain at least {} numbers", self.min_numbers)))
        }

        let symbols = plain_text_password
            .chars()
            .filter(|c| !c.is_alphanumeric())
            .count();

        if symbols < self.min_symbols as usize {
            return Err(ErrorCode::NotEnoughSymbols
                .with_msg(&format!("a password must contain at least {} symbols", self.min_symbols)))
        }

        if self.mixed_case_required {
            if !plain_text_password.chars().any(|c| c.is_lowercase())
                || !plain_text_password.chars().any(|c| c.is_uppercase()) {

                return Err(ErrorCode::NotMixedCase
                    .with_msg("a password must contain a mixture of upper and lower case"))
            }
        }

        Ok(())
    }

    ///
    /// Use the configured algorithm to hash the password into a PHC string.
    ///
    /// ref: https://github.com/P-H-C/phc-string-format/blob/master/phc-sf-spec.md
    ///
    pub fn hash_into_phc(&self, plain_text_password: &str) -> Result<String, WardenError> {
        match self.algorithm_type {
            Algorithm::Argon => self.argon_policy
                .as_ref()
                .ok_or_else(|| ErrorCode::InvalidPolicy.with_msg("the policy has no argon section"))?
                .hash_into_phc(plain_text_password),
            Algorithm::BCrypt => self.bcrypt_policy
                .as_ref()
                .ok_or_else(|| ErrorCode::InvalidPolicy.with_msg("the policy has no bcrypt section"))?
                .hash_into_phc(plain_text_password),
            Algorithm::PBKDF2 => self.pbkdf2_policy
                .as_ref()
                .ok_or_else(|| ErrorCode::InvalidPolicy.with_msg("the policy has no pbkdf2 section"))?
                .hash_into_phc(plain_text_password),
        }
    }

    ///
    /// Build a persistable policy from the admin API representation.
    ///
    pub fn from_api(policy: api::Policy, policy_id: String, created_on: DateTime<Utc>)
        -> Result<SecurityPolicy, WardenError> {

        if policy.max_failures == 0 {
            return Err(ErrorCode::InvalidPolicy.with_msg("max_failures must be at least 1"))
        }

        if policy.min_length > policy.max_length {
            return Err(ErrorCode::InvalidPolicy.with_msg("min_length cannot exceed max_length"))
        }

        let (algorithm_type, argon_policy, bcrypt_policy, pbkdf2_policy) = match &policy.algorithm {
            Some(api::policy::Algorithm::ArgonPolicy(argon)) =>
                (Algorithm::Argon, Some(ArgonPolicy::from(argon)), None, None),
            Some(api::policy::Algorithm::BcryptPolicy(bcrypt)) =>
                (Algorithm::BCrypt, None, Some(BcryptPolicy::from(bcrypt)), None),
            Some(api::policy::Algorithm::Pbkdf2Policy(pbkdf2)) =>
                (Algorithm::PBKDF2, None, None, Some(Pbkdf2Policy::from(pbkdf2))),
            None => return Err(ErrorCode::PolicyMandatory.with_msg("a policy must configure a hashing algorithm")),
        };

        Ok(SecurityPolicy {
            policy_id,
            created_on: bson::DateTime::from_chrono(created_on),
            max_failures: policy.max_failures,
            lockout_seconds: policy.lockout_seconds,
            min_length: policy.min_length,
            max_length: policy.max_length,
            min_letters: policy.min_letters,
            min_numbers: policy.min_numbers,
            min_symbols: policy.min_symbols,
            mixed_case_required: policy.mixed_case_required,
            prohibited_phrases: policy.prohibited_phrases,
            reset_timeout_seconds: policy.reset_timeout_seconds,
            algorithm_type,
            argon_policy,
            bcrypt_policy,
            pbkdf2_policy,
        })
    }
}

impl From<&SecurityPolicy> for api::Policy {
    fn from(policy: &SecurityPolicy) -> Self {
        let algorithm = match policy.algorithm_type {
            Algorithm::Argon  => policy.argon_policy.as_ref().map(|p| api::policy::Algorithm::ArgonPolicy(p.into())),
            Algorithm::BCrypt => policy.bcrypt_policy.as_ref().map(|p| api::policy::Algorithm::BcryptPolicy(p.into())),
            Algorithm::PBKDF2 => policy.pbkdf2_policy.as_ref().map(|p| api::policy::Algorithm::Pbkdf2Policy(p.into())),
        };

        api::Policy {
            max_failures: policy.max_failures,
            lockout_seconds: policy.lockout_seconds,
            min_length: policy.min_length,
            max_length: policy.max_length,
            min_letters: policy.min_letters,
            min_numbers: policy.min_numbers,
            min_symbols: policy.min_symbols,
            mixed_case_required: policy.mixed_case_required,
            prohibited_phrases: policy.prohibited_phrases.clone(),
            reset_timeout_seconds: policy.reset_timeout_seconds,
            algorithm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SecurityPolicy {
        SecurityPolicy::default()
    }

    #[test]
    fn test_a_conforming_password_is_accepted() -> Result<(), WardenError> {
        policy().validate_pattern("W!bble123")
    }

    #[test]
    fn test_banned_phrases_are_rejected_case_insensitively() {
        let err = policy().validate_pattern("My-Password-99").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::PasswordContainsBannedPhrase);
    }

    #[test]
    fn test_short_passwords_are_rejected() {
        let err = policy().validate_pattern("W!b1").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::PasswordTooShort);
    }

    #[test]
    fn test_character_classes_are_enforced() {
        let err = policy().validate_pattern("!!!!1111").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::NotEnoughLetters);

        let err = policy().validate_pattern("Wibbled!").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::NotEnoughNumbers);

        let err = policy().validate_pattern("Wibble12").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::NotEnoughSymbols);
    }

    #[test]
    fn test_mixed_case_is_enforced() {
        let err = policy().validate_pattern("w!bble123").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::NotMixedCase);

        let mut relaxed = policy();
        relaxed.mixed_case_required = false;
        assert!(relaxed.validate_pattern("w!bble123").is_ok());
    }

    #[test]
    fn test_a_policy_without_an_algorithm_is_rejected() {
        let api_policy = api::Policy { max_failures: 3, min_length: 8, max_length: 64, ..Default::default() };
        let err = SecurityPolicy::from_api(api_policy, "p-1".to_string(), Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::PolicyMandatory);
    }

    #[test]
    fn test_a_zero_failure_threshold_is_rejected() {
        let api_policy = api::Policy::default();
        let err = SecurityPolicy::from_api(api_policy, "p-1".to_string(), Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidPolicy);
    }
}
