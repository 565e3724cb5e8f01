use rand_core::OsRng;
use std::convert::TryFrom;
use serde::{Deserialize, Serialize};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use crate::grpc::admin as api;
use crate::utils::errors::WardenError;

///
/// Argon2id parameters carried on the security policy.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ArgonPolicy {
    pub parallelism: u32,
    pub tag_length: u32,
    pub memory_size_kb: u32,
    pub iterations: u32,
    pub version: u32,
}

impl Default for ArgonPolicy {
    fn default() -> Self {
        ArgonPolicy {
            parallelism: 1,
            tag_length: 32,
            memory_size_kb: 1024 * 16,
            iterations: 1,
            version: 19,
        }
    }
}

impl ArgonPolicy {
    pub fn hash_into_phc(&self, plain_text_password: &str) -> Result<String, WardenError> {
        let salt = SaltString::generate(&mut OsRng);

        let argon2 = argon2::Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::try_from(self.version)?,
            argon2::Params::new(
                self.memory_size_kb,
                self.iterations,
                self.parallelism,
                Some(self.tag_length as usize))?);

        // Hash password to PHC string ($argon2id$v=19$...)
        Ok(argon2.hash_password(plain_text_password.as_bytes(), &salt)?.to_string())
    }
}

///
/// The verification parameters all come from the PHC string, not the policy.
///
pub fn validate(phc: &str, plain_text_password: &str) -> Result<bool, WardenError> {
    let parsed_hash = PasswordHash::new(phc)?;
    Ok(argon2::Argon2::default().verify_password(plain_text_password.as_bytes(), &parsed_hash).is_ok())
}

impl From<&api::ArgonPolicy> for ArgonPolicy {
    fn from(argon: &api::ArgonPolicy) -> Self {
        ArgonPolicy {
            parallelism:    argon.parallelism,
            tag_length:     argon.tag_length,
            memory_size_kb: argon.memory_size_kb,
            iterations:     argon.iterations,
            version:        argon.version,
        }
    }
}

impl From<&ArgonPolicy> for api::ArgonPolicy {
    fn from(argon: &ArgonPolicy) -> Self {
        api::ArgonPolicy {
            parallelism:    argon.parallelism,
            tag_length:     argon.tag_length,
            memory_size_kb: argon.memory_size_kb,
            iterations:     argon.iterations,
            version:        argon.version,
        }
    }
}
