use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use pbkdf2::Pbkdf2;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use crate::grpc::admin as api;
use crate::utils::errors::WardenError;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Pbkdf2Policy {
    pub cost: u32,
    pub output_length: u32,
}

impl Default for Pbkdf2Policy {
    fn default() -> Self {
        Pbkdf2Policy { cost: 310_000, output_length: 32 }
    }
}

impl Pbkdf2Policy {
    pub fn hash_into_phc(&self, plain_text_password: &str) -> Result<String, WardenError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = pbkdf2::Params {
            rounds: self.cost,
            output_length: self.output_length as usize,
        };

        // No explicit ident or version - the default is pbkdf2-sha256.
        let phc = Pbkdf2.hash_password_customized(
            plain_text_password.as_bytes(),
            None,
            None,
            params,
            &salt)?;

        Ok(phc.to_string())
    }
}

pub fn validate(phc: &str, plain_text_password: &str) -> Result<bool, WardenError> {
    let parsed_hash = PasswordHash::new(phc)?;
    Ok(Pbkdf2.verify_password(plain_text_password.as_bytes(), &parsed_hash).is_ok())
}

impl From<&api::Pbkdf2Policy> for Pbkdf2Policy {
    fn from(pbkdf2: &api::Pbkdf2Policy) -> Self {
        Pbkdf2Policy { cost: pbkdf2.cost, output_length: pbkdf2.output_length }
    }
}

impl From<&Pbkdf2Policy> for api::Pbkdf2Policy {
    fn from(pbkdf2: &Pbkdf2Policy) -> Self {
        api::Pbkdf2Policy { cost: pbkdf2.cost, output_length: pbkdf2.output_length }
    }
}
