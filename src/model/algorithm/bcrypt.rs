use serde::{Deserialize, Serialize};
use crate::grpc::admin as api;
use crate::utils::errors::WardenError;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BcryptPolicy {
    pub cost: u32,
}

impl Default for BcryptPolicy {
    fn default() -> Self {
        BcryptPolicy { cost: bcrypt::DEFAULT_COST }
    }
}

impl BcryptPolicy {
    // bcrypt's modular-crypt output ($2b$...) is close enough to PHC for the
    // prefix-based algorithm selection to work.
    pub fn hash_into_phc(&self, plain_text_password: &str) -> Result<String, WardenError> {
        Ok(bcrypt::hash(plain_text_password, self.cost)?)
    }
}

pub fn validate(phc: &str, plain_text_password: &str) -> Result<bool, WardenError> {
    Ok(bcrypt::verify(plain_text_password, phc)?)
}

impl From<&api::BcryptPolicy> for BcryptPolicy {
    fn from(bcrypt: &api::BcryptPolicy) -> Self {
        BcryptPolicy { cost: bcrypt.cost }
    }
}

impl From<&BcryptPolicy> for api::BcryptPolicy {
    fn from(bcrypt: &BcryptPolicy) -> Self {
        api::BcryptPolicy { cost: bcrypt.cost }
    }
}
