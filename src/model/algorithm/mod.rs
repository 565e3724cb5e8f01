pub mod argon;
pub mod bcrypt;
pub mod pbkdf2;

use std::str::FromStr;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use crate::utils::errors::{ErrorCode, WardenError};

#[derive(Clone, Copy, Debug, Deserialize, Display, Serialize, PartialEq)]
pub enum Algorithm {
    Argon,
    BCrypt,
    PBKDF2,
}

///
/// Validate that the plain_text_password matches the hashed credential.
///
/// The algorithm is selected from the PHC string itself, so records hashed
/// under an older policy keep verifying after the active policy moves on.
///
pub fn validate(plain_text_password: &str, phc: &str) -> Result<bool, WardenError> {
    match select(phc)? {
        Algorithm::Argon  => argon::validate(phc, plain_text_password),
        Algorithm::BCrypt => bcrypt::validate(phc, plain_text_password),
        Algorithm::PBKDF2 => pbkdf2::validate(phc, plain_text_password),
    }
}

///
/// Parse the first part of the phc string and return the algorithm.
///
fn select(phc: &str) -> Result<Algorithm, WardenError> {
    let mut split = phc.split('$');
    split.next(); /* Skip first it's blank */

    match split.next() {
        Some(algorithm) => Algorithm::from_str(algorithm),
        None => Err(ErrorCode::InvalidPHCFormat.with_msg("The PHC is invalid, there's no algorithm")),
    }
}

impl FromStr for Algorithm {
    type Err = WardenError;

    fn from_str(input: &str) -> Result<Algorithm, Self::Err> {
        match input {
            "argon2i"  |
            "argon2d"  |
            "argon2id" => Ok(Algorithm::Argon),

            "2a" |
            "2b" |
            "2x" |
            "2y" => Ok(Algorithm::BCrypt),

            "pbkdf2-sha256" => Ok(Algorithm::PBKDF2),

            _ => Err(ErrorCode::UnknownAlgorithmVariant.with_msg(&format!("algorithm {} is un-handled", input))),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_argon2id() -> Result<(), WardenError> {
        let phc = "$argon2id$v=19$m=16384,t=20,p=1$77QFGJMDLMwvR7+lYvuNtw$82Byd2enomP62Z01Wcb1g5+KApYhQygW6BEYCXnZj5A";
        assert_eq!(select(phc)?, Algorithm::Argon);
        Ok(())
    }

    #[test]
    fn test_select_bcrypt() -> Result<(), WardenError> {
        let phc = "$2b$04$yz2BqCWtRYj9s2IVxlV2suEBBDOXjhiTB.FHcdpKLx2Wpefh4F/zW";
        assert_eq!(select(phc)?, Algorithm::BCrypt);
        Ok(())
    }

    #[test]
    fn test_select_pbkdf2() -> Result<(), WardenError> {
        let phc = "$pbkdf2-sha256$i=1000,l=32$5OXmm1jpWMXpgEDwyaVcbg$X8wmAkTnAqM9Pk/HO9VeSPM6ygzmRRX9t1Ff9fUbBuc";
        assert_eq!(select(phc)?, Algorithm::PBKDF2);
        Ok(())
    }

    #[test]
    fn test_select_rejects_garbage() {
        assert_eq!(select("not-a-phc").unwrap_err().error_code(), ErrorCode::UnknownAlgorithmVariant);
        assert_eq!(select("$md5$abc").unwrap_err().error_code(), ErrorCode::UnknownAlgorithmVariant);
    }

    #[test]
    fn test_argon_hash_and_validate_round_trip() -> Result<(), WardenError> {
        let policy = argon::ArgonPolicy { parallelism: 1, tag_length: 32, memory_size_kb: 1024, iterations: 1, version: 19 };
        let phc = policy.hash_into_phc("W!bble123")?;

        assert!(validate("W!bble123", &phc)?);
        assert!(!validate("W!bble124", &phc)?);
        Ok(())
    }

    #[test]
    fn test_bcrypt_hash_and_validate_round_trip() -> Result<(), WardenError> {
        let policy = bcrypt::BcryptPolicy { cost: 4 };
        let phc = policy.hash_into_phc("W!bble123")?;

        assert!(validate("W!bble123", &phc)?);
        assert!(!validate("W!bble124", &phc)?);
        Ok(())
    }

    #[test]
    fn test_pbkdf2_hash_and_validate_round_trip() -> Result<(), WardenError> {
        let policy = pbkdf2::Pbkdf2Policy { cost: 1000, output_length: 32 };
        let phc = policy.hash_into_phc("W!bble123")?;

        assert!(validate("W!bble123", &phc)?);
        assert!(!validate("W!bble124", &phc)?);
        Ok(())
    }
}
