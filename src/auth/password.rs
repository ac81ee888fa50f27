use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::thread_rng;

use crate::{config::RunMode, error::AppError};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Argon2id hashing with a cost chosen per run mode.
#[derive(Clone, Debug)]
pub struct PasswordHashing {
    params: Params,
}

impl PasswordHashing {
    pub fn for_mode(mode: RunMode) -> Self {
        let params = match mode {
            RunMode::Test => Params::new(
                Params::MIN_M_COST,
                Params::MIN_T_COST,
                Params::MIN_P_COST,
                None,
            )
            .unwrap_or_default(),
            RunMode::Development | RunMode::Production => Params::default(),
        };
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request("Password too short"));
        }

        let salt = SaltString::generate(&mut thread_rng());
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AppError::internal(format!("Password hashing failed: {err}")))?
            .to_string();
        Ok(hash)
    }

    /// Cost parameters are read from the stored hash, so hashes made under another
    /// run mode still verify.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|err| AppError::internal(format!("Invalid password hash: {err}")))?;

        Ok(self
            .argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
