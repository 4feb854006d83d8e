use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),

    #[error("hashing failed: {0}")]
    Hashing(password_hash::Error),

    #[error("stored hash is not a PHC string")]
    Malformed,

    #[error("verification failed: {0}")]
    Verification(password_hash::Error),
}

/// Argon2id password hasher. Every hash gets a fresh random salt; the cost
/// parameters are fixed for the life of the process and recorded in the
/// PHC string, so verification works across cost changes.
#[derive(Clone)]
pub struct Hasher {
    params: Params,
}

impl Hasher {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(PasswordError::Params)?;
        Ok(Self { params })
    }

    /// Unset costs fall back to the Argon2 defaults.
    pub fn with_costs(memory_kib: Option<u32>, iterations: Option<u32>) -> Result<Self, PasswordError> {
        Self::new(
            memory_kib.unwrap_or(Params::DEFAULT_M_COST),
            iterations.unwrap_or(Params::DEFAULT_T_COST),
        )
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(PasswordError::Hashing)?;
        Ok(hash.to_string())
    }

    /// `Ok(false)` on mismatch. Only a stored value that cannot be parsed
    /// (or an internal algorithm failure) is an error.
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::Malformed)?;

        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Verification(e)),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Hasher {
        Hasher::new(1024, 1).unwrap()
    }

    #[test]
    fn hash_never_equals_plaintext_and_verifies() {
        let hasher = hasher();
        let hash = hasher.hash("secret1").unwrap();

        assert_ne!(hash, "secret1");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret1", &hash).unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let hasher = hasher();
        let hash = hasher.hash("secret1").unwrap();
        assert!(!hasher.verify("secret2", &hash).unwrap());
    }

    #[test]
    fn salts_differ_per_hash() {
        let hasher = hasher();
        assert_ne!(hasher.hash("secret1").unwrap(), hasher.hash("secret1").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let result = hasher().verify("secret1", "not-a-hash");
        assert!(matches!(result, Err(PasswordError::Malformed)));
    }

    #[test]
    fn zero_iterations_are_rejected() {
        assert!(matches!(Hasher::new(1024, 0), Err(PasswordError::Params(_))));
    }

    #[test]
    fn hash_from_other_cost_still_verifies() {
        let hash = hasher().hash("secret1").unwrap();
        let stronger = Hasher::new(2048, 2).unwrap();
        assert!(stronger.verify("secret1", &hash).unwrap());
    }
}
