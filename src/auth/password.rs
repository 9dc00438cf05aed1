use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::Rng;
use std::sync::Arc;
use tracing::warn;

use crate::shared::AppError;

const DUMMY_PASSWORD: &str = "no-account-has-this-password";

/// Argon2id work factor. Hashes embed their own parameters, so raising the
/// cost later still verifies passwords hashed under the old one.
#[derive(Clone)]
pub struct PasswordConfig {
    params: Params,
    /// Verified against when no account matches, so unknown emails cost the
    /// same as wrong passwords
    dummy_hash: Arc<str>,
}

impl PasswordConfig {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| AppError::PasswordHash(e.to_string()))?;
        let dummy_hash = hash_with(&params, DUMMY_PASSWORD)?;

        Ok(Self {
            params,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Salted one-way hash in PHC string format
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash_with(&self.params, password)
    }

    /// False for a wrong password and for a stored hash that cannot be parsed
    pub fn verify(&self, password: &str, hashword: &str) -> bool {
        match PasswordHash::new(hashword) {
            Ok(hash) => argon2(&self.params)
                .verify_password(password.as_bytes(), &hash)
                .is_ok(),
            Err(e) => {
                warn!(error = %e, "Stored password hash is unreadable");
                false
            }
        }
    }

    /// Hashes on the blocking pool so the runtime keeps serving other requests
    pub async fn hash_off_thread(&self, password: String) -> Result<String, AppError> {
        let config = self.clone();
        tokio::task::spawn_blocking(move || config.hash(&password))
            .await
            .map_err(|_| AppError::Internal)?
    }

    pub async fn verify_off_thread(
        &self,
        password: String,
        hashword: String,
    ) -> Result<bool, AppError> {
        let config = self.clone();
        tokio::task::spawn_blocking(move || config.verify(&password, &hashword))
            .await
            .map_err(|_| AppError::Internal)
    }

    /// Spends a full verification on a hash no password matches
    pub async fn verify_dummy_off_thread(&self, password: String) -> Result<(), AppError> {
        self.verify_off_thread(password, self.dummy_hash.to_string())
            .await
            .map(|_| ())
    }
}

fn argon2(params: &Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
}

fn hash_with(params: &Params, password: &str) -> Result<String, AppError> {
    let salt = salt()?;
    argon2(params)
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

fn salt() -> Result<SaltString, AppError> {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    SaltString::encode_b64(&bytes).map_err(|e| AppError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PasswordConfig {
        PasswordConfig::new(8, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let config = config();
        let hash = config.hash("Passw0rd!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("Passw0rd!"));
        assert!(config.verify("Passw0rd!", &hash));
        assert!(!config.verify("passw0rd!", &hash));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let config = config();
        let first = config.hash("Passw0rd!").unwrap();
        let second = config.hash("Passw0rd!").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_across_work_factors() {
        let hash = config().hash("Passw0rd!").unwrap();
        let stronger = PasswordConfig::new(64, 3).unwrap();

        assert!(stronger.verify("Passw0rd!", &hash));
    }

    #[test]
    fn test_unreadable_hash_never_verifies() {
        assert!(!config().verify("Passw0rd!", "plaintext"));
    }

    #[test]
    fn test_dummy_hash_uses_configured_work_factor() {
        let config = PasswordConfig::new(64, 3).unwrap();

        assert!(config.dummy_hash.starts_with("$argon2id$"));
        assert!(config.dummy_hash.contains("m=64,t=3"));
        assert!(!config.verify("Passw0rd!", &config.dummy_hash));
    }

    #[tokio::test]
    async fn test_verify_dummy_off_thread() {
        assert!(config()
            .verify_dummy_off_thread("Passw0rd!".to_string())
            .await
            .is_ok());
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(matches!(
            PasswordConfig::new(8, 0),
            Err(AppError::PasswordHash(_))
        ));
    }

    #[tokio::test]
    async fn test_off_thread_round_trip() {
        let config = config();
        let hash = config
            .hash_off_thread("Passw0rd!".to_string())
            .await
            .unwrap();

        assert!(config
            .verify_off_thread("Passw0rd!".to_string(), hash)
            .await
            .unwrap());
    }
}
