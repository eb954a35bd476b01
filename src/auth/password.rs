use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::{auth::errors::AuthError, config::PasswordConfig};

/// Argon2id hasher with process-wide cost parameters.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    decoy: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        let mut hasher = Self {
            params,
            decoy: Arc::from(""),
        };
        let decoy = hasher
            .hash("decoy-password")
            .map_err(|e| anyhow::anyhow!("argon2 self-test failed: {e}"))?;
        hasher.decoy = Arc::from(decoy);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `plain` with a fresh random salt. The digest is PHC-encoded and
    /// carries its own salt and cost parameters.
    pub fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AuthError::Hashing(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Check `plain` against a stored digest. A mismatch is `Ok(false)`; only an
    /// unparsable digest is an error.
    pub fn verify(&self, digest: &str, plain: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(digest).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            AuthError::Verification(e.to_string())
        })?;
        // Params embedded in the digest win over ours, so old digests keep verifying.
        Ok(self
            .argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// Spend the same work as a real `verify` when there is no stored digest,
    /// so a missing account is not distinguishable by response time.
    pub fn verify_decoy(&self, plain: &str) {
        let _ = self.verify(&self.decoy, plain);
    }
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .expect("cheap params are valid")
}
