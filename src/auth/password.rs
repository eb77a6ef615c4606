use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use lazy_static::lazy_static;
use tracing::{error, warn};

use crate::{error::ModelError, validator::Validator};

// argon2id cost: 19 MiB, 2 passes, 1 lane.
const MEMORY_KIB: u32 = 19_456;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;

pub const MIN_PASSWORD_BYTES: usize = 8;
pub const MAX_PASSWORD_BYTES: usize = 72;

fn hasher() -> Result<Argon2<'static>, ModelError> {
    let params = Params::new(MEMORY_KIB, ITERATIONS, PARALLELISM, None)
        .map_err(|e| ModelError::HashingFailure(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// A user's password: always a hash, plus the plaintext while it is being set.
#[derive(Clone)]
pub struct Password {
    plaintext: Option<String>,
    hash: Vec<u8>,
}

impl Password {
    pub fn set(plaintext: &str) -> Result<Self, ModelError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = hasher()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                ModelError::HashingFailure(e.to_string())
            })?
            .to_string();
        Ok(Self {
            plaintext: Some(plaintext.to_string()),
            hash: hash.into_bytes(),
        })
    }

    /// Rebuilds a stored password; there is no plaintext to keep.
    pub fn from_hash(hash: Vec<u8>) -> Self {
        Self {
            plaintext: None,
            hash,
        }
    }

    pub fn plaintext(&self) -> Option<&str> {
        self.plaintext.as_deref()
    }

    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// Any failure to parse or verify the stored hash counts as a mismatch.
    pub fn matches(&self, candidate: &str) -> bool {
        let Ok(encoded) = std::str::from_utf8(&self.hash) else {
            warn!("stored password hash is not utf-8");
            return false;
        };
        let parsed = match PasswordHash::new(encoded) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(e) => {
                warn!(error = %e, "argon2 verify_password error");
                false
            }
        }
    }
}

lazy_static! {
    // Hashed once with the live cost parameters.
    static ref DUMMY_PASSWORD: Option<Password> = Password::set("greenlight-no-such-user").ok();
}

/// Runs a full verification for a login whose email matched nobody.
/// Always false.
pub fn verify_without_user(candidate: &str) -> bool {
    if let Some(dummy) = DUMMY_PASSWORD.as_ref() {
        let _ = dummy.matches(candidate);
    }
    false
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password").finish_non_exhaustive()
    }
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(
        password.len() >= MIN_PASSWORD_BYTES,
        "password",
        "must be at least 8 bytes long",
    );
    v.check(
        password.len() <= MAX_PASSWORD_BYTES,
        "password",
        "must not be more than 72 bytes long",
    );
}
