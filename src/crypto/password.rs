use std::str::FromStr;

use argon2::{
    Argon2, ParamsBuilder,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::{AppError, Result};

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// Prefix of every Argon2 PHC string.
const ARGON2_PREFIX: &str = "$argon2";

/// How new passwords are digested.
///
/// `Sha256` is the unsalted hex digest existing records use. It is fast and
/// offers no protection against precomputed tables; `Argon2id` is the salted
/// replacement. Both kinds of stored digest always verify, so switching the
/// scheme does not lock out earlier accounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordScheme {
    Sha256,
    Argon2id,
}

impl FromStr for PasswordScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "argon2" | "argon2id" => Ok(Self::Argon2id),
            other => anyhow::bail!("Unknown PASSWORD_SCHEME '{}' (expected sha256 or argon2)", other),
        }
    }
}

/// Digests `password` with `scheme`.
pub fn digest(scheme: PasswordScheme, password: &str) -> Result<String> {
    match scheme {
        PasswordScheme::Sha256 => Ok(sha256_hex(password)),
        PasswordScheme::Argon2id => argon2_hash(password),
    }
}

/// Checks `password` against a stored digest of either scheme.
pub fn verify(password: &str, stored: &str) -> Result<bool> {
    if stored.starts_with(ARGON2_PREFIX) {
        return argon2_verify(password, stored);
    }

    let computed = sha256_hex(password);
    Ok(bool::from(computed.as_bytes().ct_eq(stored.as_bytes())))
}

/// Lowercase hex SHA-256 of the password bytes.
fn sha256_hex(password: &str) -> String {
    let mut password_bytes = password.as_bytes().to_vec();
    let hex_digest = hex::encode(Sha256::digest(&password_bytes));
    password_bytes.zeroize();
    hex_digest
}

/// Hashes a password using Argon2id with a random 16-byte salt.
fn argon2_hash(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    tracing::debug!("Password hashed with Argon2id");
    Ok(password_hash)
}

fn argon2_verify(password: &str, stored: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let result = Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_digest_is_the_plain_hex_form() {
        let stored = digest(PasswordScheme::Sha256, "pw1").unwrap();
        assert_eq!(stored.len(), 64);
        assert!(stored.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(
            digest(PasswordScheme::Sha256, "abc").unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_digest_verifies_only_the_same_password() {
        let stored = digest(PasswordScheme::Sha256, "pw1").unwrap();
        assert!(verify("pw1", &stored).unwrap());
        assert!(!verify("pw2", &stored).unwrap());
        assert!(!verify("", &stored).unwrap());
    }

    #[test]
    fn argon2_digest_is_salted_and_verifies() {
        let first = digest(PasswordScheme::Argon2id, "pw1").unwrap();
        let second = digest(PasswordScheme::Argon2id, "pw1").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(verify("pw1", &first).unwrap());
        assert!(!verify("pw2", &first).unwrap());
    }

    #[test]
    fn scheme_names_parse() {
        assert_eq!("SHA256".parse::<PasswordScheme>().unwrap(), PasswordScheme::Sha256);
        assert_eq!("argon2".parse::<PasswordScheme>().unwrap(), PasswordScheme::Argon2id);
        assert!("md5".parse::<PasswordScheme>().is_err());
    }
}
