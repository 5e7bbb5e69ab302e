//! Password hashing for stored credentials.
//!
//! Hashes use Argon2id with OWASP-recommended parameters (memory:
//! 19 MiB, iterations: 2, parallelism: 1) and a random salt per hash.
//! An optional pepper (server-side secret) is prepended to the password.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::{Argon2, PasswordHasher};
use lazysignup_core::models::user::UNUSABLE_PASSWORD_PREFIX;

use crate::error::DbError;

/// Hash a password with Argon2id.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Hash(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// A random marker that no password can verify against.
///
/// The random tail keeps two unusable hashes from comparing equal.
pub fn unusable_password() -> String {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    format!("{UNUSABLE_PASSWORD_PREFIX}{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_argon2id_phc() {
        let hash = hash_password("hunter2", None).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, hash_password("hunter2", None).unwrap());
    }

    #[test]
    fn unusable_passwords_are_marked_and_distinct() {
        let a = unusable_password();
        let b = unusable_password();
        assert!(a.starts_with(UNUSABLE_PASSWORD_PREFIX));
        assert_eq!(a.len(), 41);
        assert!(a[1..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
