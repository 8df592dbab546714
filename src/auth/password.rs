/// Password Hashing and Verification
///
/// Argon2id with fixed parameters, encoded in PHC string form:
/// `$argon2id$v=19$m=65536,t=1,p=4$<salt>$<hash>` (unpadded base64).

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::AuthError;

const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
const ARGON2_TIME_COST: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;
const KEY_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;

/// Well-formed hash that matches no password. Verified against on login for
/// unknown accounts so both failure paths cost one full derivation.
pub(crate) const DUMMY_HASH: &str =
    "$argon2id$v=19$m=65536,t=1,p=4$Y3JlZGVudGlhbC1kdW1teQ$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

fn hasher() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_TIME_COST,
        ARGON2_PARALLELISM,
        Some(KEY_LENGTH),
    )
    .map_err(|e| AuthError::Internal(format!("Invalid argon2 parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with a fresh random salt
///
/// # Errors
/// Returns error only if the OS entropy source fails
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| AuthError::Internal(format!("Entropy source failure: {}", e)))?;

    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| AuthError::Internal(format!("Salt encoding failed: {}", e)))?;

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against an encoded hash
///
/// Malformed hashes and wrong passwords both yield `false`. The derived key is
/// recomputed with the salt and parameters embedded in `encoded_hash` and
/// compared in constant time.
pub fn verify_password(password: &str, encoded_hash: &str) -> bool {
    let fields: Vec<&str> = encoded_hash.split('$').collect();
    if fields.len() != 6 || fields[1] != "argon2id" {
        return false;
    }

    let parsed = match PasswordHash::new(encoded_hash) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_format() {
        let hash = hash_password("pw").expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$v=19$m=65536,t=1,p=4$"));
        let fields: Vec<&str> = hash.split('$').collect();
        assert_eq!(fields.len(), 6);
        // 16-byte salt and 32-byte key, unpadded base64
        assert_eq!(fields[4].len(), 22);
        assert_eq!(fields[5].len(), 43);
        assert!(!fields[4].contains('=') && !fields[5].contains('='));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct horse").expect("Failed to hash password");
        assert!(verify_password("correct horse", &hash));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("correct horse").expect("Failed to hash password");
        assert!(!verify_password("battery staple", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("same").expect("Failed to hash password");
        let second = hash_password("same").expect("Failed to hash password");

        assert_ne!(first, second);
        assert!(verify_password("same", &first));
        assert!(verify_password("same", &second));
    }

    #[test]
    fn test_malformed_hashes_are_false() {
        let hash = hash_password("pw").expect("Failed to hash password");
        let bcrypt_like = "$2b$12$abcdefghijklmnopqrstuu5Q5oGNaPJ6NVbLkpR8dVNqO2WRsAu6";
        let wrong_tag = hash.replacen("argon2id", "argon2i", 1);
        let truncated: String = hash.rsplitn(2, '$').last().unwrap().to_string();

        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "not-a-hash"));
        assert!(!verify_password("pw", bcrypt_like));
        assert!(!verify_password("pw", &wrong_tag));
        assert!(!verify_password("pw", &truncated));
        assert!(!verify_password("pw", &format!("{}$extra", hash)));
    }

    #[test]
    fn test_dummy_hash_is_well_formed_and_unmatchable() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        assert!(!verify_password("", DUMMY_HASH));
        assert!(!verify_password("pw", DUMMY_HASH));
    }
}
