//! Salted password hashing.
//!
//! Encoded form: `pbkdf2-sha256$<rounds>$<salt>$<hex key>`, where the key is
//! 32 bytes of PBKDF2-HMAC-SHA256 over the password with the salt text.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{AuthError, AuthResult};

const SCHEME: &str = "pbkdf2-sha256";
const KEY_LEN: usize = 32;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, rounds: u32) -> String {
    let rounds = rounds.max(1);
    let salt = uuid::Uuid::new_v4().simple().to_string();
    let key = derive_key(&salt, password, rounds);
    format!("{}${}${}${}", SCHEME, rounds, salt, hex::encode(key))
}

/// Check a password against an encoded hash.
pub fn verify_password(password: &str, encoded: &str) -> AuthResult<bool> {
    let parts: Vec<&str> = encoded.split('$').collect();
    let [scheme, rounds, salt, expected] = parts.as_slice() else {
        return Err(AuthError::MalformedHash("expected 4 fields".into()));
    };
    if *scheme != SCHEME {
        return Err(AuthError::MalformedHash(format!(
            "unsupported scheme: {}",
            scheme
        )));
    }
    let rounds: u32 = rounds
        .parse()
        .map_err(|_| AuthError::MalformedHash(format!("invalid rounds: {}", rounds)))?;
    if rounds == 0 {
        return Err(AuthError::MalformedHash("rounds must be at least 1".into()));
    }
    let expected = hex::decode(expected)
        .map_err(|e| AuthError::MalformedHash(format!("invalid key: {}", e)))?;

    let actual = derive_key(salt, password, rounds);
    Ok(actual[..].ct_eq(&expected[..]).into())
}

fn derive_key(salt: &str, password: &str, rounds: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds, &mut key);
    key
}
