//! Salted PBKDF2-HMAC-SHA256 password hashes.
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt base64>$<digest base64>`.

use base64::{engine::general_purpose::STANDARD, Engine};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;
pub const DEFAULT_ITERATIONS: u32 = 10_000;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    hash_password_with_iterations(password, DEFAULT_ITERATIONS)
}

pub fn hash_password_with_iterations(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let digest = derive(password.as_bytes(), &salt, iterations.max(1));

    format!(
        "{}${}${}${}",
        SCHEME,
        iterations.max(1),
        STANDARD.encode(salt),
        STANDARD.encode(digest)
    )
}

/// Checks a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');

    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    if scheme != SCHEME {
        return false;
    }

    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt), STANDARD.decode(expected)) else {
        return false;
    };

    if iterations == 0 {
        return false;
    }

    let actual = derive(password.as_bytes(), &salt, iterations);
    actual.as_slice().ct_eq(&expected).into()
}

fn derive(password: &[u8], salt: &[u8], iterations: u32) -> [u8; DIGEST_LEN] {
    let mut digest = [0u8; DIGEST_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut digest);
    digest
}
