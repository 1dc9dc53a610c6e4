use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password into a PHC string
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

/// Modular-crypt prefixes of bcrypt hashes written before the argon2 switch
const BCRYPT_PREFIXES: &[&str] = &["$2a$", "$2b$", "$2y$"];

/// Hash written by the bcrypt signup flow; rehash it after a successful sign-in
pub fn is_legacy_hash(stored_hash: &str) -> bool {
    BCRYPT_PREFIXES
        .iter()
        .any(|prefix| stored_hash.starts_with(prefix))
}

/// `false` for mismatches and for hashes this service cannot read
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    if is_legacy_hash(stored_hash) {
        return bcrypt::verify(password, stored_hash).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored bcrypt hash is malformed");
            false
        });
    }

    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is not a PHC string");
            false
        }
    }
}
