use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

pub(crate) fn hash(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Constant-time comparison via the PHC verifier. An unparseable stored hash
/// counts as a mismatch.
pub(crate) fn matches(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_roundtrip() {
        let hashed = hash("secret").unwrap();
        assert!(matches(&hashed, "secret"));
        assert!(!matches(&hashed, "wrong"));
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!matches("not-a-phc-string", "secret"));
    }
}
