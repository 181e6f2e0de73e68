use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::types::HashedPassword;

// Stand-in hash so logins for unknown accounts cost the same argon2 work as real ones.
static DUMMY_HASH: Lazy<Option<HashedPassword>> =
    Lazy::new(|| hash("no account has this password").ok());

/// Hash a password with a fresh random salt.
pub fn hash(password: &str) -> Result<HashedPassword, argon2::Error> {
    let salt = Uuid::new_v4();
    let encoded = argon2::hash_encoded(password.as_bytes(), salt.as_bytes(), &Default::default())?;

    Ok(HashedPassword(encoded))
}

/// Check a password against a stored hash. Hashes that fail to parse simply don't match.
pub fn verify(password: &str, hash: &HashedPassword) -> bool {
    argon2::verify_encoded(&hash.0, password.as_bytes()).unwrap_or(false)
}

/// Burn one verification's worth of work against a hash no caller knows. Always false.
pub fn verify_dummy(password: &str) -> bool {
    if let Some(dummy) = DUMMY_HASH.as_ref() {
        let _ = verify(password, dummy);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash("password123").unwrap();

        assert!(verify("password123", &hashed));
        assert!(!verify("password124", &hashed));
        assert!(!verify("", &hashed));
        assert!(!verify("PASSWORD123", &hashed));
    }

    #[test]
    fn salts_differ_between_calls() {
        let first = hash("hunter2").unwrap();
        let second = hash("hunter2").unwrap();

        assert_ne!(first, second);
        assert!(verify("hunter2", &first));
        assert!(verify("hunter2", &second));
    }

    #[test]
    fn dummy_verification_never_succeeds() {
        assert!(DUMMY_HASH.is_some());
        assert!(!verify_dummy("no account has this password"));
        assert!(!verify_dummy("password123"));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        for junk in [
            "",
            "password123",
            "$2b$12$abcdefghijklmnopqrstuv",
            "$argon2i$v=19$m=4096,t=3,p=1$garbage",
        ] {
            assert!(!verify("password123", &HashedPassword(junk.into())), "{junk}");
        }
    }
}
