//! bcrypt password hashes
//!
//! Hashing is CPU bound, so callers on the runtime go through the async wrappers,
//! which run it on the blocking pool.

use lazy_static::lazy_static;

use crate::Result;

/// Work factor for new hashes
pub const BCRYPT_COST: u32 = 10;

lazy_static! {
    /// Verified against when an e-mail is unknown, so both paths cost one bcrypt check.
    static ref DUMMY_HASH: String =
        bcrypt::hash("placeholder-password", BCRYPT_COST).unwrap_or_default();
}

pub fn hash_password(password: &str) -> Result<String> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Malformed stored hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

/// Burn the same work as a real check; always false.
pub fn verify_dummy(password: &str) -> bool {
    let _ = verify_password(password, &DUMMY_HASH);
    false
}

pub async fn hash_password_async(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// Verify against `stored`, or against the dummy hash when there is no stored hash.
pub async fn verify_password_async(password: String, stored: Option<String>) -> Result<bool> {
    let verified = tokio::task::spawn_blocking(move || match stored {
        Some(stored) => verify_password(&password, &stored),
        None => verify_dummy(&password),
    })
    .await?;
    Ok(verified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies() {
        let stored = hash_password("s3cret-pass").unwrap();
        assert!(stored.starts_with("$2b$10$"));
        assert!(verify_password("s3cret-pass", &stored));
        assert!(!verify_password("wrong", &stored));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_malformed_hash_rejected() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "sha256$1$salt$abc"));
    }

    #[test]
    fn test_dummy_hash_is_a_real_hash() {
        assert!(DUMMY_HASH.starts_with("$2b$10$"));
        assert!(!verify_dummy("placeholder-password"));
        assert!(!verify_dummy("anything"));
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let stored = hash_password_async("pw".to_string()).await.unwrap();
        assert!(verify_password_async("pw".to_string(), Some(stored.clone())).await.unwrap());
        assert!(!verify_password_async("nope".to_string(), Some(stored)).await.unwrap());
        assert!(!verify_password_async("pw".to_string(), None).await.unwrap());
    }
}
