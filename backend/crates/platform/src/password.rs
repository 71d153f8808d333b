//! Password Hashing and Strength Policy
//!
//! - Argon2id hashing (memory-hard, recommended by OWASP)
//! - Zeroization of clear text passwords
//! - Constant-time verification
//! - Strength policy that reports every violated rule, not just the
//!   first one

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

// ============================================================================
// Error Types
// ============================================================================

/// A single violated strength-policy rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must contain at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// Password appears on the common-password list
    #[error("Password is too common")]
    TooCommon,

    /// Password consists solely of digits
    #[error("Password cannot be entirely numeric")]
    EntirelyNumeric,

    /// Password is too close to another account attribute
    #[error("Password is too similar to the {attribute}")]
    TooSimilar { attribute: &'static str },
}

/// Hashing/verification errors.
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid hash format
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Strength Policy
// ============================================================================

/// Check a password against every policy rule and return all
/// violations.
///
/// `attributes` are named account values the password must not
/// resemble (username, email, email local part). The caller reports
/// the returned list as one batch; an empty list means the password
/// passes.
pub fn validate_policy(
    password: &str,
    attributes: &[(&'static str, &str)],
) -> Vec<PasswordPolicyError> {
    let mut violations = Vec::new();

    let char_count = password.chars().count();
    if char_count < MIN_PASSWORD_LENGTH {
        violations.push(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual: char_count,
        });
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        violations.push(PasswordPolicyError::EntirelyNumeric);
    }

    if is_common_password(password) {
        violations.push(PasswordPolicyError::TooCommon);
    }

    for (name, value) in attributes {
        if is_too_similar(password, value) {
            violations.push(PasswordPolicyError::TooSimilar { attribute: name });
        }
    }

    violations
}

/// Containment-based similarity: either string (lowercased) contains
/// the other. Attributes shorter than 4 characters are ignored to
/// avoid false positives on short local parts.
fn is_too_similar(password: &str, attribute: &str) -> bool {
    if attribute.chars().count() < 4 {
        return false;
    }
    let p = password.to_lowercase();
    let a = attribute.to_lowercase();
    p.contains(&a) || a.contains(&p)
}

fn is_common_password(password: &str) -> bool {
    let lower = password.to_lowercase();

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "12345678",
        "123456789",
        "1234567890",
        "qwertyuiop",
        "abcdefgh",
        "letmein",
        "welcome1",
        "admin123",
        "iloveyou",
        "sunshine",
        "princess",
        "football",
        "baseball",
        "superman",
        "trustno1",
        "passw0rd",
    ];

    COMMON_PASSWORDS.contains(&lower.as_str())
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization.
///
/// Unicode is normalized with NFKC on construction so hashing and
/// verification agree on one representation. Does not implement
/// `Clone`; debug output is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self(raw.nfkc().collect())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash with Argon2id (OWASP default parameters), optionally
    /// mixing in an application-wide pepper.
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let password_bytes = match pepper {
            Some(p) => {
                let mut combined = self.as_bytes().to_vec();
                combined.extend_from_slice(p);
                combined
            }
            None => self.as_bytes().to_vec(),
        };

        let salt = SaltString::generate(OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(&password_bytes, &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from a PHC string (e.g. loaded from the database).
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    /// PHC string for storage.
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash.
    ///
    /// Argon2 compares digests in constant time; the pepper must match
    /// the one used at hashing time.
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let password_bytes = match pepper {
            Some(p) => {
                let mut combined = password.as_bytes().to_vec();
                combined.extend_from_slice(p);
                combined
            }
            None => password.as_bytes().to_vec(),
        };

        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(&password_bytes, &parsed_hash)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_too_short() {
        let violations = validate_policy("Ab1$", &[]);
        assert!(
            violations
                .iter()
                .any(|v| matches!(v, PasswordPolicyError::TooShort { .. }))
        );
    }

    #[test]
    fn test_policy_entirely_numeric() {
        let violations = validate_policy("84629175", &[]);
        assert_eq!(violations, vec![PasswordPolicyError::EntirelyNumeric]);
    }

    #[test]
    fn test_policy_too_common() {
        let violations = validate_policy("password123", &[]);
        assert_eq!(violations, vec![PasswordPolicyError::TooCommon]);
    }

    #[test]
    fn test_policy_too_similar_to_username() {
        let violations = validate_policy(
            "carolina99",
            &[("username", "carolina"), ("email", "carolina@example.com")],
        );
        assert!(
            violations
                .iter()
                .any(|v| matches!(v, PasswordPolicyError::TooSimilar { attribute: "username" }))
        );
    }

    #[test]
    fn test_policy_short_attribute_ignored() {
        // 3-char attributes never trigger the similarity rule
        let violations = validate_policy("abcSecure$1", &[("username", "abc")]);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_policy_collects_multiple_violations() {
        let violations = validate_policy("1234", &[]);
        assert!(
            violations
                .iter()
                .any(|v| matches!(v, PasswordPolicyError::TooShort { .. }))
        );
        assert!(violations.contains(&PasswordPolicyError::EntirelyNumeric));
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_policy_accepts_strong_password() {
        let violations = validate_policy("Django13$", &[("username", "newuser")]);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_hash_and_verify() {
        let password = ClearTextPassword::new("TestPassword123!");
        let hashed = password.hash(None).unwrap();

        assert!(hashed.verify(&password, None));

        let wrong_password = ClearTextPassword::new("WrongPassword123!");
        assert!(!hashed.verify(&wrong_password, None));
    }

    #[test]
    fn test_hash_with_pepper() {
        let password = ClearTextPassword::new("TestPassword123!");
        let pepper = b"application_pepper";
        let hashed = password.hash(Some(pepper)).unwrap();

        assert!(hashed.verify(&password, Some(pepper)));
        assert!(!hashed.verify(&password, None));
        assert!(!hashed.verify(&password, Some(b"wrong_pepper")));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let password = ClearTextPassword::new("TestPassword123!");
        let hashed = password.hash(None).unwrap();

        let phc_string = hashed.as_phc_string().to_string();
        let restored = HashedPassword::from_phc_string(phc_string).unwrap();

        assert!(restored.verify(&password, None));
    }

    #[test]
    fn test_invalid_phc_string() {
        let result = HashedPassword::from_phc_string("not_a_valid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_nfkc_normalization() {
        // Full-width and half-width forms normalize to the same bytes
        let a = ClearTextPassword::new("Ｐassword１２!x");
        let b = ClearTextPassword::new("Password12!x");
        let hashed = a.hash(None).unwrap();
        assert!(hashed.verify(&b, None));
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::new("secret");
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));
    }
}
