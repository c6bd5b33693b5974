//! # Credential Generation
//!
//! Master passwords for first-time provisioning.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use zeroize::Zeroizing;

/// Generate a random alphanumeric password of `length` characters
///
/// Alphanumeric only: RDS rejects `/`, `@`, `"` and spaces in master passwords.
pub fn generate_password(length: usize) -> Zeroizing<String> {
    Zeroizing::new(
        OsRng
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_and_charset() {
        let password = generate_password(20);
        assert_eq!(password.len(), 20);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_passwords_differ() {
        assert_ne!(*generate_password(20), *generate_password(20));
    }
}
