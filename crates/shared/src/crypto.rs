//! Cryptographic utilities for signed-user identities.
//!
//! Signed users are never stored with their plaintext e-mail or token. Both are
//! replaced by a keyed BLAKE2b digest (16-byte output, hex encoded) computed
//! with a process-wide secret.

use blake2::digest::consts::U16;
use blake2::digest::Mac;
use blake2::Blake2bMac;

/// Length of the secret key in bytes.
pub const SIGNED_KEY_LEN: usize = 16;

/// Length of a hex encoded digest.
pub const DIGEST_HEX_LEN: usize = 32;

type Blake2b128Mac = Blake2bMac<U16>;

/// Error raised when the configured signed key cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("signed key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("signed key must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Secret key used for identity digests.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedKey([u8; SIGNED_KEY_LEN]);

impl SignedKey {
    /// Builds a key from raw bytes.
    pub fn new(bytes: [u8; SIGNED_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses a key from its hex representation (32 hex characters).
    pub fn from_hex(value: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(value.trim())?;
        let actual = bytes.len();
        let bytes: [u8; SIGNED_KEY_LEN] =
            bytes.try_into().map_err(|_| KeyError::InvalidLength {
                expected: SIGNED_KEY_LEN,
                actual,
            })?;
        Ok(Self(bytes))
    }

    /// Computes `hex(BLAKE2b(key, size=16, data=input))`.
    pub fn digest(&self, input: &str) -> String {
        let mut mac = <Blake2b128Mac as Mac>::new_from_slice(&self.0)
            .expect("BLAKE2b accepts keys up to 64 bytes");
        mac.update(input.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for SignedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SignedKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> SignedKey {
        SignedKey::from_hex("000102030405060708090a0b0c0d0e0f").unwrap()
    }

    #[test]
    fn test_digest_length_and_charset() {
        let digest = test_key().digest("player@example.com");
        assert_eq!(digest.len(), DIGEST_HEX_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_digest_deterministic() {
        let key = test_key();
        assert_eq!(key.digest("01012000"), key.digest("01012000"));
    }

    #[test]
    fn test_digest_differs_per_input() {
        let key = test_key();
        assert_ne!(key.digest("01012000"), key.digest("02012000"));
    }

    #[test]
    fn test_digest_differs_per_key() {
        let other = SignedKey::new([7u8; SIGNED_KEY_LEN]);
        assert_ne!(test_key().digest("same"), other.digest("same"));
    }

    #[test]
    fn test_digest_empty_input() {
        assert_eq!(test_key().digest("").len(), DIGEST_HEX_LEN);
    }

    #[test]
    fn test_from_hex_invalid_chars() {
        assert!(matches!(
            SignedKey::from_hex("zz0102030405060708090a0b0c0d0e0f"),
            Err(KeyError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_from_hex_wrong_length() {
        match SignedKey::from_hex("0001020304") {
            Err(KeyError::InvalidLength { expected, actual }) => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 5);
            }
            other => panic!("Expected InvalidLength, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_key() {
        assert_eq!(format!("{:?}", test_key()), "SignedKey(..)");
    }
}
