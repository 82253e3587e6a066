//! Ledger keys and key hashes.
//!
//! A [`LedgerKey`] is the 33-byte compressed secp256k1 public key a member
//! uses on the ledger. The engine treats keys as opaque: it only compares,
//! orders, hashes and prints them.
//!
//! [`KeyHash`] is the SHA-256 digest of a key's encoded bytes. Vault queries
//! filter owners by key hash rather than by raw key.

use std::fmt;

use bitcoin::hashes::{Hash, sha256};

// ---------------------------------------------------------------------------
// LedgerKey
// ---------------------------------------------------------------------------

/// Compressed secp256k1 public key identifying a party on the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerKey([u8; 33]);

impl LedgerKey {
    /// Wraps raw compressed public key bytes.
    pub const fn from_bytes(bytes: [u8; 33]) -> Self {
        Self(bytes)
    }

    /// Returns the encoded key bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Returns the key as a lowercase hex string (66 chars).
    pub fn to_hex(&self) -> String {
        hex_encode(&self.0, HEX_LOWER)
    }

    /// SHA-256 digest of the encoded key.
    pub fn hash(&self) -> KeyHash {
        KeyHash(sha256::Hash::hash(&self.0).to_byte_array())
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// Short form: full keys make plan dumps unreadable.
impl fmt::Debug for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "LedgerKey({}..)", &hex[..12])
    }
}

// ---------------------------------------------------------------------------
// KeyHash
// ---------------------------------------------------------------------------

/// SHA-256 digest of a [`LedgerKey`].
///
/// Displays as `SHA-256:<UPPERCASE HEX>`, the form vault queries take as
/// their owner parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyHash([u8; 32]);

impl KeyHash {
    /// Name of the digest algorithm, used as the display prefix.
    pub const ALGORITHM: &'static str = "SHA-256";

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", Self::ALGORITHM, hex_encode(&self.0, HEX_UPPER))
    }
}

// ---------------------------------------------------------------------------
// Hex
// ---------------------------------------------------------------------------

const HEX_LOWER: &[u8; 16] = b"0123456789abcdef";
const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

fn hex_encode(bytes: &[u8], alphabet: &[u8; 16]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        s.push(alphabet[(b >> 4) as usize] as char);
        s.push(alphabet[(b & 0x0f) as usize] as char);
    }
    s
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key(last: u8) -> LedgerKey {
        let mut bytes = [0u8; 33];
        bytes[0] = 0x02;
        bytes[32] = last;
        LedgerKey::from_bytes(bytes)
    }

    #[test]
    fn hex_is_lowercase_and_full_length() {
        let hex = key(0xAB).to_hex();
        assert_eq!(hex.len(), 66);
        assert!(hex.starts_with("02"));
        assert!(hex.ends_with("ab"));
    }

    #[test]
    fn hash_is_deterministic_and_key_specific() {
        assert_eq!(key(1).hash(), key(1).hash());
        assert_ne!(key(1).hash(), key(2).hash());
    }

    #[test]
    fn hash_display_has_algorithm_prefix() {
        let printed = key(1).hash().to_string();
        assert!(printed.starts_with("SHA-256:"));
        assert_eq!(printed.len(), "SHA-256:".len() + 64);
        assert!(!printed[8..].contains(char::is_lowercase));
    }

    #[test]
    fn hash_matches_sha256_of_encoding() {
        let k = key(7);
        let expected = sha256::Hash::hash(k.as_bytes()).to_byte_array();
        assert_eq!(k.hash().as_bytes(), &expected);
    }

    #[test]
    fn debug_is_abbreviated() {
        let printed = format!("{:?}", key(1));
        assert!(printed.starts_with("LedgerKey(020000"));
        assert!(printed.ends_with("..)"));
    }
}
