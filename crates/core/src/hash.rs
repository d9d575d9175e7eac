//! Blake3 hashing utilities for the ledger.
//!
//! Digests are compared as raw bytes but rendered as uppercase hex. Whenever
//! the ledger feeds digests back into the hash function (Merkle folding,
//! miner data) it concatenates their hex text, not their bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit hash.
pub type H256 = [u8; 32];

/// Number of hex characters in a rendered digest.
pub const HEX_LEN: usize = 64;

/// A wrapper type for H256 with Display and Debug formatting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash(pub H256);

impl Hash {
    /// The zero hash (all zeros). Doubles as the genesis sentinel.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a new Hash from raw bytes.
    pub fn from_bytes(bytes: H256) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    /// Convert to an uppercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Parse from a hex string. Either case is accepted.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Count the leading `'0'` characters of the hex rendering.
    pub fn leading_zeros_hex(&self) -> u32 {
        let mut count = 0;
        for byte in self.0 {
            if byte == 0 {
                count += 2;
            } else {
                if byte >> 4 == 0 {
                    count += 1;
                }
                break;
            }
        }
        count
    }

    /// Check that the first `difficulty` hex characters are all `'0'`.
    ///
    /// A difficulty of 0 accepts every digest; anything above 64 accepts none.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.leading_zeros_hex() >= difficulty
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<H256> for Hash {
    fn from(bytes: H256) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for H256 {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Hash arbitrary data using Blake3.
pub fn hash(data: &[u8]) -> Hash {
    Hash(blake3::hash(data).into())
}

/// Hash multiple pieces of data by concatenating them.
pub fn hash_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    Hash(hasher.finalize().into())
}

/// Hash the concatenated hex renderings of two digests.
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    hash_concat(&[left.to_hex().as_bytes(), right.to_hex().as_bytes()])
}

/// Hash a decimal nonce followed by the miner data string.
pub fn hash_with_nonce(nonce: u64, data: &str) -> Hash {
    hash_concat(&[nonce.to_string().as_bytes(), data.as_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello world";
        let h1 = hash(data);
        let h2 = hash(data);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_different_inputs() {
        let h1 = hash(b"hello");
        let h2 = hash(b"world");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_hash_hex_is_uppercase() {
        let h = hash(b"test data");
        let hex_str = h.to_hex();
        assert_eq!(hex_str.len(), HEX_LEN);
        assert_eq!(hex_str, hex_str.to_uppercase());
        assert_eq!(Hash::from_hex(&hex_str.to_lowercase()).unwrap(), h);
    }

    #[test]
    fn test_hash_display() {
        let h = hash(b"test");
        assert_eq!(format!("{}", h), h.to_hex());
    }

    #[test]
    fn test_hash_concat() {
        let h1 = hash_concat(&[b"hello", b"world"]);
        let h2 = hash(b"helloworld");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_pair_uses_hex_text() {
        let a = hash(b"a");
        let b = hash(b"b");
        let expected = hash(format!("{}{}", a.to_hex(), b.to_hex()).as_bytes());
        assert_eq!(hash_pair(&a, &b), expected);
        assert_ne!(hash_pair(&a, &b), hash_pair(&b, &a));
    }

    #[test]
    fn test_hash_with_nonce() {
        assert_eq!(hash_with_nonce(42, "abc"), hash(b"42abc"));
    }

    #[test]
    fn test_zero_hash() {
        assert_eq!(Hash::ZERO.0, [0u8; 32]);
        assert_eq!(Hash::ZERO.to_hex(), "0".repeat(HEX_LEN));
        assert_eq!(Hash::ZERO.leading_zeros_hex(), 64);
    }

    #[test]
    fn test_leading_zeros_hex() {
        let mut bytes = [0xFFu8; 32];
        assert_eq!(Hash(bytes).leading_zeros_hex(), 0);

        bytes[0] = 0x0F;
        assert_eq!(Hash(bytes).leading_zeros_hex(), 1);

        bytes[0] = 0x00;
        bytes[1] = 0x0A;
        assert_eq!(Hash(bytes).leading_zeros_hex(), 3);
    }

    #[test]
    fn test_meets_difficulty() {
        let mut bytes = [0xABu8; 32];
        bytes[0] = 0x00;
        let h = Hash(bytes);

        assert!(h.meets_difficulty(0));
        assert!(h.meets_difficulty(2));
        assert!(!h.meets_difficulty(3));
        assert!(Hash::ZERO.meets_difficulty(64));
        assert!(!Hash::ZERO.meets_difficulty(65));
    }
}
