//! Short key identifier used for matching and file naming.

use std::fmt;

use pgp::types::{KeyId, PublicKeyTrait};

/// The 8-byte OpenPGP key ID of a primary key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 8]);

impl Fingerprint {
    /// Creates a fingerprint from raw big-endian bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Returns the fingerprint as raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Converts an OpenPGP key ID.
    pub fn from_key_id(key_id: &KeyId) -> Self {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(key_id.as_ref());
        Self(bytes)
    }

    /// Derives the fingerprint of any OpenPGP key.
    pub fn of(key: &impl PublicKeyTrait) -> Self {
        Self::from_key_id(&key.key_id())
    }

    /// Returns the fingerprint as a big-endian integer.
    pub fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Returns the fingerprint as 16 lowercase hex characters.
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_output() {
        let fp = Fingerprint::from_bytes([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x02, 0x0a]);
        assert_eq!(fp.to_hex(), "deadbeef0001020a");
        assert_eq!(fp.to_string(), "deadbeef0001020a");
        assert_eq!(fp.to_u64(), 0xdead_beef_0001_020a);
    }

    #[test]
    fn test_leading_zeros_kept() {
        let fp = Fingerprint::from_bytes([0u8; 8]);
        assert_eq!(fp.to_hex(), "0000000000000000");
    }

    #[test]
    fn test_from_key_id() {
        let key_id = KeyId::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let fp = Fingerprint::from_key_id(&key_id);
        assert_eq!(fp.to_hex(), "0102030405060708");
        assert_eq!(fp.to_hex(), format!("{:x}", key_id));
    }
}
