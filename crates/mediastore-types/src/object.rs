use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of an object in the native content store.
///
/// An `ObjectId` is a 32-byte BLAKE3 digest. The native store derives it from
/// a domain tag plus the object bytes, so the same content always maps to the
/// same id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// Hash raw bytes without a domain tag.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap a digest computed elsewhere.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The all-zero id, never produced by hashing.
    pub const fn null() -> Self {
        Self([0u8; 32])
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Split the hex form into a 2-character fan-out directory and the rest.
    pub fn fanout(&self) -> (String, String) {
        let hex = self.to_hex();
        let (dir, rest) = hex.split_at(2);
        (dir.to_string(), rest.to_string())
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| TypeError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for ObjectId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(ObjectId::from_bytes(b"img"), ObjectId::from_bytes(b"img"));
        assert_ne!(ObjectId::from_bytes(b"cat"), ObjectId::from_bytes(b"dog"));
    }

    #[test]
    fn hex_roundtrip() {
        let id = ObjectId::from_bytes(b"photo.jpeg");
        assert_eq!(ObjectId::from_hex(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(matches!(ObjectId::from_hex("zz"), Err(TypeError::InvalidHex(_))));
        assert_eq!(
            ObjectId::from_hex("abcd").unwrap_err(),
            TypeError::InvalidLength { expected: 32, actual: 2 }
        );
    }

    #[test]
    fn fanout_splits_after_two_chars() {
        let id = ObjectId::from_bytes(b"x");
        let (dir, rest) = id.fanout();
        assert_eq!(dir.len(), 2);
        assert_eq!(rest.len(), 62);
        assert_eq!(format!("{dir}{rest}"), id.to_hex());
    }

    #[test]
    fn null_is_never_a_hash() {
        assert!(ObjectId::null().is_null());
        assert!(!ObjectId::from_bytes(b"").is_null());
    }
}
