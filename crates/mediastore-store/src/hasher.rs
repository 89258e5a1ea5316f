use mediastore_types::ObjectId;

/// Domain-separated BLAKE3 hasher.
///
/// The domain tag is fed to the hasher ahead of the data, so a blob and a
/// tree with identical bytes never share an id.
#[derive(Clone, Copy, Debug)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for file contents.
    pub const BLOB: Self = Self::new("mediastore-blob-v1");
    /// Hasher for directory listings.
    pub const TREE: Self = Self::new("mediastore-tree-v1");

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(ContentHasher::BLOB.hash(b"jpeg"), ContentHasher::BLOB.hash(b"jpeg"));
    }

    #[test]
    fn domains_separate_hashes() {
        assert_ne!(ContentHasher::BLOB.hash(b"same"), ContentHasher::TREE.hash(b"same"));
        assert_ne!(ContentHasher::BLOB.hash(b"same"), ObjectId::from_bytes(b"same"));
    }
}
