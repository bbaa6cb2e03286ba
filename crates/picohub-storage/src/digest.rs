use sha2::{Digest, Sha256};

/// Incremental SHA-256 accumulator fed by the streaming copy.
#[derive(Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    /// Lowercase hex digest of everything fed so far.
    pub fn finalize_hex(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_digest() {
        assert_eq!(
            ContentHasher::new().finalize_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn chunked_input_matches_single_shot() {
        let mut chunked = ContentHasher::new();
        chunked.update(b"hello ");
        chunked.update(b"world");
        let single = hex::encode(Sha256::digest(b"hello world"));
        assert_eq!(chunked.finalize_hex(), single);
    }
}
