//! SHA-256 digests of generated sources
//!
//! Lets a build compare two preparations for byte-identical output.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::error::PrepareError;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Digest of a file's current contents
pub fn file_digest(path: &Path) -> Result<String, PrepareError> {
    let data = fs::read(path).map_err(|e| PrepareError::io(path, e))?;
    Ok(sha256_hex(&data))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_file_digest_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        fs::write(&path, b"int x;\n").unwrap();
        assert_eq!(file_digest(&path).unwrap(), sha256_hex(b"int x;\n"));
    }

    #[test]
    fn test_file_digest_missing_file() {
        let err = file_digest(Path::new("/nonexistent/extgen/a.c")).unwrap_err();
        assert!(matches!(err, PrepareError::Io { .. }));
    }
}
