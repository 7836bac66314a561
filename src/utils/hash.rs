use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;

/// Compute SHA-256 hash of a byte slice
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Compute SHA-256 hash and size of a file's contents
pub async fn compute_file_digest(path: &Path) -> Result<(String, u64), std::io::Error> {
    let content = fs::read(path).await?;
    Ok((compute_hash(&content), content.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_hash() {
        let hash = compute_hash(b"hello world");
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn test_compute_file_digest_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams.json");
        fs::write(&path, b"hello world").await.unwrap();

        let (hash, size) = compute_file_digest(&path).await.unwrap();
        assert_eq!(size, 11);
        assert_eq!(hash, compute_hash(b"hello world"));
    }
}
