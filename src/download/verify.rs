//! Post-download artifact verification
//!
//! A completed transfer is checked against the catalog-declared size and,
//! when one is published, a sha256 checksum. Catalog sizes are rounded GB
//! figures, so the size check uses the exact transferred byte count when the
//! source reported one and a tolerance band otherwise.

use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Allowed deviation from the rounded catalog size
const SIZE_TOLERANCE: f64 = 0.05;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Verification failures; all map to `ErrorKind::IntegrityMismatch`
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("artifact missing at {0}")]
    Missing(String),

    #[error("size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("size {actual_gb:.2} GB outside tolerance of declared {declared_gb:.2} GB")]
    SizeOutOfTolerance { declared_gb: f64, actual_gb: f64 },

    #[error("checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("could not read artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Verifies a downloaded artifact
///
/// `transferred_bytes` is the byte count reported by the transfer (exact
/// match required when non-zero); `declared_gb` is the catalog figure used
/// as a tolerance check; `expected_sha256` is checked when present.
pub async fn verify_artifact(
    path: &Path,
    transferred_bytes: u64,
    declared_gb: f64,
    expected_sha256: Option<&str>,
) -> Result<(), VerifyError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|_| VerifyError::Missing(path.display().to_string()))?;
    let actual = metadata.len();

    if transferred_bytes > 0 && actual != transferred_bytes {
        return Err(VerifyError::SizeMismatch {
            expected: transferred_bytes,
            actual,
        });
    }

    let actual_gb = actual as f64 / BYTES_PER_GB;
    if declared_gb > 0.0 {
        let deviation = (actual_gb - declared_gb).abs() / declared_gb;
        if deviation > SIZE_TOLERANCE {
            return Err(VerifyError::SizeOutOfTolerance {
                declared_gb,
                actual_gb,
            });
        }
    }

    if let Some(expected) = expected_sha256 {
        let actual = sha256_file(path).await?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(VerifyError::ChecksumMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
        debug!("checksum verified for {}", path.display());
    }

    Ok(())
}

/// Computes the sha256 of a file as a lowercase hex string
pub async fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    #[tokio::test]
    async fn test_exact_byte_count_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.gguf");
        tokio::fs::write(&path, vec![0u8; 100]).await.unwrap();

        assert!(verify_artifact(&path, 100, 0.0, None).await.is_ok());
        let err = verify_artifact(&path, 99, 0.0, None).await.unwrap_err();
        assert!(matches!(err, VerifyError::SizeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_declared_size_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.gguf");
        // 1 MiB file, declared as 1 MiB-ish in GB terms
        tokio::fs::write(&path, vec![0u8; 1024 * 1024]).await.unwrap();
        let declared = (1024.0 * 1024.0) / GB;

        assert!(verify_artifact(&path, 0, declared, None).await.is_ok());
        assert!(verify_artifact(&path, 0, declared * 1.04, None).await.is_ok());
        let err = verify_artifact(&path, 0, declared * 2.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::SizeOutOfTolerance { .. }));
    }

    #[tokio::test]
    async fn test_checksum_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.gguf");
        tokio::fs::write(&path, b"hello world").await.unwrap();

        // sha256("hello world")
        let good = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
        assert!(verify_artifact(&path, 11, 0.0, Some(good)).await.is_ok());
        // Case-insensitive comparison
        assert!(verify_artifact(&path, 11, 0.0, Some(&good.to_uppercase()))
            .await
            .is_ok());

        let err = verify_artifact(&path, 11, 0.0, Some("deadbeef"))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::ChecksumMismatch { .. }));
    }

    #[tokio::test]
    async fn test_missing_artifact() {
        let err = verify_artifact(Path::new("/nonexistent/m.gguf"), 0, 0.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::Missing(_)));
    }
}
