//! Versioned, checksummed binary envelope around a serialized artifact

use crate::error::{ArtifactLoadError, RetentionError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Magic bytes at the start of every artifact envelope
pub const ARTIFACT_MAGIC: [u8; 4] = *b"RTNA";
/// Current envelope format version
pub const FORMAT_VERSION: u32 = 1;

/// What an envelope holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Transformer,
    Classifier,
    ProcessedSplit,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Transformer => "transformer",
            ArtifactKind::Classifier => "classifier",
            ArtifactKind::ProcessedSplit => "processed split",
        };
        f.write_str(name)
    }
}

/// Metadata stored next to the payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub kind: ArtifactKind,
    /// Training run shared by every artifact it produced
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    /// Transformed feature names in output order
    pub feature_names: Vec<String>,
    /// Version of the crate that wrote the artifact
    pub crate_version: String,
}

impl ArtifactMetadata {
    pub fn new(kind: ArtifactKind, run_id: impl Into<String>, feature_names: Vec<String>) -> Self {
        Self {
            kind,
            run_id: run_id.into(),
            created_at: Utc::now(),
            feature_names,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// On-disk wrapper: magic, format version, metadata, payload and its SHA-256
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub magic: [u8; 4],
    pub format_version: u32,
    pub metadata: ArtifactMetadata,
    pub payload: Vec<u8>,
    pub sha256: [u8; 32],
}

impl ArtifactEnvelope {
    /// Serialize `value` and wrap it.
    pub fn seal<T: Serialize>(metadata: ArtifactMetadata, value: &T) -> Result<Self> {
        let payload = bincode::serialize(value)?;
        let sha256 = digest(&payload);
        Ok(Self {
            magic: ARTIFACT_MAGIC,
            format_version: FORMAT_VERSION,
            metadata,
            payload,
            sha256,
        })
    }

    pub fn verify_checksum(&self) -> bool {
        digest(&self.payload) == self.sha256
    }

    /// Write the envelope to `path`, replacing any previous file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Readers never observe a half-written artifact
        let tmp = path.with_extension("bin.tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path).map_err(|e| {
            RetentionError::SerializationError(format!("failed to move {} into place: {}", tmp.display(), e))
        })?;
        Ok(())
    }

    /// Read and check an envelope of the expected kind.
    pub fn read(path: &Path, expected: ArtifactKind) -> std::result::Result<Self, ArtifactLoadError> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ArtifactLoadError::Missing(path.to_path_buf()),
            _ => ArtifactLoadError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let corrupt = |reason: String| ArtifactLoadError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        if bytes.len() < ARTIFACT_MAGIC.len() || bytes[..ARTIFACT_MAGIC.len()] != ARTIFACT_MAGIC {
            return Err(corrupt("bad magic bytes".to_string()));
        }

        let envelope: ArtifactEnvelope =
            bincode::deserialize(&bytes).map_err(|e| corrupt(format!("undecodable envelope: {}", e)))?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "format version {} is not supported (expected {})",
                envelope.format_version, FORMAT_VERSION
            )));
        }
        if !envelope.verify_checksum() {
            return Err(corrupt("checksum mismatch".to_string()));
        }
        if envelope.metadata.kind != expected {
            return Err(ArtifactLoadError::WrongKind {
                path: path.to_path_buf(),
                expected: expected.to_string(),
                found: envelope.metadata.kind.to_string(),
            });
        }

        Ok(envelope)
    }

    /// Decode the payload.
    pub fn open<T: DeserializeOwned>(&self, path: &Path) -> std::result::Result<T, ArtifactLoadError> {
        bincode::deserialize(&self.payload).map_err(|e| ArtifactLoadError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("undecodable {}: {}", self.metadata.kind, e),
        })
    }
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metadata(kind: ArtifactKind) -> ArtifactMetadata {
        ArtifactMetadata::new(kind, "run-1", vec!["a".to_string(), "b".to_string()])
    }

    #[test]
    fn test_seal_and_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("value.bin");

        let value = vec![1.5f64, -2.0, 3.25];
        ArtifactEnvelope::seal(metadata(ArtifactKind::Classifier), &value)
            .unwrap()
            .write(&path)
            .unwrap();

        let envelope = ArtifactEnvelope::read(&path, ArtifactKind::Classifier).unwrap();
        assert_eq!(envelope.metadata.run_id, "run-1");
        assert_eq!(envelope.metadata.feature_names, vec!["a", "b"]);
        let back: Vec<f64> = envelope.open(&path).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.bin");
        assert!(matches!(
            ArtifactEnvelope::read(&path, ArtifactKind::Transformer),
            Err(ArtifactLoadError::Missing(_))
        ));
    }

    #[test]
    fn test_flipped_payload_byte_fails_checksum() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("value.bin");
        ArtifactEnvelope::seal(metadata(ArtifactKind::Transformer), &vec![7u64; 16])
            .unwrap()
            .write(&path)
            .unwrap();

        let mut bytes = fs::read(&path).unwrap();
        // Payload precedes the 32-byte digest at the end of the file
        let idx = bytes.len() - 40;
        bytes[idx] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        let err = ArtifactEnvelope::read(&path, ArtifactKind::Transformer).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Corrupt { ref reason, .. } if reason.contains("checksum")));
    }

    #[test]
    fn test_garbage_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("value.bin");
        fs::write(&path, b"not an artifact").unwrap();
        assert!(matches!(
            ArtifactEnvelope::read(&path, ArtifactKind::Transformer),
            Err(ArtifactLoadError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_wrong_kind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("value.bin");
        ArtifactEnvelope::seal(metadata(ArtifactKind::Classifier), &1u8)
            .unwrap()
            .write(&path)
            .unwrap();

        let err = ArtifactEnvelope::read(&path, ArtifactKind::Transformer).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::WrongKind { .. }));
    }
}
