use super::{OutputFormat, RenderedArtifact};
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 of `content`, hex encoded.
#[must_use]
pub fn checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Describes a persisted artifact to whoever downloads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDescriptor {
    /// Format of the primary rendering.
    pub format: OutputFormat,
    /// Suggested file name.
    pub filename: String,
    /// Size in bytes.
    pub size_bytes: usize,
    /// SHA-256 of the content, hex encoded.
    pub checksum: String,
    /// When the stored copy expires.
    pub expires_at: Timestamp,
}

impl DeliveryDescriptor {
    /// Describes `artifact`.
    #[must_use]
    pub fn for_artifact(artifact: &RenderedArtifact, expires_at: Timestamp) -> Self {
        Self {
            format: artifact.format,
            filename: artifact.filename.clone(),
            size_bytes: artifact.size_bytes,
            checksum: checksum(&artifact.content),
            expires_at,
        }
    }

    /// Returns true if `content` matches the recorded checksum.
    #[must_use]
    pub fn verify(&self, content: &str) -> bool {
        checksum(content) == self.checksum
    }
}
