use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::IssueClassifier;

/// Version of the on-disk model layout written by this crate.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Default location of the trained model, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "Website/GithubClassifier.json";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Unsupported model format version {found} (expected {expected})")]
    IncompatibleFormat { found: u32, expected: u32 },
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}

/// On-disk envelope: the serialized classifier plus what is needed to
/// recognise a truncated, edited or foreign file.
#[derive(Debug, Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    checksum: String,
    payload: String,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Saves and loads the trained model file.
#[derive(Debug, Clone)]
pub struct ModelManager {
    model_path: PathBuf,
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_PATH)
    }
}

impl ModelManager {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_model_saved(&self) -> bool {
        self.model_path.exists()
    }

    /// Serializes the classifier and writes it, creating parent directories.
    pub fn save(&self, classifier: &IssueClassifier) -> Result<(), ModelError> {
        let payload = serde_json::to_string(classifier)?;
        let artifact = ModelArtifact {
            format_version: MODEL_FORMAT_VERSION,
            checksum: sha256_hex(payload.as_bytes()),
            payload,
        };

        if let Some(parent) = self.model_path.parent() {
            if !parent.as_os_str().is_empty() {
                log::info!("Creating model directory at {:?}", parent);
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec(&artifact)?;
        log::info!("Writing {} bytes to {:?}", bytes.len(), self.model_path);
        fs::write(&self.model_path, bytes)?;
        Ok(())
    }

    fn read_artifact(&self) -> Result<ModelArtifact, ModelError> {
        if !self.model_path.exists() {
            return Err(ModelError::NotFound(self.model_path.display().to_string()));
        }
        let bytes = fs::read(&self.model_path)?;
        log::info!("Read {} bytes from {:?}", bytes.len(), self.model_path);
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;

        if artifact.format_version != MODEL_FORMAT_VERSION {
            return Err(ModelError::IncompatibleFormat {
                found: artifact.format_version,
                expected: MODEL_FORMAT_VERSION,
            });
        }
        Ok(artifact)
    }

    fn verify_artifact(artifact: &ModelArtifact) -> Result<(), ModelError> {
        let actual = sha256_hex(artifact.payload.as_bytes());
        log::debug!("Calculated hash: {}", actual);
        log::debug!("Expected hash:   {}", artifact.checksum);
        if actual != artifact.checksum {
            log::error!("Model hash mismatch: expected {}, got {}", artifact.checksum, actual);
            return Err(ModelError::HashMismatch {
                expected: artifact.checksum.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Checks that the saved file exists, has a known format and an intact
    /// payload, without deserializing the classifier.
    pub fn verify_model(&self) -> Result<bool, ModelError> {
        match self.read_artifact() {
            Ok(artifact) => Ok(Self::verify_artifact(&artifact).is_ok()),
            Err(ModelError::NotFound(_)) => Ok(false),
            Err(ModelError::IncompatibleFormat { .. }) => Ok(false),
            Err(ModelError::SerializationError(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn load(&self) -> Result<IssueClassifier, ModelError> {
        let artifact = self.read_artifact()?;
        Self::verify_artifact(&artifact)?;
        let classifier = serde_json::from_str(&artifact.payload)?;
        log::info!("Model loaded from {:?}", self.model_path);
        Ok(classifier)
    }

    pub fn remove(&self) -> Result<(), ModelError> {
        if self.model_path.exists() {
            fs::remove_file(&self.model_path)?;
        }
        Ok(())
    }
}
