//! Durable artifact storage
//!
//! ## File layout
//!
//! ```text
//! ┌──────────┬────────────────┬───────────┬──────────────────────────────┐
//! │ "UMAT"   │ format (u16 LE)│ codec (u8)│ compressed JSON ModelArtifact│
//! │ 4 bytes  │ 2 bytes        │ 1 byte    │ ...                          │
//! └──────────┴────────────────┴───────────┴──────────────────────────────┘
//! ```
//!
//! Writes go to a sibling temp file that is renamed over the target, so a
//! reader sees either the previous artifact or the new one.
//!
//! ## Example
//!
//! ```rust,no_run
//! use unimatch::store::ModelStore;
//!
//! let store = ModelStore::new("models/admission_model.umat");
//! match store.load() {
//!     Some(artifact) => println!("best: {}", artifact.best_family()),
//!     None => println!("no usable model, heuristic only"),
//! }
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::artifact::ModelArtifact;
use crate::{Error, Result};

/// File magic
pub const MAGIC: &[u8; 4] = b"UMAT";

/// Container format version
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 7;

/// Payload compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// LZ4 - fast, the default
    #[default]
    Lz4,
    /// ZSTD - smaller files, slower
    Zstd,
}

impl Compression {
    /// Codec name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }

    /// Header byte
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Lz4 => 0,
            Self::Zstd => 1,
        }
    }

    /// Codec for a header byte
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Lz4),
            1 => Some(Self::Zstd),
            _ => None,
        }
    }

    /// Compress data using this algorithm
    ///
    /// # Errors
    /// Returns error if compression fails (e.g., ZSTD internal error)
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
            Self::Zstd => zstd::encode_all(data, 3)
                .map_err(|e| Error::StorageError(format!("ZSTD compression failed: {e}"))),
        }
    }

    /// Decompress data using this algorithm
    ///
    /// # Errors
    /// Returns error if decompression fails (e.g., corrupted data)
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Lz4 => lz4_flex::decompress_size_prepended(data)
                .map_err(|e| Error::ArtifactCorrupt(format!("LZ4 decompression failed: {e}"))),
            Self::Zstd => zstd::decode_all(data)
                .map_err(|e| Error::ArtifactCorrupt(format!("ZSTD decompression failed: {e}"))),
        }
    }
}

/// Single-writer owner of the artifact file.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
    compression: Compression,
}

impl ModelStore {
    /// Store at `path` using LZ4
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            compression: Compression::default(),
        }
    }

    /// Use a different codec for subsequent saves
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Artifact path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Codec used by [`Self::save`]
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }

    /// Whether an artifact file is present (it may still be unusable)
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Persist `artifact`, atomically replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns IO errors, JSON errors, or [`Error::StorageError`] if
    /// compression or the final rename fails.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<()> {
        let bytes = encode(artifact, self.compression)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::StorageError(format!("invalid artifact path: {}", self.path.display())))?;
        let tmp = dir.join(format!(".{file_name}.tmp-{}", std::process::id()));

        let write = || -> Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::StorageError(format!("failed to replace {}: {e}", self.path.display()))
        })?;

        tracing::info!(
            path = %self.path.display(),
            bytes = bytes.len(),
            codec = self.compression.as_str(),
            best = %artifact.best_family(),
            "saved model artifact"
        );
        Ok(())
    }

    /// Load and validate the artifact, reporting why it is unusable.
    ///
    /// # Errors
    ///
    /// Returns IO errors for a missing/unreadable file,
    /// [`Error::ArtifactCorrupt`] for bad bytes and
    /// [`Error::SchemaMismatch`] for an incompatible artifact.
    pub fn try_load(&self) -> Result<ModelArtifact> {
        let bytes = fs::read(&self.path)?;
        let artifact = decode(&bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Load the artifact, or `None` if it is absent or unusable.
    ///
    /// Failures other than a missing file are logged at warn level.
    #[must_use]
    pub fn load(&self) -> Option<ModelArtifact> {
        if !self.exists() {
            tracing::debug!(path = %self.path.display(), "no model artifact");
            return None;
        }
        match self.try_load() {
            Ok(artifact) => {
                tracing::info!(
                    path = %self.path.display(),
                    best = %artifact.best_family(),
                    auc = artifact.best_score(),
                    "loaded model artifact"
                );
                Some(artifact)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unusable model artifact");
                None
            }
        }
    }
}

/// Serialize an artifact into the container format
///
/// # Errors
///
/// Returns JSON or compression errors.
pub fn encode(artifact: &ModelArtifact, compression: Compression) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(artifact)?;
    let payload = compression.compress(&json)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.push(compression.tag());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Parse the container format (no schema validation)
///
/// # Errors
///
/// Returns [`Error::ArtifactCorrupt`] for a bad header or payload and
/// [`Error::SchemaMismatch`] for an unknown container version.
pub fn decode(bytes: &[u8]) -> Result<ModelArtifact> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(Error::ArtifactCorrupt("missing UMAT header".to_string()));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(Error::SchemaMismatch {
            expected: format!("format version {FORMAT_VERSION}"),
            found: format!("format version {version}"),
        });
    }
    let compression = Compression::from_tag(bytes[6])
        .ok_or_else(|| Error::ArtifactCorrupt(format!("unknown codec tag {}", bytes[6])))?;

    let json = compression.decompress(&bytes[HEADER_LEN..])?;
    serde_json::from_slice(&json).map_err(|e| Error::ArtifactCorrupt(format!("invalid payload: {e}")))
}
