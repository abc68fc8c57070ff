//! Corpus discovery and sample loading.
//!
//! A corpus is a directory whose immediate subdirectories are samples, each
//! named by a UUID-v4 and holding `sample_metadata.yaml` plus the original
//! build log. Discovery is lazy: directories are listed on demand and each
//! sample is read only when [`SampleDir::load`] is called, so a worker can
//! own its sample from loading to scoring.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use uuid::{Uuid, Version};
use walkdir::WalkDir;

use super::sample::{Sample, SampleMetadata, METADATA_FILE_NAME};
use crate::error::{ConfigError, SampleLoadError};

/// Entry point for reading a sample corpus.
#[derive(Debug, Clone)]
pub struct SampleLoader {
    root: PathBuf,
}

/// A sample directory whose name is a valid UUID-v4, not yet read.
#[derive(Debug, Clone)]
pub struct SampleDir {
    pub id: Uuid,
    pub path: PathBuf,
}

impl SampleLoader {
    /// Open a corpus rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the root does not exist or is not a
    /// directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        if !root.exists() {
            return Err(ConfigError::CorpusNotFound(root));
        }
        if !root.is_dir() {
            return Err(ConfigError::CorpusNotDirectory(root));
        }
        Ok(Self { root })
    }

    /// Corpus root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily list candidate sample directories in name order.
    ///
    /// Directories whose name is not a UUID-v4 are skipped with a warning.
    pub fn candidates(&self) -> impl Iterator<Item = SampleDir> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Failed to read corpus entry, skipping");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy();
                match parse_sample_id(&name) {
                    Some(id) => Some(SampleDir {
                        id,
                        path: entry.path().to_path_buf(),
                    }),
                    None => {
                        warn!(
                            directory = %entry.path().display(),
                            "Directory name is not a UUID-v4, skipping"
                        );
                        None
                    }
                }
            })
    }

    /// Lazily load every candidate sample.
    pub fn samples(&self) -> impl Iterator<Item = Result<Sample, SampleLoadError>> + '_ {
        self.candidates().map(|dir| dir.load())
    }
}

/// Parse a directory name as a hyphenated UUID-v4.
pub fn parse_sample_id(name: &str) -> Option<Uuid> {
    if name.len() != uuid::fmt::Hyphenated::LENGTH {
        return None;
    }
    Uuid::parse_str(name)
        .ok()
        .filter(|id| id.get_version() == Some(Version::Random))
}

impl SampleDir {
    /// Read and validate the metadata and log file of this sample.
    pub fn load(&self) -> Result<Sample, SampleLoadError> {
        let sample_id = self.id.to_string();
        let metadata_path = self.path.join(METADATA_FILE_NAME);

        let content =
            fs::read_to_string(&metadata_path).map_err(|e| SampleLoadError::MetadataUnreadable {
                sample_id: sample_id.clone(),
                path: metadata_path.clone(),
                reason: e.to_string(),
            })?;

        let metadata = SampleMetadata::from_yaml(&sample_id, &content)?;
        let required = metadata.require(&sample_id)?;

        let log_path = self.resolve_log_path(&sample_id, &required.log_file)?;
        let log_content = read_log(&sample_id, &log_path)?;

        debug!(
            sample_id = %sample_id,
            log_bytes = log_content.len(),
            "Loaded sample"
        );

        Ok(Sample {
            id: self.id,
            directory: self.path.clone(),
            log_file: required.log_file,
            log_path,
            log_content,
            source_project_name: required.source_project_name,
            issue: required.issue,
            log_detective_version: required.log_detective_version,
            log_detective_analysis: required.log_detective_analysis,
            references: metadata.references.unwrap_or_default(),
            notes: metadata.notes,
            api: metadata.api,
        })
    }

    /// The log file must live inside the sample directory.
    fn resolve_log_path(&self, sample_id: &str, log_file: &str) -> Result<PathBuf, SampleLoadError> {
        let relative = Path::new(log_file);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(SampleLoadError::LogFileError {
                sample_id: sample_id.to_string(),
                path: relative.to_path_buf(),
                reason: "log_file must be a path inside the sample directory".to_string(),
            });
        }
        Ok(self.path.join(relative))
    }
}

/// Read the log verbatim. The content must exist, be non-empty and be valid
/// UTF-8 text.
fn read_log(sample_id: &str, path: &Path) -> Result<String, SampleLoadError> {
    let log_error = |reason: String| SampleLoadError::LogFileError {
        sample_id: sample_id.to_string(),
        path: path.to_path_buf(),
        reason,
    };

    let bytes = fs::read(path).map_err(|e| log_error(e.to_string()))?;
    if bytes.is_empty() {
        return Err(log_error("log file is empty".to_string()));
    }
    String::from_utf8(bytes)
        .map_err(|e| log_error(format!("log file is not plain text: {}", e.utf8_error())))
}
