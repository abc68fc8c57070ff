//! Sample records and their on-disk metadata.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SampleLoadError;

/// Name of the metadata file inside every sample directory.
pub const METADATA_FILE_NAME: &str = "sample_metadata.yaml";

/// Raw contents of `sample_metadata.yaml`.
///
/// Every field is optional at the serde level so that a missing or empty
/// required field is reported by name instead of as a generic YAML error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub source_project_name: Option<String>,
    pub issue: Option<String>,
    pub log_detective_version: Option<String>,
    pub log_detective_analysis: Option<String>,
    pub log_file: Option<String>,
    pub references: Option<Vec<String>>,
    pub notes: Option<String>,
    pub api: Option<String>,
}

/// Required metadata fields after validation.
#[derive(Debug, Clone)]
pub struct RequiredFields {
    pub source_project_name: String,
    pub issue: String,
    pub log_detective_version: String,
    pub log_detective_analysis: String,
    pub log_file: String,
}

impl SampleMetadata {
    /// Parse metadata from YAML text.
    pub fn from_yaml(sample_id: &str, content: &str) -> Result<Self, SampleLoadError> {
        serde_yaml::from_str(content).map_err(|e| SampleLoadError::InvalidMetadata {
            sample_id: sample_id.to_string(),
            reason: e.to_string(),
        })
    }

    /// Check that every required field is present and non-empty.
    ///
    /// Fields are checked in a fixed order so the reported field is
    /// deterministic when several are missing.
    pub fn require(&self, sample_id: &str) -> Result<RequiredFields, SampleLoadError> {
        let field = |value: &Option<String>, name: &'static str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| SampleLoadError::MissingField {
                    sample_id: sample_id.to_string(),
                    field: name,
                })
        };

        Ok(RequiredFields {
            source_project_name: field(&self.source_project_name, "source_project_name")?,
            issue: field(&self.issue, "issue")?,
            log_detective_version: field(&self.log_detective_version, "log_detective_version")?,
            log_detective_analysis: field(&self.log_detective_analysis, "log_detective_analysis")?,
            log_file: field(&self.log_file, "log_file")?,
        })
    }
}

/// One labeled test case, fully validated.
#[derive(Debug, Clone)]
pub struct Sample {
    /// UUID-v4 identifier, also the sample directory name.
    pub id: Uuid,
    /// Directory holding the sample.
    pub directory: PathBuf,
    /// Log file name as written in the metadata.
    pub log_file: String,
    /// Absolute or corpus-relative path of the log file.
    pub log_path: PathBuf,
    /// Verbatim log content.
    pub log_content: String,
    pub source_project_name: String,
    /// Ground-truth description of the primary problem in the log.
    pub issue: String,
    /// Analyzer version that produced `log_detective_analysis`. Provenance only.
    pub log_detective_version: String,
    /// Previously recorded analyzer output. Provenance only, never sent to
    /// the analyzer or the judge.
    pub log_detective_analysis: String,
    pub references: Vec<String>,
    pub notes: Option<String>,
    /// Analyzer endpoint variant that produced the stored analysis.
    pub api: Option<String>,
}

impl Sample {
    /// Raw log bytes as submitted to the analyzer.
    pub fn log_bytes(&self) -> &[u8] {
        self.log_content.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
source_project_name: rpm
issue: "Build fails because the %check section cannot find pytest."
log_detective_version: "0.2.11"
log_detective_analysis: "The build failed in %check."
log_file: builder-live.log
references:
  - https://bugzilla.redhat.com/show_bug.cgi?id=1
notes: picked from copr
api: /analyze/staged
"#;

    #[test]
    fn test_parse_full_metadata() {
        let meta = SampleMetadata::from_yaml("id", FULL).expect("valid yaml");
        let required = meta.require("id").expect("all fields present");
        assert_eq!(required.source_project_name, "rpm");
        assert_eq!(required.log_file, "builder-live.log");
        assert_eq!(meta.references.as_ref().map(Vec::len), Some(1));
        assert_eq!(meta.api.as_deref(), Some("/analyze/staged"));
    }

    #[test]
    fn test_missing_issue_reports_field() {
        let yaml = FULL.replace(
            "issue: \"Build fails because the %check section cannot find pytest.\"\n",
            "",
        );
        let meta = SampleMetadata::from_yaml("abc", &yaml).expect("valid yaml");
        let err = meta.require("abc").unwrap_err();
        assert!(matches!(
            err,
            SampleLoadError::MissingField { field: "issue", .. }
        ));
        assert_eq!(err.sample_id(), "abc");
    }

    #[test]
    fn test_blank_field_counts_as_missing() {
        let yaml = FULL.replace("source_project_name: rpm", "source_project_name: \"   \"");
        let meta = SampleMetadata::from_yaml("abc", &yaml).expect("valid yaml");
        assert!(matches!(
            meta.require("abc"),
            Err(SampleLoadError::MissingField {
                field: "source_project_name",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = SampleMetadata::from_yaml("abc", "issue: [unterminated");
        assert!(matches!(
            result,
            Err(SampleLoadError::InvalidMetadata { .. })
        ));
    }
}
