//! Labeled sample corpus.
//!
//! Discovers UUID-named sample directories and validates their metadata and
//! log files before anything is sent to the analyzer.

pub mod loader;
pub mod sample;

pub use loader::{parse_sample_id, SampleDir, SampleLoader};
pub use sample::{RequiredFields, Sample, SampleMetadata, METADATA_FILE_NAME};
