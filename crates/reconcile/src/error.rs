//! Error types for extraction, matching and task generation.
//!
//! Per-file variants (parse failures, unknown tags, duplicate logical ids)
//! are recoverable: the directory-level extractors log them and drop the
//! offending file. Everything else aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reconciling Terraform and CloudFormation.
#[derive(Debug, Error)]
pub enum Error {
    /// The Terraform root directory does not exist or is not a directory
    #[error("Terraform directory not found: {}", path.display())]
    SourceRootMissing {
        /// Directory that was requested
        path: PathBuf,
    },

    /// The CloudFormation `templates` directory does not exist
    #[error("CloudFormation templates directory not found: {}", path.display())]
    TemplatesMissing {
        /// Directory that was requested
        path: PathBuf,
    },

    /// A file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An HCL file failed to parse
    #[error("could not parse HCL in {}: {message}", path.display())]
    Hcl {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A CloudFormation template failed to parse as YAML
    #[error("could not parse template {}: {source}", path.display())]
    Yaml {
        /// Template that failed to parse
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// A template used a `!Tag` outside the known intrinsic function set
    #[error("unsupported intrinsic tag {tag} in {}", path.display())]
    UnknownTag {
        /// Template containing the tag
        path: PathBuf,
        /// The tag as written, including the leading `!`
        tag: String,
    },

    /// A logical id was already declared by an earlier template
    #[error("duplicate logical id {logical_id} in {} (first declared in {first})", path.display())]
    DuplicateLogicalId {
        /// Template that redeclared the id
        path: PathBuf,
        /// The clashing logical id
        logical_id: String,
        /// Template that declared it first
        first: String,
    },

    /// The resolved plan document is not valid plan JSON
    #[error("invalid plan document {}: {source}", path.display())]
    Plan {
        /// Plan file
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// An output file could not be written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File or directory that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Report serialization failed
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error only invalidates a single input file.
    ///
    /// Extractors absorb these with a warning and keep going.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::Read { .. }
                | Self::Hcl { .. }
                | Self::Yaml { .. }
                | Self::UnknownTag { .. }
                | Self::DuplicateLogicalId { .. }
        )
    }
}

/// Result type for reconcile operations.
pub type Result<T> = std::result::Result<T, Error>;
