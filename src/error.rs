//! Error types for ferro-varmap
//!
//! Failures that represent *absence* (a term that matches no grammar, a
//! transcript with no alignment on record) are modeled as `Option`/`None` at
//! the call site, never as errors. The variants here are reserved for typed
//! faults: unknown accessions, out-of-bounds coordinates, collaborator
//! failures, and malformed inputs that were asserted to be well-formed.

use thiserror::Error;

/// Main error type for ferro-varmap operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VarmapError {
    /// Sequence accession could not be resolved by any collaborator
    #[error("Reference not found: {id}")]
    ReferenceNotFound { id: String },

    /// A sequence fetch failed or returned out-of-range data
    #[error("Sequence not available for {name}:{start}-{end}")]
    SequenceNotAvailable { name: String, start: u32, end: u32 },

    /// Declared coordinates fall outside the known sequence
    #[error("Invalid coordinates: {msg}")]
    InvalidCoordinates { msg: String },

    /// Allele text contains something other than IUPAC nucleotide codes
    #[error("Invalid allele sequence: {allele}")]
    InvalidAllele { allele: String },

    /// The spliced alignment violates the block-ordering invariant
    #[error("Malformed alignment for {name}: {msg}")]
    MalformedAlignment { name: String, msg: String },

    /// Projection failed in a way that indicates inconsistent inputs
    #[error("Projection error: {msg}")]
    Projection { msg: String },

    /// IO error (file-backed fixtures and CLI only)
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON parsing error (fixture loading)
    #[error("JSON error: {msg}")]
    Json { msg: String },
}

impl From<std::io::Error> for VarmapError {
    fn from(err: std::io::Error) -> Self {
        VarmapError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for VarmapError {
    fn from(err: serde_json::Error) -> Self {
        VarmapError::Json {
            msg: err.to_string(),
        }
    }
}
