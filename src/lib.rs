// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-varmap: HGVS parsing and variant projection
//!
//! Part of the ferro bioinformatics toolkit.
//!
//! Projects variants between genomic, transcript, and protein coordinate
//! spaces using spliced alignments and CDS annotations, resolving the
//! inherent ambiguity of indel placement near alignment gaps. Runs in both
//! directions: mapping typed HGVS terms onto the genome, and generating
//! HGVS terms from variant calls.
//!
//! # Example
//!
//! ```
//! use ferro_varmap::{map_to_genome, parse_term, MemSource, ProjectConfig};
//!
//! // Parse an HGVS term (purely syntactic)
//! let variant = parse_term("NM_000001.1:c.1A>G").unwrap();
//!
//! // Map it to the genome through the transcript's spliced alignment
//! let source = MemSource::with_test_data();
//! let region = map_to_genome(&source, &variant, &ProjectConfig::default()).unwrap();
//! assert_eq!(region.name, "chr1");
//! assert_eq!((region.start, region.end), (110, 111));
//! ```

pub mod align;
pub mod annotate;
pub mod config;
pub mod error;
pub mod generate;
pub mod hgvs;
pub mod project;
pub mod provider;
pub mod seq;
pub mod shift;
pub mod validate;

// Re-export commonly used types
pub use align::{MappedRegion, Strand, TxAlignment};
pub use annotate::{AnnotationCaches, AnnotationRow, Annotator, VariantRecord};
pub use config::ProjectConfig;
pub use error::VarmapError;
pub use hgvs::{parse_pseudo_hgvs, parse_term, HgvsSeqType, HgvsVariant};
pub use project::{genomic_to_transcript, transcript_to_protein, GenomicRegion, VpPep, VpTx};
pub use provider::{
    AlignmentSource, CdsSource, GenbankCds, GeneLookup, MemSource, SequenceSource, VariantSource,
};
pub use validate::{map_to_genome, validate, validate_and_map, Validation};

/// Result type alias for ferro-varmap operations
pub type Result<T> = std::result::Result<T, VarmapError>;
