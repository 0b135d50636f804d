//! External data collaborators
//!
//! The projection library owns no data. Sequences, spliced alignments, CDS
//! annotations, and gene-symbol metadata come from collaborator services
//! consumed through the traits here; implementations might be SQL-backed,
//! file-backed, or in-memory. [`MemSource`] implements all of them for
//! tests, fixtures, and the CLI.

pub mod cds;
pub mod mem;

pub use cds::GenbankCds;
pub use mem::MemSource;

use crate::align::TxAlignment;
use crate::Result;

/// Random-access substring fetch by sequence name, 0-based half-open.
/// Serves chromosomes, transcripts, and proteins alike.
pub trait SequenceSource {
    /// Length of the named sequence, or None if unknown
    fn sequence_len(&self, name: &str) -> Option<u32>;

    /// Fetch `[start, end)` of the named sequence, uppercased by callers
    /// as needed
    fn fetch(&self, name: &str, start: u32, end: u32) -> Result<Vec<u8>>;

    /// Fetch the whole named sequence
    fn fetch_all(&self, name: &str) -> Result<Vec<u8>> {
        let len = self
            .sequence_len(name)
            .ok_or_else(|| crate::error::VarmapError::ReferenceNotFound {
                id: name.to_string(),
            })?;
        self.fetch(name, 0, len)
    }

    /// Resolve a possibly versionless accession to the stored, versioned
    /// name (e.g. `NM_000088` to `NM_000088.3`), or None if unknown.
    fn resolve_accession(&self, acc: &str) -> Option<String> {
        if self.sequence_len(acc).is_some() {
            Some(acc.to_string())
        } else {
            None
        }
    }
}

/// Spliced alignment lookup by transcript accession.
pub trait AlignmentSource {
    /// All alignments on record for the accession (usually one; paralogous
    /// placements yield several)
    fn alignments_for(&self, acc: &str) -> Vec<TxAlignment>;
}

/// Coding-sequence annotation lookup by transcript accession.
pub trait CdsSource {
    /// The CDS annotation, or None for non-coding transcripts and unknown
    /// accessions
    fn cds(&self, acc: &str) -> Option<GenbankCds>;
}

/// Gene-symbol and accession cross-references, used only by the loose
/// ("pseudo-HGVS") parser and protein-term mapping.
pub trait GeneLookup {
    /// Transcript (NM_) accession for a gene symbol
    fn nm_for_gene(&self, gene: &str) -> Option<String>;
    /// Protein (NP_) accession for a gene symbol
    fn np_for_gene(&self, gene: &str) -> Option<String>;
    /// Protein accession for a transcript accession
    fn np_for_nm(&self, nm: &str) -> Option<String>;
    /// Transcript accession for a protein accession
    fn nm_for_np(&self, np: &str) -> Option<String>;
}

/// Everything the validator, mapper, and annotator need, in one bound.
pub trait VariantSource: SequenceSource + AlignmentSource + CdsSource + GeneLookup {}

impl<T: SequenceSource + AlignmentSource + CdsSource + GeneLookup> VariantSource for T {}
