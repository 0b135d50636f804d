//! HGVS variant terms
//!
//! The structured form of a parsed HGVS term, the parsed change-description
//! tree, and the parsers that produce them. Parsing is purely syntactic;
//! validation against real sequence happens in [`crate::validate`].

pub mod change;
pub mod parser;

pub use change::{parse_nucleotide_change, HgvsAlt, HgvsChange, NestedTerm};
pub use parser::{parse_pseudo_hgvs, parse_term};

use serde::{Deserialize, Serialize};

/// Sequence type named by an HGVS term prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HgvsSeqType {
    /// c. — coding transcript, CDS-relative numbering
    Coding,
    /// g. — genomic
    Genomic,
    /// m. — mitochondrial (treated as genomic for mapping)
    Mito,
    /// n. — non-coding transcript
    Noncoding,
    /// r. — RNA (numbering follows the underlying accession)
    Rna,
    /// p. — protein
    Protein,
}

impl HgvsSeqType {
    /// The prefix letter written before the dot
    pub fn prefix(&self) -> char {
        match self {
            HgvsSeqType::Coding => 'c',
            HgvsSeqType::Genomic => 'g',
            HgvsSeqType::Mito => 'm',
            HgvsSeqType::Noncoding => 'n',
            HgvsSeqType::Rna => 'r',
            HgvsSeqType::Protein => 'p',
        }
    }

    /// Sequence type for a prefix letter
    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            'c' => Some(HgvsSeqType::Coding),
            'g' => Some(HgvsSeqType::Genomic),
            'm' => Some(HgvsSeqType::Mito),
            'n' => Some(HgvsSeqType::Noncoding),
            'r' => Some(HgvsSeqType::Rna),
            'p' => Some(HgvsSeqType::Protein),
            _ => None,
        }
    }
}

/// A parsed HGVS term
///
/// Positions are 1-based closed as written in the term. Coding (c.) terms
/// may carry intron offsets (`c.123+4`) and 3'-UTR anchoring (`c.*12`); a
/// negative `start1`/`end` means 5'-UTR-relative numbering (`c.-14`).
/// The change description is kept as written; [`parse_nucleotide_change`]
/// turns it into a structured list on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HgvsVariant {
    /// Sequence accession the positions refer to
    pub seq_acc: String,
    /// Gene symbol embedded in the term, when present
    pub gene_symbol: Option<String>,
    /// Coordinate space named by the term prefix
    pub seq_type: HgvsSeqType,
    /// 1-based start position (negative for 5'-UTR-relative coding coords)
    pub start1: i64,
    /// 1-based end position, equal to `start1` for single-position terms
    pub end: i64,
    /// Intron offset on the start anchor (0 when exonic)
    pub start_offset: i32,
    /// Intron offset on the end anchor
    pub end_offset: i32,
    /// Start position is relative to the CDS end (`*` anchor)
    pub start_is_utr3: bool,
    /// End position is relative to the CDS end
    pub end_is_utr3: bool,
    /// The change description as written (`A>G`, `del`, `dup5`, ...)
    pub changes: String,
}

impl HgvsVariant {
    /// Convert the term's fully-closed 1-based start/end into 0-based
    /// half-open coordinates. Negative positions are effectively 0-based
    /// already, so only positive values are adjusted.
    pub fn zero_based_half_open(&self) -> (i64, i64) {
        let start = if self.start1 > 0 {
            self.start1 - 1
        } else {
            self.start1
        };
        let end = if self.end < 0 { self.end + 1 } else { self.end };
        (start, end)
    }

    /// True for an insertion term: a two-base range whose change starts
    /// with `ins`. HGVS writes the flanking bases; the change itself is a
    /// zero-length point between them.
    pub fn is_insertion(&self) -> bool {
        self.end == self.start1 + 1 && self.changes.starts_with("ins")
    }

    /// The version suffix of the accession, if it carries one
    pub fn version(&self) -> Option<u32> {
        let (_, v) = self.seq_acc.rsplit_once('.')?;
        v.parse().ok()
    }

    /// Accession with any version suffix removed
    pub fn versionless_acc(&self) -> &str {
        match self.seq_acc.rsplit_once('.') {
            Some((base, v)) if !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()) => base,
            _ => &self.seq_acc,
        }
    }
}

impl std::fmt::Display for HgvsVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.seq_acc)?;
        if let Some(gene) = &self.gene_symbol {
            write!(f, "({})", gene)?;
        }
        write!(f, ":{}.", self.seq_type.prefix())?;
        if self.seq_type == HgvsSeqType::Protein {
            // Protein change text spells out its own positions
            return write!(f, "{}", self.changes);
        }
        let pos = |f: &mut std::fmt::Formatter<'_>, pos: i64, offset: i32, utr3: bool| {
            if utr3 {
                write!(f, "*")?;
            }
            write!(f, "{}", pos)?;
            if offset != 0 {
                write!(f, "{:+}", offset)?;
            }
            Ok(())
        };
        pos(f, self.start1, self.start_offset, self.start_is_utr3)?;
        if self.end != self.start1
            || self.end_offset != self.start_offset
            || self.end_is_utr3 != self.start_is_utr3
        {
            write!(f, "_")?;
            pos(f, self.end, self.end_offset, self.end_is_utr3)?;
        }
        write!(f, "{}", self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(seq_type: HgvsSeqType, start1: i64, end: i64, changes: &str) -> HgvsVariant {
        HgvsVariant {
            seq_acc: "NM_000001.1".to_string(),
            gene_symbol: None,
            seq_type,
            start1,
            end,
            start_offset: 0,
            end_offset: 0,
            start_is_utr3: false,
            end_is_utr3: false,
            changes: changes.to_string(),
        }
    }

    #[test]
    fn test_zero_based_half_open() {
        let v = mk(HgvsSeqType::Coding, 10, 12, "del");
        assert_eq!(v.zero_based_half_open(), (9, 12));
        // Negative (5'UTR) coords are already effectively 0-based
        let v = mk(HgvsSeqType::Coding, -14, -14, "A>G");
        assert_eq!(v.zero_based_half_open(), (-14, -13));
    }

    #[test]
    fn test_is_insertion() {
        assert!(mk(HgvsSeqType::Coding, 10, 11, "insACG").is_insertion());
        assert!(!mk(HgvsSeqType::Coding, 10, 12, "insACG").is_insertion());
        assert!(!mk(HgvsSeqType::Coding, 10, 11, "del").is_insertion());
    }

    #[test]
    fn test_version_helpers() {
        let v = mk(HgvsSeqType::Coding, 1, 1, "A>G");
        assert_eq!(v.version(), Some(1));
        assert_eq!(v.versionless_acc(), "NM_000001");
        let mut v2 = v.clone();
        v2.seq_acc = "LRG_1t1".to_string();
        assert_eq!(v2.version(), None);
        assert_eq!(v2.versionless_acc(), "LRG_1t1");
    }

    #[test]
    fn test_display() {
        let v = mk(HgvsSeqType::Coding, 10, 10, "A>G");
        assert_eq!(v.to_string(), "NM_000001.1:c.10A>G");
        let mut v = mk(HgvsSeqType::Coding, 100, 100, "G>T");
        v.start_offset = 4;
        v.end_offset = 4;
        assert_eq!(v.to_string(), "NM_000001.1:c.100+4G>T");
        let mut v = mk(HgvsSeqType::Coding, 12, 12, "C>T");
        v.start_is_utr3 = true;
        v.end_is_utr3 = true;
        assert_eq!(v.to_string(), "NM_000001.1:c.*12C>T");
    }
}
