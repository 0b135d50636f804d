//! GenBank CDS annotations
//!
//! The coding region of a transcript as annotated in its GenBank record:
//! a 0-based half-open interval on the (already-oriented) transcript, with
//! completeness flags for each end and a complement flag recording the
//! original record's strand relative to the stored transcript.

use serde::{Deserialize, Serialize};

/// Coding-sequence interval on a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenbankCds {
    /// 0-based start of the coding region in transcript coordinates
    pub start: u32,
    /// End of the coding region (exclusive)
    pub end: u32,
    /// The annotated start codon is complete
    pub start_complete: bool,
    /// The annotated stop codon is complete
    pub end_complete: bool,
    /// CDS was annotated on the complement of the stored sequence
    pub complement: bool,
}

impl GenbankCds {
    /// A complete CDS covering `[start, end)`
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            start_complete: true,
            end_complete: true,
            complement: false,
        }
    }

    /// Coding length in bases
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// True for a degenerate (empty) annotation
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Parse a GenBank-style CDS string: `123..456`, `<123..456`,
    /// `123..>456`, or `complement(123..456)`. Input coordinates are
    /// 1-based closed; the result is 0-based half-open.
    pub fn parse(text: &str) -> Option<Self> {
        let mut s = text.trim();
        let mut complement = false;
        if let Some(inner) = s
            .strip_prefix("complement(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            complement = true;
            s = inner;
        }
        let (left, right) = s.split_once("..")?;
        let (start_complete, left) = match left.strip_prefix('<') {
            Some(rest) => (false, rest),
            None => (true, left),
        };
        let (end_complete, right) = match right.strip_prefix('>') {
            Some(rest) => (false, rest),
            None => (true, right),
        };
        let start1: u32 = left.parse().ok()?;
        let end1: u32 = right.parse().ok()?;
        if start1 == 0 || end1 < start1 {
            return None;
        }
        Some(Self {
            start: start1 - 1,
            end: end1,
            start_complete,
            end_complete,
            complement,
        })
    }
}

impl std::fmt::Display for GenbankCds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = format!(
            "{}{}..{}{}",
            if self.start_complete { "" } else { "<" },
            self.start + 1,
            if self.end_complete { "" } else { ">" },
            self.end
        );
        if self.complement {
            write!(f, "complement({})", body)
        } else {
            write!(f, "{}", body)
        }
    }
}
