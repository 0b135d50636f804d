//! Spliced transcript-to-genome alignments
//!
//! `TxAlignment` is a PSL-shaped pairwise alignment: parallel arrays of
//! block sizes and per-block starts in query (transcript) and target
//! (genome) coordinates. Query starts follow the PSL convention of being
//! stored in reverse-strand coordinates when the query aligns to the minus
//! strand; `q_start()`/`q_end()` always report forward-strand coordinates.

pub mod gaps;
pub mod transmap;

pub use gaps::{expand_indel_gaps, has_anomalous_gaps, GapInfo, GapKind};
pub use transmap::{map_tx_span, MappedRegion};

use crate::error::VarmapError;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Strand of the query (transcript) relative to the target (genome)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strand {
    #[default]
    Plus,
    Minus,
}

impl Strand {
    pub fn is_minus(&self) -> bool {
        matches!(self, Strand::Minus)
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

/// A spliced pairwise alignment between a transcript (query) and a
/// genomic sequence (target), expressed as co-linear blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxAlignment {
    /// Query (transcript) name
    pub q_name: String,
    /// Query size in bases
    pub q_size: u32,
    /// Target (chromosome/region) name
    pub t_name: String,
    /// Target size in bases
    pub t_size: u32,
    /// Query strand relative to target
    pub strand: Strand,
    /// Per-block sizes
    pub block_sizes: Vec<u32>,
    /// Per-block query starts (reverse-strand coords when strand is '-')
    pub q_starts: Vec<u32>,
    /// Per-block target starts (always forward)
    pub t_starts: Vec<u32>,
    /// Gap annotations, populated by [`expand_indel_gaps`];
    /// empty until the alignment has been normalized
    #[serde(skip)]
    pub gap_info: Vec<GapInfo>,
}

impl TxAlignment {
    /// Build an alignment, checking the block invariant: non-overlapping
    /// blocks, increasing in both coordinate spaces.
    pub fn new(
        q_name: impl Into<String>,
        q_size: u32,
        t_name: impl Into<String>,
        t_size: u32,
        strand: Strand,
        block_sizes: Vec<u32>,
        q_starts: Vec<u32>,
        t_starts: Vec<u32>,
    ) -> Result<Self> {
        let ali = Self {
            q_name: q_name.into(),
            q_size,
            t_name: t_name.into(),
            t_size,
            strand,
            block_sizes,
            q_starts,
            t_starts,
            gap_info: Vec::new(),
        };
        ali.check()?;
        Ok(ali)
    }

    /// Validate the block-ordering invariant.
    pub fn check(&self) -> Result<()> {
        let n = self.block_sizes.len();
        if n == 0 || self.q_starts.len() != n || self.t_starts.len() != n {
            return Err(VarmapError::MalformedAlignment {
                name: self.q_name.clone(),
                msg: "block arrays empty or of differing lengths".to_string(),
            });
        }
        for ix in 1..n {
            if self.q_starts[ix] < self.q_starts[ix - 1] + self.block_sizes[ix - 1]
                || self.t_starts[ix] < self.t_starts[ix - 1] + self.block_sizes[ix - 1]
            {
                return Err(VarmapError::MalformedAlignment {
                    name: self.q_name.clone(),
                    msg: format!("blocks {} and {} overlap or are out of order", ix - 1, ix),
                });
            }
        }
        Ok(())
    }

    /// Number of alignment blocks
    pub fn block_count(&self) -> usize {
        self.block_sizes.len()
    }

    /// Target start of the alignment
    pub fn t_start(&self) -> u32 {
        self.t_starts[0]
    }

    /// Target end of the alignment (exclusive)
    pub fn t_end(&self) -> u32 {
        let last = self.block_count() - 1;
        self.t_starts[last] + self.block_sizes[last]
    }

    /// Query start in forward-strand coordinates
    pub fn q_start(&self) -> u32 {
        match self.strand {
            Strand::Plus => self.q_starts[0],
            Strand::Minus => {
                let last = self.block_count() - 1;
                self.q_size - (self.q_starts[last] + self.block_sizes[last])
            }
        }
    }

    /// Query end in forward-strand coordinates (exclusive)
    pub fn q_end(&self) -> u32 {
        match self.strand {
            Strand::Plus => {
                let last = self.block_count() - 1;
                self.q_starts[last] + self.block_sizes[last]
            }
            Strand::Minus => self.q_size - self.q_starts[0],
        }
    }

    /// Target end of block `ix` (exclusive)
    pub fn t_block_end(&self, ix: usize) -> u32 {
        self.t_starts[ix] + self.block_sizes[ix]
    }

    /// Query end of block `ix` (exclusive, strand-stored coords)
    pub fn q_block_end(&self, ix: usize) -> u32 {
        self.q_starts[ix] + self.block_sizes[ix]
    }

    /// Target length of the gap following block `ix`
    pub fn t_gap_len(&self, ix: usize) -> u32 {
        self.t_starts[ix + 1] - self.t_block_end(ix)
    }

    /// Query length of the gap following block `ix`
    pub fn q_gap_len(&self, ix: usize) -> u32 {
        self.q_starts[ix + 1] - self.q_block_end(ix)
    }

    /// True if the gap following block `ix` skips transcript bases but no
    /// genomic bases, i.e. the reference genome is missing base(s) present
    /// in the transcript.
    pub fn genome_has_deletion(&self, ix: usize) -> bool {
        if ix + 1 >= self.block_count() {
            return false;
        }
        self.t_gap_len(ix) == 0 && self.q_gap_len(ix) > 0
    }

    /// True if the gap following block `ix` is too short to be a plausible
    /// intron. Consults gap annotations when present, otherwise the raw
    /// target gap length against `min_intron`.
    pub fn intron_too_short(&self, ix: usize, min_intron: u32) -> bool {
        if let Some(info) = self.gap_info.get(ix) {
            return info.kind == GapKind::Indel;
        }
        self.t_gap_len(ix) < min_intron
    }
}
