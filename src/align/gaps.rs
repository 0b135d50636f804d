//! Indel-gap classification and normalization
//!
//! An alignment gap that is too short to be a plausible intron is really an
//! indel between the genome and the transcript. Such a gap rarely has a
//! single forced placement: wherever the flanking sequence is locally
//! repetitive, the same bases can be attributed to either side. This module
//! classifies every gap and widens indel gaps into their full double-sided
//! ambiguity span, which downstream shifting consults so that an ambiguous
//! variant can travel through a false intron but never across a genuine
//! splice site.

use crate::align::{Strand, TxAlignment};
use crate::seq::window::SeqWindow;
use crate::seq::revcomp;

/// Classification of an inter-block gap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapKind {
    /// A genuine intron: long enough, skips only genomic sequence
    Intron,
    /// An indel between genome and transcript masquerading as a gap
    Indel,
}

/// Annotation for the gap following one alignment block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapInfo {
    pub kind: GapKind,
    /// Leftmost genomic coordinate of the ambiguity span
    pub ambig_t_start: u32,
    /// Rightmost genomic coordinate of the ambiguity span (exclusive)
    pub ambig_t_end: u32,
}

/// Classify and widen the gaps of `ali`.
///
/// Returns a copy of the alignment whose `gap_info` is populated: each gap
/// shorter than `min_intron` (or skipping transcript bases) becomes an
/// `Indel` gap whose ambiguity span covers every equivalent placement given
/// the local sequence; genuine introns keep their raw span. `tx_seq` is the
/// transcript sequence in transcript orientation.
pub fn expand_indel_gaps(
    ali: &TxAlignment,
    gwin: &mut dyn SeqWindow,
    tx_seq: &[u8],
    min_intron: u32,
) -> TxAlignment {
    let mut out = ali.clone();
    if ali.block_count() < 2 {
        out.gap_info = Vec::new();
        return out;
    }
    // q_starts index the reverse-complemented query when strand is '-'
    let oriented_tx: Vec<u8> = match ali.strand {
        Strand::Plus => tx_seq.to_ascii_uppercase(),
        Strand::Minus => revcomp(tx_seq),
    };
    let mut infos = Vec::with_capacity(ali.block_count() - 1);
    for ix in 0..ali.block_count() - 1 {
        let t_gap = ali.t_gap_len(ix);
        let q_gap = ali.q_gap_len(ix);
        let gs = ali.t_block_end(ix);
        let ge = ali.t_starts[ix + 1];
        if q_gap == 0 && t_gap >= min_intron {
            infos.push(GapInfo {
                kind: GapKind::Intron,
                ambig_t_start: gs,
                ambig_t_end: ge,
            });
            continue;
        }
        let left_limit = ali.t_starts[ix];
        let right_limit = ali.t_block_end(ix + 1);
        let (ambig_t_start, ambig_t_end) = if q_gap == 0 {
            widen_deletion(gwin, gs, ge, left_limit, right_limit)
        } else if t_gap == 0 {
            let qs = ali.q_block_end(ix) as usize;
            let qe = ali.q_starts[ix + 1] as usize;
            match oriented_tx.get(qs..qe) {
                Some(ins) => widen_insertion(gwin, gs, ins, left_limit, right_limit),
                None => (gs, ge),
            }
        } else {
            // Replacement gap: both sides skip bases, no clean shift rule
            (gs, ge)
        };
        infos.push(GapInfo {
            kind: GapKind::Indel,
            ambig_t_start,
            ambig_t_end,
        });
    }
    out.gap_info = infos;
    out
}

/// Widen a pure genomic-insertion gap `[gs, ge)` (bases present in the
/// genome, absent from the transcript) across repetitive flanking sequence.
fn widen_deletion(
    gwin: &mut dyn SeqWindow,
    gs: u32,
    ge: u32,
    left_limit: u32,
    right_limit: u32,
) -> (u32, u32) {
    let mut lo = gs;
    let mut hi = ge;
    // Slide the deleted run left one base at a time
    {
        let (mut s, mut e) = (gs, ge);
        while s > left_limit {
            match (gwin.base_at(s - 1), gwin.base_at(e - 1)) {
                (Some(a), Some(b)) if a == b => {
                    s -= 1;
                    e -= 1;
                    lo = s;
                }
                _ => break,
            }
        }
    }
    // And right
    {
        let (mut s, mut e) = (gs, ge);
        while e < right_limit {
            match (gwin.base_at(s), gwin.base_at(e)) {
                (Some(a), Some(b)) if a == b => {
                    s += 1;
                    e += 1;
                    hi = e;
                }
                _ => break,
            }
        }
    }
    (lo, hi)
}

/// Widen a genome-deletion gap (transcript bases `ins` inserted at genomic
/// point `point`) across repetitive flanking sequence.
fn widen_insertion(
    gwin: &mut dyn SeqWindow,
    point: u32,
    ins: &[u8],
    left_limit: u32,
    right_limit: u32,
) -> (u32, u32) {
    if ins.is_empty() {
        return (point, point);
    }
    let n = ins.len();
    let mut hi = point;
    let mut k = 0usize;
    while hi < right_limit {
        match gwin.base_at(hi) {
            Some(b) if b == ins[k % n] => {
                hi += 1;
                k += 1;
            }
            _ => break,
        }
    }
    let mut lo = point;
    let mut j = 0usize;
    while lo > left_limit {
        match gwin.base_at(lo - 1) {
            Some(b) if b == ins[n - 1 - (j % n)] => {
                lo -= 1;
                j += 1;
            }
            _ => break,
        }
    }
    (lo, hi)
}

/// True if `ali` has an indel gap whose ambiguity span touches
/// `[g_start, g_end]` on the genome.
pub fn has_anomalous_gaps(ali: &TxAlignment, g_start: u32, g_end: u32, min_intron: u32) -> bool {
    for ix in 0..ali.block_count().saturating_sub(1) {
        let (span_start, span_end) = match ali.gap_info.get(ix) {
            Some(info) => (info.ambig_t_start, info.ambig_t_end),
            None => (ali.t_block_end(ix), ali.t_starts[ix + 1]),
        };
        if g_start <= span_end && g_end >= span_start && ali.intron_too_short(ix, min_intron) {
            return true;
        } else if g_end < span_start {
            break;
        }
    }
    false
}
