//! Mapping transcript spans through a spliced alignment
//!
//! The reverse (HGVS to genome) direction models the variant as a tiny
//! single-block alignment in transcript space and composes it with the
//! transcript-to-genome alignment. A span that falls entirely inside an
//! alignment gap maps to the gap's genomic location (a zero-length point
//! when the genome deleted those transcript bases) rather than failing.

use crate::align::{Strand, TxAlignment};
use serde::{Deserialize, Serialize};

/// A genomic region produced by mapping through an alignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedRegion {
    /// Target (chromosome) name
    pub name: String,
    /// 0-based start
    pub start: u32,
    /// End (exclusive); equal to `start` for a point
    pub end: u32,
    /// Strand of the transcript on the target
    pub strand: Strand,
}

/// Map the transcript-forward span `[q_start, q_end)` through `tx_ali`
/// onto the genome.
///
/// Returns the genomic interval covered by the aligned parts of the span.
/// A span with no aligned base maps to the enclosing gap: a zero-length
/// point for a genome deletion, the skipped genomic interval for an intron
/// or double-sided gap. Returns None only when the span is empty and
/// outside the alignment's query range entirely (nothing to anchor to).
pub fn map_tx_span(tx_ali: &TxAlignment, q_start: u32, q_end: u32) -> Option<MappedRegion> {
    // Work in stored (strand-flipped) query coordinates
    let (s, e) = match tx_ali.strand {
        Strand::Plus => (q_start, q_end),
        Strand::Minus => (
            tx_ali.q_size.saturating_sub(q_end),
            tx_ali.q_size.saturating_sub(q_start),
        ),
    };
    let region = |start: u32, end: u32| {
        Some(MappedRegion {
            name: tx_ali.t_name.clone(),
            start,
            end,
            strand: tx_ali.strand,
        })
    };

    // Intersect with each aligned block
    let mut g_min = u32::MAX;
    let mut g_max = 0;
    let mut hit = false;
    for ix in 0..tx_ali.block_count() {
        let qb_start = tx_ali.q_starts[ix];
        let qb_end = tx_ali.q_block_end(ix);
        let o_start = s.max(qb_start);
        let o_end = e.min(qb_end);
        if o_start < o_end {
            let g_start = tx_ali.t_starts[ix] + (o_start - qb_start);
            let g_end = tx_ali.t_starts[ix] + (o_end - qb_start);
            g_min = g_min.min(g_start);
            g_max = g_max.max(g_end);
            hit = true;
        }
    }
    if hit {
        return region(g_min, g_max);
    }

    // No aligned base: anchor to the flank or the enclosing gap
    if e <= tx_ali.q_starts[0] {
        let t = tx_ali.t_start();
        return region(t, t);
    }
    let last = tx_ali.block_count() - 1;
    if s >= tx_ali.q_block_end(last) {
        let t = tx_ali.t_end();
        return region(t, t);
    }
    for ix in 0..tx_ali.block_count() - 1 {
        if s >= tx_ali.q_block_end(ix) && e <= tx_ali.q_starts[ix + 1] {
            let t_gap_start = tx_ali.t_block_end(ix);
            let t_gap_end = tx_ali.t_starts[ix + 1];
            if t_gap_start == t_gap_end {
                // Genome deleted these transcript bases
                return region(t_gap_start, t_gap_start);
            }
            return region(t_gap_start, t_gap_end);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_exon(strand: Strand) -> TxAlignment {
        TxAlignment::new(
            "NM_TEST.1",
            200,
            "chr1",
            1000,
            strand,
            vec![100, 100],
            vec![0, 100],
            vec![100, 300],
        )
        .unwrap()
    }

    #[test]
    fn test_map_within_one_block() {
        let ali = two_exon(Strand::Plus);
        let r = map_tx_span(&ali, 10, 20).unwrap();
        assert_eq!((r.start, r.end), (110, 120));
        assert_eq!(r.strand, Strand::Plus);
    }

    #[test]
    fn test_map_spanning_intron() {
        let ali = two_exon(Strand::Plus);
        let r = map_tx_span(&ali, 95, 105).unwrap();
        // Covers last 5 of exon 1 and first 5 of exon 2, with the intron
        assert_eq!((r.start, r.end), (195, 305));
    }

    #[test]
    fn test_map_minus_strand() {
        let ali = two_exon(Strand::Minus);
        // Forward tx [0,10) is the 3'-most stored block region:
        // stored coords [190,200) -> block1 offset 90..100 -> genome 390..400
        let r = map_tx_span(&ali, 0, 10).unwrap();
        assert_eq!((r.start, r.end), (390, 400));
        assert_eq!(r.strand, Strand::Minus);
    }

    #[test]
    fn test_map_upstream_point() {
        // Alignment whose query starts at 5 (first 5 tx bases unaligned)
        let ali = TxAlignment::new(
            "NM_TEST.1",
            205,
            "chr1",
            1000,
            Strand::Plus,
            vec![100, 100],
            vec![5, 105],
            vec![100, 300],
        )
        .unwrap();
        let r = map_tx_span(&ali, 0, 3).unwrap();
        assert_eq!((r.start, r.end), (100, 100));
    }

    #[test]
    fn test_map_into_genome_deletion() {
        // Gap skips 3 tx bases, 0 genomic bases
        let ali = TxAlignment::new(
            "NM_TEST.1",
            103,
            "chr1",
            1000,
            Strand::Plus,
            vec![50, 50],
            vec![0, 53],
            vec![100, 150],
        )
        .unwrap();
        let r = map_tx_span(&ali, 50, 53).unwrap();
        assert_eq!((r.start, r.end), (150, 150));
    }

    #[test]
    fn test_map_into_intron_gap() {
        let ali = two_exon(Strand::Plus);
        // Zero-length span exactly at the exon boundary maps into the gap
        let r = map_tx_span(&ali, 100, 100).unwrap();
        assert_eq!((r.start, r.end), (200, 300));
    }
}
