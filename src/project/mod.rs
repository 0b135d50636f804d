//! Variant projection between genomic and transcript coordinates
//!
//! Uses a spliced alignment to transform a genomic variant into
//! transcript-relative coordinates, trimming the alleles to their minimal
//! representation and shifting ambiguous indels in the direction of
//! transcription (the HGVS 3' rule) — but never across a genuine
//! exon/intron boundary. Computes enough information to classify every
//! position by region and to detect gaps that look like introns but are
//! really genomic deletions.

pub mod protein;

pub use protein::{transcript_to_protein, VpPep};

use crate::align::{expand_indel_gaps, has_anomalous_gaps, TxAlignment};
use crate::config::ProjectConfig;
use crate::error::VarmapError;
use crate::seq::window::SeqWindow;
use crate::seq::{is_all_nt, revcomp};
use crate::shift::{indel_shift, indel_shift_applicable, trim_ref_alt, ShiftDirection, NO_MAX};
use crate::Result;
use serde::{Deserialize, Serialize};

/// A genomic interval: 0-based half-open range on a named sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomicRegion {
    pub name: String,
    pub start: u32,
    pub end: u32,
}

impl GenomicRegion {
    pub fn new(name: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Which part of a transcript's neighborhood a genomic position projects to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    /// 5' of the transcript's aligned span
    Upstream,
    /// 3' of the transcript's aligned span
    Downstream,
    /// Within an aligned block
    Exon,
    /// Within an alignment gap
    Intron,
}

/// Projection of one genomic coordinate onto a transcript
///
/// The meaning of `tx_offset` depends on `region`: the exact transcript
/// offset for an exonic position; the open end of the preceding exon for an
/// intronic position; 0 or the transcript length for up/downstream. For
/// intronic positions the 3' side of the gap is described separately by
/// `intron3_tx_offset`/`intron3_distance` — the two transcript offsets
/// differ only when the gap is a genomic deletion relative to the
/// transcript, never for a true intron, which is how callers tell the two
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VpTxPosition {
    pub region: Region,
    /// Transcript offset (exact for exon; see type docs otherwise)
    pub tx_offset: u32,
    /// Genomic distance to the nearest transcript boundary (intron/flank)
    pub g_distance: u32,
    /// Transcript offset of the exon following an intronic position
    pub intron3_tx_offset: u32,
    /// Genomic distance to the following exon for an intronic position
    pub intron3_distance: u32,
    /// The genomic coordinate this projection came from
    pub g_offset: u32,
    /// Alignment block containing (or adjoining) the position
    pub ali_blk_ix: Option<usize>,
    /// Bases inserted in the genome relative to the transcript at this
    /// boundary, for positions in or adjacent to an indel gap
    pub g_ins_len: u32,
}

impl VpTxPosition {
    fn zero(g_offset: u32) -> Self {
        Self {
            region: Region::Exon,
            tx_offset: 0,
            g_distance: 0,
            intron3_tx_offset: 0,
            intron3_distance: 0,
            g_offset,
            ali_blk_ix: None,
            g_ins_len: 0,
        }
    }

    /// Reverse/complement all components for a transcript on the minus
    /// strand. Distances are unchanged except that an intron's 5'/3' pair
    /// swaps.
    fn reverse(&mut self, tx_size: u32) {
        self.region = match self.region {
            Region::Upstream => Region::Downstream,
            Region::Downstream => Region::Upstream,
            other => other,
        };
        self.tx_offset = tx_size - self.tx_offset;
        if self.region == Region::Intron {
            self.intron3_tx_offset = tx_size - self.intron3_tx_offset;
            std::mem::swap(&mut self.tx_offset, &mut self.intron3_tx_offset);
            std::mem::swap(&mut self.g_distance, &mut self.intron3_distance);
        }
        // ali_blk_ix is unchanged: the alignment itself stays genomic '+'
    }
}

/// A genomic variant projected onto a transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpTx {
    /// Transcript name
    pub tx_name: String,
    /// Projection of the variant start (5' on the transcript strand)
    pub start: VpTxPosition,
    /// Projection of the variant end
    pub end: VpTxPosition,
    /// Genomic reference allele, on the transcript strand
    pub g_ref: String,
    /// Alternate allele, on the transcript strand
    pub g_alt: String,
    /// Transcript reference allele, when the variant overlaps exons
    pub tx_ref: Option<String>,
    /// Transcript alternate allele when it differs from `g_alt` (the
    /// variant interacts with a non-intron indel in the alignment)
    pub tx_alt: Option<String>,
    /// Bases moved during ambiguous-indel shifting
    pub bases_shifted: u32,
    /// The genome does not literally match the transcript over the variant
    /// span (misannotation or multi-mapping)
    pub genome_mismatch: bool,
}

impl VpTx {
    /// The alternate allele to use in transcript space
    pub fn alt_for_tx(&self) -> &str {
        self.tx_alt.as_deref().unwrap_or(&self.g_alt)
    }
}

/// Project a genomic offset onto transcript-relative coordinates.
///
/// `is_tx_end` selects the half-open tie-breaking: an end coordinate looks
/// backward at the base before it, a start coordinate looks forward. "End"
/// means end in transcript space — the higher genomic coordinate for a
/// plus-strand transcript, the lower for minus.
pub fn pos_geno_to_tx(
    g_offset: u32,
    ali: &TxAlignment,
    is_tx_end: bool,
    min_intron: u32,
) -> VpTxPosition {
    let is_rc = ali.strand.is_minus();
    // Coordinate transforms of start and end coordinates work the same
    // way, but region classification must treat the open end differently
    // (looking backward) from the closed start (looking forward).
    let end_cmp: i64 = if is_tx_end != is_rc { 1 } else { 0 };
    let g_cmp = g_offset as i64 - end_cmp;
    let mut pos = VpTxPosition::zero(g_offset);
    if g_cmp < ali.t_start() as i64 {
        pos.region = Region::Upstream;
        // Can't use q_start() here: q_starts are strand-stored
        pos.tx_offset = ali.q_starts[0];
        pos.g_distance = ali.t_start() - g_offset;
    } else if g_cmp < ali.t_end() as i64 {
        for ix in 0..ali.block_count() {
            let t_blk_start = ali.t_starts[ix] as i64;
            let t_blk_end = ali.t_block_end(ix) as i64;
            if end_cmp == 0
                && ix > 0
                && g_offset as i64 == t_blk_start
                && ali.genome_has_deletion(ix - 1)
            {
                // Include adjacent skipped transcript bases to the left
                pos.region = Region::Exon;
                pos.tx_offset = ali.q_block_end(ix - 1);
                pos.ali_blk_ix = Some(ix - 1);
                break;
            } else if end_cmp == 1
                && g_offset as i64 == t_blk_end
                && ali.genome_has_deletion(ix)
            {
                // Include adjacent skipped transcript bases to the right
                pos.region = Region::Exon;
                pos.tx_offset = ali.q_starts[ix + 1];
                pos.ali_blk_ix = Some(ix + 1);
                break;
            } else if g_cmp >= t_blk_start && g_cmp < t_blk_end {
                pos.region = Region::Exon;
                pos.tx_offset = ali.q_starts[ix] + (g_offset - ali.t_starts[ix]);
                pos.ali_blk_ix = Some(ix);
                break;
            } else if ix < ali.block_count() - 1
                && g_cmp >= t_blk_end
                && g_cmp < ali.t_starts[ix + 1] as i64
            {
                pos.region = Region::Intron;
                set_intronic(&mut pos, ali, g_offset, ix, min_intron);
                pos.ali_blk_ix = Some(ix);
                break;
            }
        }
    } else {
        pos.region = Region::Downstream;
        let last = ali.block_count() - 1;
        // Can't use q_end() here either, same strand-storage caveat
        pos.tx_offset = ali.q_block_end(last);
        pos.g_distance = g_offset - ali.t_end();
    }
    if is_rc {
        pos.reverse(ali.q_size);
    }
    pos
}

/// Fill in the two-sided description of an intronic position: transcript
/// offsets and genomic distances for both the 5' exon and the 3' exon of
/// the enclosing gap.
fn set_intronic(
    pos: &mut VpTxPosition,
    ali: &TxAlignment,
    g_offset: u32,
    ix: usize,
    min_intron: u32,
) {
    let intron_start = ali.t_block_end(ix);
    let intron_end = ali.t_starts[ix + 1];
    debug_assert!(g_offset >= intron_start && g_offset <= intron_end);
    pos.tx_offset = ali.q_block_end(ix);
    pos.g_distance = g_offset - intron_start;
    pos.intron3_tx_offset = ali.q_starts[ix + 1];
    pos.intron3_distance = intron_end - g_offset;
    if ali.intron_too_short(ix, min_intron) {
        pos.g_ins_len = ali.t_gap_len(ix);
    }
}

/// True if `[start, end)` describes a zero-length (insertion) point.
/// An insertion at a region boundary can carry differing region tags on
/// its two sides even though they name the same point.
pub fn is_insertion_point(start: &VpTxPosition, end: &VpTxPosition) -> bool {
    start.tx_offset == end.tx_offset
        && ((start.g_distance == end.g_distance
            && start.intron3_tx_offset == end.intron3_tx_offset
            && start.intron3_distance == end.intron3_distance)
            || (start.region == Region::Exon
                && end.region == Region::Intron
                && start.g_distance == 0
                && end.g_distance == 0)
            || (start.region == Region::Intron
                && end.region == Region::Exon
                && start.tx_offset > 0
                && start.g_distance == 0
                && end.intron3_distance == 0))
}

/// Move a position's region-appropriate offsets and distances by `bases`.
/// The caller must ensure this does not slide into another region.
pub fn slide_in_same_region(pos: &mut VpTxPosition, bases: i32) {
    let add = |v: u32, d: i32| (v as i64 + d as i64) as u32;
    match pos.region {
        Region::Intron => {
            pos.g_distance = add(pos.g_distance, bases);
            pos.intron3_distance = add(pos.intron3_distance, -bases);
        }
        Region::Exon => pos.tx_offset = add(pos.tx_offset, bases),
        Region::Upstream => pos.g_distance = add(pos.g_distance, -bases),
        Region::Downstream => pos.g_distance = add(pos.g_distance, bases),
    }
}

/// True if `[start, end)` is a single-base region.
pub fn range_is_single_base(start: &VpTxPosition, end: &VpTxPosition) -> bool {
    match (start.region, end.region) {
        (Region::Upstream, Region::Upstream) => start.g_distance == end.g_distance + 1,
        (Region::Exon, Region::Exon) => start.tx_offset + 1 == end.tx_offset,
        (Region::Intron, Region::Intron) => {
            start.tx_offset == end.tx_offset && start.g_distance + 1 == end.g_distance
        }
        (Region::Downstream, Region::Downstream) => start.g_distance + 1 == end.g_distance,
        _ => false,
    }
}

/// Transcript sequence covered by `[start_pos, end_pos)`, when the range
/// overlaps actual transcript sequence: Some (possibly empty for an exonic
/// insertion point), otherwise None.
fn get_tx_in_range(
    tx_seq: &[u8],
    start_pos: &VpTxPosition,
    end_pos: &VpTxPosition,
) -> Option<String> {
    if end_pos.tx_offset > start_pos.tx_offset {
        let s = start_pos.tx_offset as usize;
        let e = (end_pos.tx_offset as usize).min(tx_seq.len());
        Some(String::from_utf8_lossy(&tx_seq[s..e]).to_ascii_uppercase())
    } else if start_pos.region == Region::Exon || end_pos.region == Region::Exon {
        Some(String::new())
    } else {
        None
    }
}

/// Splice genomic exon sequence in `[g_start, g_end)` together, on the
/// transcript strand. With `include_indels`, bases from gaps too short to
/// be genuine introns are retained.
fn splice_genomic_in_range(
    gwin: &mut dyn SeqWindow,
    g_start: u32,
    g_end: u32,
    ali: &TxAlignment,
    include_indels: bool,
    min_intron: u32,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for ix in 0..ali.block_count() {
        let t_blk_start = ali.t_starts[ix];
        if g_end <= t_blk_start {
            break;
        }
        let t_blk_end = ali.t_block_end(ix);
        if g_start > t_blk_end {
            continue;
        }
        let start_in_blk = t_blk_start.max(g_start);
        let end_in_blk = t_blk_end.min(g_end);
        if end_in_blk > start_in_blk {
            out.extend(gwin.copy(start_in_blk, end_in_blk - start_in_blk)?);
        }
        if include_indels
            && ix < ali.block_count() - 1
            && ali.intron_too_short(ix, min_intron)
        {
            // An indel, not an intron: keep the genomic bases
            let start_in_gap = t_blk_end.max(g_start);
            let end_in_gap = ali.t_starts[ix + 1].min(g_end);
            if end_in_gap > start_in_gap {
                out.extend(gwin.copy(start_in_gap, end_in_gap - start_in_gap)?);
            }
        }
    }
    if ali.strand.is_minus() {
        out = revcomp(&out);
    }
    Ok(out)
}

/// Compare the spliced, strand-corrected genomic sequence over the variant
/// range against the transcript reference sequence.
fn genome_tx_mismatch(
    tx_ref: Option<&str>,
    gwin: &mut dyn SeqWindow,
    g_start: u32,
    g_end: u32,
    ali: &TxAlignment,
    min_intron: u32,
) -> Result<bool> {
    match tx_ref {
        None => Ok(false),
        Some(tx_ref) => {
            let spliced = splice_genomic_in_range(gwin, g_start, g_end, ali, false, min_intron)?;
            Ok(spliced != tx_ref.as_bytes())
        }
    }
}

/// Max bases the variant may shift along the genome in the direction of
/// transcription without crossing out of its exon into a splice site
/// ("exception to the 3' rule"). Shifting may pass through gaps too short
/// to be genuine introns. Unlimited when the variant does not end in an
/// exon.
fn limit_to_exon(vp: &VpTx, g_tx_end: u32, ali: &TxAlignment, min_intron: u32) -> u32 {
    if vp.end.region != Region::Exon {
        return NO_MAX;
    }
    let Some(mut blk) = vp.end.ali_blk_ix else {
        return NO_MAX;
    };
    if ali.strand.is_minus() {
        while blk > 0 && ali.intron_too_short(blk - 1, min_intron) {
            blk -= 1;
        }
        g_tx_end.saturating_sub(ali.t_starts[blk])
    } else {
        while blk < ali.block_count() - 1 && ali.intron_too_short(blk, min_intron) {
            blk += 1;
        }
        ali.t_block_end(blk).saturating_sub(g_tx_end)
    }
}

/// Detect ambiguous placement of an insertion or deletion, shift it in the
/// direction of transcription, and handle the case where the alignment has
/// a non-intron indel inside the ambiguous region (in which case the
/// variant may mean something different — or nothing — on the transcript).
#[allow(clippy::too_many_arguments)]
fn process_indels(
    vp: &mut VpTx,
    gwin: &mut dyn SeqWindow,
    g_start: u32,
    g_end: u32,
    g_ref: &mut Vec<u8>,
    g_alt: &mut Vec<u8>,
    ali: &TxAlignment,
    tx_seq: &[u8],
    cfg: &ProjectConfig,
) -> Result<()> {
    let ref_len = g_end - g_start;
    if vp.genome_mismatch || !indel_shift_applicable(ref_len as usize, g_alt.len()) {
        return Ok(());
    }
    let is_rc = ali.strand.is_minus();
    // Genomic coords for transcript start and end: swapped when reversed
    let (mut g_tx_start, mut g_tx_end) = if is_rc {
        (g_end, g_start)
    } else {
        (g_start, g_end)
    };
    // Shift as far in the direction of transcription as possible, but not
    // past an exon's 3' boundary into a splice site. Also find how far the
    // variant could shift the other way, to bound the region in which an
    // alignment indel could interact with it.
    let max_shift = limit_to_exon(vp, g_tx_end, ali, cfg.min_intron);
    let (mut g_start5, mut g_end5) = (g_tx_start, g_tx_end);
    let mut alt5 = g_alt.clone();
    let (ambig_start, ambig_end);
    if is_rc {
        indel_shift(
            gwin,
            &mut g_end5,
            &mut g_start5,
            &mut alt5,
            NO_MAX,
            ShiftDirection::Right,
        );
        vp.bases_shifted = indel_shift(
            gwin,
            &mut g_tx_end,
            &mut g_tx_start,
            g_alt,
            max_shift,
            ShiftDirection::Left,
        );
        ambig_start = g_tx_end;
        ambig_end = g_start5;
    } else {
        indel_shift(
            gwin,
            &mut g_start5,
            &mut g_end5,
            &mut alt5,
            NO_MAX,
            ShiftDirection::Left,
        );
        vp.bases_shifted = indel_shift(
            gwin,
            &mut g_tx_start,
            &mut g_tx_end,
            g_alt,
            max_shift,
            ShiftDirection::Right,
        );
        ambig_start = g_start5;
        ambig_end = g_tx_end;
    }
    if vp.bases_shifted > 0 {
        // Re-project the shifted genomic coordinates
        vp.start = pos_geno_to_tx(g_tx_start, ali, false, cfg.min_intron);
        vp.end = pos_geno_to_tx(g_tx_end, ali, true, cfg.min_intron);
        vp.tx_ref = get_tx_in_range(tx_seq, &vp.start, &vp.end);
        *g_ref = gwin.copy(g_tx_start.min(g_tx_end), ref_len)?;
    }
    if has_anomalous_gaps(ali, ambig_start, ambig_end, cfg.min_intron) {
        // The transcript and genome have a non-intron indel in this
        // region, so the genomic variant might mean no change (or a
        // different change) on the transcript. Compare carefully over the
        // whole ambiguous region.
        let ambig_start_pos = pos_geno_to_tx(
            if is_rc { ambig_end } else { ambig_start },
            ali,
            false,
            cfg.min_intron,
        );
        let ambig_end_pos = pos_geno_to_tx(
            if is_rc { ambig_start } else { ambig_end },
            ali,
            true,
            cfg.min_intron,
        );
        let ambig_tx_ref = get_tx_in_range(tx_seq, &ambig_start_pos, &ambig_end_pos);
        // Reference according to the genome, retaining genomic bases from
        // the non-intron indel(s)
        let spliced =
            splice_genomic_in_range(gwin, ambig_start, ambig_end, ali, true, cfg.min_intron)?;
        if let Some(ambig_tx_ref) = ambig_tx_ref {
            if ambig_tx_ref.as_bytes() != spliced.as_slice() {
                // Modify the spliced genomic sequence with the alt allele
                // and read the transcript alt out of the result
                let mut g_tx_alt = g_alt.clone();
                if is_rc {
                    g_tx_alt = revcomp(&g_tx_alt);
                }
                let Some(mod_offset) = spliced.len().checked_sub(ref_len as usize) else {
                    return Ok(());
                };
                let mut modified = spliced[..mod_offset].to_vec();
                modified.extend_from_slice(&g_tx_alt);
                let allele_offset = vp
                    .start
                    .tx_offset
                    .saturating_sub(ambig_start_pos.tx_offset)
                    as usize;
                if allele_offset > modified.len() {
                    return Err(VarmapError::Projection {
                        msg: format!(
                            "allele offset {} exceeds modified sequence length {}",
                            allele_offset,
                            modified.len()
                        ),
                    });
                }
                vp.tx_alt =
                    Some(String::from_utf8_lossy(&modified[allele_offset..]).into_owned());
            }
        }
    }
    Ok(())
}

/// Project a genomic variant onto a transcript.
///
/// Trims identical leading/trailing bases of ref and alt, shifts ambiguous
/// indels in the direction of transcription (but never across an
/// exon/intron boundary), projects both ends independently, and derives
/// transcript-space alleles where the region classification allows. The
/// alt allele must be plain IUPAC sequence — no symbolic alleles. This may
/// reposition `gwin`.
pub fn genomic_to_transcript(
    gwin: &mut dyn SeqWindow,
    g_region: &GenomicRegion,
    g_alt: &str,
    ali: &TxAlignment,
    tx_seq: &[u8],
    cfg: &ProjectConfig,
) -> Result<VpTx> {
    if !is_all_nt(g_alt.as_bytes()) {
        return Err(VarmapError::InvalidAllele {
            allele: g_alt.to_string(),
        });
    }
    gwin.fetch(&g_region.name, g_region.start, g_region.end)?;
    // Classify gaps (and their ambiguity spans) up front; shifting and the
    // anomalous-gap comparison below both depend on it
    let normalized;
    let ali = if ali.gap_info.is_empty() && ali.block_count() > 1 {
        normalized = expand_indel_gaps(ali, gwin, tx_seq, cfg.min_intron);
        &normalized
    } else {
        ali
    };
    let is_rc = ali.strand.is_minus();
    let (mut g_start, mut g_end) = (g_region.start, g_region.end);
    let mut g_ref = gwin.copy(g_start, g_end - g_start)?;
    let mut alt = g_alt.as_bytes().to_ascii_uppercase();
    if g_ref != alt {
        // Trim to the minimal representation; an asserted no-change keeps
        // its range so the assertion stays attached to it
        trim_ref_alt(&mut g_ref, &mut alt, &mut g_start, &mut g_end);
    }
    // Initial projection, to find exon boundaries and detect mismatch
    // between genome and transcript even if we shift later
    let start = pos_geno_to_tx(if is_rc { g_end } else { g_start }, ali, false, cfg.min_intron);
    let end = pos_geno_to_tx(if is_rc { g_start } else { g_end }, ali, true, cfg.min_intron);
    let tx_ref = get_tx_in_range(tx_seq, &start, &end);
    let genome_mismatch =
        genome_tx_mismatch(tx_ref.as_deref(), gwin, g_start, g_end, ali, cfg.min_intron)?;
    let mut vp = VpTx {
        tx_name: ali.q_name.clone(),
        start,
        end,
        g_ref: String::new(),
        g_alt: String::new(),
        tx_ref,
        tx_alt: None,
        bases_shifted: 0,
        genome_mismatch,
    };
    process_indels(
        &mut vp, gwin, g_start, g_end, &mut g_ref, &mut alt, ali, tx_seq, cfg,
    )?;
    if is_rc {
        g_ref = revcomp(&g_ref);
        alt = revcomp(&alt);
    }
    vp.g_ref = String::from_utf8_lossy(&g_ref).into_owned();
    vp.g_alt = String::from_utf8_lossy(&alt).into_owned();
    Ok(vp)
}
