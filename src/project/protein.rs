//! Protein-level projection of coding transcript variants
//!
//! Translates the affected codons, detects frameshifts and stop loss,
//! shifts the reported position to the first amino acid that actually
//! differs (the C-terminal analog of the nucleotide 3' rule), and flags
//! predictions that cannot be made reliably rather than guessing.

use crate::config::ProjectConfig;
use crate::project::{Region, VpTx};
use crate::provider::GenbankCds;
use crate::seq::{translate, MemSeqWindow};
use crate::shift::{indel_shift, indel_shift_applicable, trim_ref_alt, ShiftDirection, NO_MAX};

/// A variant projected onto a protein sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpPep {
    /// Protein accession
    pub name: String,
    /// 0-based start amino-acid offset
    pub start: u32,
    /// End amino-acid offset (exclusive)
    pub end: u32,
    /// Reference amino acids over the affected range ('X' = stop); for a
    /// frameshift this extends to the end of the protein
    pub p_ref: Option<String>,
    /// Predicted alternate amino acids
    pub p_alt: Option<String>,
    /// Amino acids right-shifted to the first real difference
    pub right_shifted: u32,
    /// The translated transcript disagrees with the supplied protein
    /// sequence (stale or alternate annotation)
    pub tx_mismatch: bool,
    /// Variant length change is not a multiple of three
    pub frameshift: bool,
    /// Variant spans the UTR/CDS boundary
    pub spans_utr_cds: bool,
    /// Variant is within the transcript's neighborhood but cannot change
    /// the protein (UTR, deep intron, flank)
    pub likely_no_change: bool,
    /// Effect is algorithmically underdetermined; report uncertainty
    /// instead of guessing
    pub cant_predict: bool,
}

/// Project a coding transcript variant onto the protein.
///
/// Returns None when the CDS is absent or its start is not annotated as
/// complete — codon framing would be a guess. Otherwise always returns a
/// `VpPep`; when the variant cannot affect the protein or cannot be
/// predicted, the corresponding flag is set.
pub fn transcript_to_protein(
    vp_tx: &VpTx,
    cds: &GenbankCds,
    tx_seq: &[u8],
    prot_seq: &[u8],
    prot_name: &str,
    cfg: &ProjectConfig,
) -> Option<VpPep> {
    if cds.is_empty() || !cds.start_complete {
        return None;
    }
    let mut pep = VpPep {
        name: prot_name.to_string(),
        start: 0,
        end: 0,
        p_ref: None,
        p_alt: None,
        right_shifted: 0,
        tx_mismatch: false,
        frameshift: false,
        spans_utr_cds: false,
        likely_no_change: false,
        cant_predict: false,
    };
    let tx_start = vp_tx.start.tx_offset;
    let tx_end = vp_tx.end.tx_offset;
    let exonic = vp_tx.start.region == Region::Exon && vp_tx.end.region == Region::Exon;
    if tx_start < cds.end && tx_end > cds.start && exonic {
        project_coding(&mut pep, vp_tx, cds, tx_seq, prot_seq, cfg);
    } else if vp_tx.start.region == vp_tx.end.region
        && (vp_tx.start.region == Region::Exon // all UTR
            || vp_tx.start.region == Region::Upstream
            || vp_tx.start.region == Region::Downstream
            || (vp_tx.start.region == Region::Intron
                && vp_tx.start.g_distance >= cfg.splice_region_fudge
                && vp_tx.start.intron3_distance >= cfg.splice_region_fudge
                && vp_tx.end.g_distance >= cfg.splice_region_fudge
                && vp_tx.end.intron3_distance >= cfg.splice_region_fudge))
    {
        // Outside the CDS and away from splice junctions: no change to
        // the protein is the accepted call
        pep.likely_no_change = true;
    } else {
        pep.cant_predict = true;
    }
    Some(pep)
}

/// The exonic, CDS-overlapping case: translate reference and alternate
/// codons and reduce to the minimal protein change.
fn project_coding(
    pep: &mut VpPep,
    vp_tx: &VpTx,
    cds: &GenbankCds,
    tx_seq: &[u8],
    prot_seq: &[u8],
    _cfg: &ProjectConfig,
) {
    let tx_start = vp_tx.start.tx_offset;
    let tx_end = vp_tx.end.tx_offset;
    if tx_start < cds.start {
        pep.spans_utr_cds = true;
    }
    let start_in_cds = tx_start.max(cds.start) - cds.start;
    let end_in_cds = tx_end.min(cds.end) - cds.start;
    pep.start = start_in_cds / 3;
    pep.end = (end_in_cds + 2) / 3;
    let codon_start_in_cds = pep.start * 3;
    let codon_end_in_cds = pep.end * 3;
    // Reference translation over the affected codons
    let trans_from = ((cds.start + codon_start_in_cds) as usize).min(tx_seq.len());
    let trans_to = ((cds.start + codon_end_in_cds) as usize)
        .min(tx_seq.len())
        .max(trans_from);
    let tx_trans = translate(&tx_seq[trans_from..trans_to]);
    // The protein needs a terminal 'X' because the affected range can be
    // the stop codon
    let mut p_seq = prot_seq.to_ascii_uppercase();
    if p_seq.last() != Some(&b'X') {
        p_seq.push(b'X');
    }
    let p_range = p_seq
        .get(pep.start as usize..(pep.start as usize + tx_trans.len()).min(p_seq.len()));
    pep.tx_mismatch = match p_range {
        Some(expected) => tx_trans[..expected.len()] != *expected,
        None => true,
    };
    let start_padding = (start_in_cds - codon_start_in_cds) as usize;
    let end_padding = (codon_end_in_cds - end_in_cds) as usize;
    let tx_alt = vp_tx.alt_for_tx().as_bytes().to_vec();
    let tx_ref_len = (tx_end - tx_start) as i64;
    let utr5_bases = cds.start.saturating_sub(tx_start) as usize;

    let mut alt_codons: Vec<u8> = Vec::new();
    if start_padding > 0 {
        // Unchanged first base or two of the ref codons
        let pad_to = (trans_from + start_padding).min(tx_seq.len());
        alt_codons.extend_from_slice(&tx_seq[trans_from..pad_to]);
    }
    if tx_alt.len() > utr5_bases {
        alt_codons.extend_from_slice(&tx_alt[utr5_bases..]);
    }
    let after_alt = alt_codons.len();
    if !pep.spans_utr_cds && (tx_ref_len - tx_alt.len() as i64).rem_euclid(3) != 0 {
        pep.frameshift = true;
        // Ref extends to the end of the protein; alt runs into the rest of
        // the transcript to find the next stop
        pep.p_ref = Some(String::from_utf8_lossy(&p_seq[(pep.start as usize).min(p_seq.len())..]).into_owned());
        alt_codons.extend_from_slice(&tx_seq[(tx_end as usize).min(tx_seq.len())..]);
    } else {
        let ref_end = (pep.end as usize).min(p_seq.len());
        pep.p_ref = Some(
            String::from_utf8_lossy(&p_seq[(pep.start as usize).min(ref_end)..ref_end])
                .into_owned(),
        );
        if end_padding > 0 {
            // Unchanged last base or two of the ref codons
            let from = (cds.start + end_in_cds) as usize;
            let to = (from + end_padding).min(tx_seq.len());
            alt_codons.extend_from_slice(&tx_seq[from.min(tx_seq.len())..to]);
        }
    }
    let mut alt = translate(&alt_codons);
    let ref_ends_with_stop = pep.p_ref.as_deref().is_some_and(|r| r.ends_with('X'));
    if ref_ends_with_stop && alt.last() != Some(&b'X') {
        // Stop loss: keep translating into the rest of the transcript
        alt_codons.truncate(after_alt);
        alt_codons.extend_from_slice(&tx_seq[(tx_end as usize).min(tx_seq.len())..]);
        alt = translate(&alt_codons);
    }
    if !pep.spans_utr_cds {
        let mut p_ref_bytes = pep.p_ref.take().unwrap_or_default().into_bytes();
        if p_ref_bytes != alt {
            // Disguise the alt's stop so trimming can't eat it
            let stop_ix = alt.iter().position(|&b| b == b'X');
            if let Some(ix) = stop_ix {
                alt[ix] = b'Z';
            }
            trim_ref_alt(&mut p_ref_bytes, &mut alt, &mut pep.start, &mut pep.end);
            if let Some(ix) = alt.iter().position(|&b| b == b'Z') {
                alt[ix] = b'X';
            }
        }
        if indel_shift_applicable(p_ref_bytes.len(), alt.len()) {
            // Shift toward the C terminus to the first differing residue
            let mut win = MemSeqWindow::new(pep.name.clone(), p_seq.clone());
            pep.right_shifted = indel_shift(
                &mut win,
                &mut pep.start,
                &mut pep.end,
                &mut alt,
                NO_MAX,
                ShiftDirection::Right,
            );
        }
        pep.p_ref = Some(String::from_utf8_lossy(&p_ref_bytes).into_owned());
    }
    pep.p_alt = Some(String::from_utf8_lossy(&alt).into_owned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::VpTxPosition;

    // Transcript: 9-base 5' UTR, then ATG GGT GCT GTT TAA, then 3' UTR
    const TX: &[u8] = b"GGCAGCAGCATGGGTGCTGTTTAAGCAGCAGCA";
    const CDS_START: u32 = 9;
    const CDS_END: u32 = 24;
    const PROT: &[u8] = b"MGAV"; // stored without the stop

    fn cds() -> GenbankCds {
        GenbankCds::new(CDS_START, CDS_END)
    }

    fn exon_pos(tx_offset: u32) -> VpTxPosition {
        VpTxPosition {
            region: Region::Exon,
            tx_offset,
            g_distance: 0,
            intron3_tx_offset: 0,
            intron3_distance: 0,
            g_offset: 0,
            ali_blk_ix: Some(0),
            g_ins_len: 0,
        }
    }

    fn vp_tx(tx_start: u32, tx_end: u32, g_ref: &str, g_alt: &str) -> VpTx {
        VpTx {
            tx_name: "NM_TEST.1".to_string(),
            start: exon_pos(tx_start),
            end: exon_pos(tx_end),
            g_ref: g_ref.to_string(),
            g_alt: g_alt.to_string(),
            tx_ref: Some(g_ref.to_string()),
            tx_alt: None,
            bases_shifted: 0,
            genome_mismatch: false,
        }
    }

    fn project(vp: &VpTx) -> VpPep {
        transcript_to_protein(vp, &cds(), TX, PROT, "NP_TEST.1", &ProjectConfig::default())
            .unwrap()
    }

    #[test]
    fn test_missense_snv() {
        // tx offset 13 is codon 2 position 2: GGT -> GAT = Gly -> Asp
        let vp = vp_tx(13, 14, "G", "A");
        let pep = project(&vp);
        assert_eq!(pep.start, 1);
        assert_eq!(pep.end, 2);
        assert_eq!(pep.p_ref.as_deref(), Some("G"));
        assert_eq!(pep.p_alt.as_deref(), Some("D"));
        assert!(!pep.frameshift);
        assert!(!pep.tx_mismatch);
        assert!(!pep.cant_predict);
    }

    #[test]
    fn test_synonymous_snv() {
        // Codon 2 GGT -> GGA, both Gly: trimming is skipped (ref == alt)
        let vp = vp_tx(14, 15, "T", "A");
        let pep = project(&vp);
        assert_eq!(pep.p_ref, pep.p_alt);
        assert!(!pep.frameshift);
    }

    #[test]
    fn test_frameshift_insertion() {
        // 1-base insertion inside the CDS
        let vp = vp_tx(13, 13, "", "A");
        let pep = project(&vp);
        assert!(pep.frameshift);
        // Ref extends to the end of the protein (with stop)
        assert_eq!(pep.p_ref.as_deref(), Some("GAVX"));
    }

    #[test]
    fn test_inframe_deletion() {
        // Delete codon 2 (GGT) exactly: tx [12,15)
        let vp = vp_tx(12, 15, "GGT", "");
        let pep = project(&vp);
        assert!(!pep.frameshift);
        assert_eq!(pep.p_ref.as_deref(), Some("G"));
        assert_eq!(pep.p_alt.as_deref(), Some(""));
        assert_eq!((pep.start, pep.end), (1, 2));
    }

    #[test]
    fn test_stop_loss_extends() {
        // Change the stop codon TAA (tx [21,24)) to CAA (Gln): translation
        // must continue into the 3' UTR
        let vp = vp_tx(21, 22, "T", "C");
        let pep = project(&vp);
        assert_eq!(pep.p_ref.as_deref(), Some("X"));
        let alt = pep.p_alt.unwrap();
        assert!(alt.starts_with('Q'));
        assert!(alt.len() > 1);
    }

    #[test]
    fn test_tx_mismatch_flag() {
        let vp = vp_tx(13, 14, "G", "A");
        let wrong_prot = b"MWAV";
        let pep = transcript_to_protein(
            &vp,
            &cds(),
            TX,
            wrong_prot,
            "NP_TEST.1",
            &ProjectConfig::default(),
        )
        .unwrap();
        assert!(pep.tx_mismatch);
    }

    #[test]
    fn test_utr_variant_no_change() {
        let vp = vp_tx(2, 3, "C", "T");
        let pep = project(&vp);
        assert!(pep.likely_no_change);
        assert!(!pep.cant_predict);
        assert!(pep.p_ref.is_none());
    }

    #[test]
    fn test_mixed_region_cant_predict() {
        let mut vp = vp_tx(13, 14, "G", "A");
        vp.end.region = Region::Intron;
        let pep = project(&vp);
        assert!(pep.cant_predict);
    }

    #[test]
    fn test_splice_adjacent_intron_cant_predict() {
        let mut vp = vp_tx(13, 14, "G", "A");
        for pos in [&mut vp.start, &mut vp.end] {
            pos.region = Region::Intron;
            pos.g_distance = 2;
            pos.intron3_distance = 90;
        }
        let pep = project(&vp);
        assert!(pep.cant_predict);
        // Deep intronic is a no-change call instead
        for pos in [&mut vp.start, &mut vp.end] {
            pos.g_distance = 50;
            pos.intron3_distance = 50;
        }
        let pep = project(&vp);
        assert!(pep.likely_no_change);
    }

    #[test]
    fn test_no_cds_returns_none() {
        let vp = vp_tx(13, 14, "G", "A");
        let mut incomplete = cds();
        incomplete.start_complete = false;
        assert!(transcript_to_protein(
            &vp,
            &incomplete,
            TX,
            PROT,
            "NP_TEST.1",
            &ProjectConfig::default()
        )
        .is_none());
    }

    #[test]
    fn test_protein_right_shift() {
        // Transcript coding for M G G G A: deleting the first G codon
        // right-shifts to the last equivalent position
        let tx = b"ATGGGTGGTGGTGCTTAA";
        let cds = GenbankCds::new(0, 18);
        let prot = b"MGGGA";
        let vp = vp_tx(3, 6, "GGT", "");
        let pep = transcript_to_protein(&vp, &cds, tx, prot, "NP_TEST.1", &ProjectConfig::default())
            .unwrap();
        assert!(!pep.frameshift);
        assert_eq!(pep.p_alt.as_deref(), Some(""));
        assert!(pep.right_shifted > 0);
        assert_eq!((pep.start, pep.end), (3, 4));
    }
}
