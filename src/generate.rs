//! HGVS term generation
//!
//! Renders projected variants back into canonical g. / n. / c. / p. term
//! text. Insertions are re-expressed as duplications when the inserted
//! sequence repeats what precedes it; coding coordinates use the `-` / `*`
//! UTR prefixes and two-sided intron offsets computed by the projector.

use crate::align::TxAlignment;
use crate::config::{ProjectConfig, HGVS_SEVERAL};
use crate::project::{
    is_insertion_point, pos_geno_to_tx, range_is_single_base, slide_in_same_region,
    GenomicRegion, Region, VpPep, VpTx, VpTxPosition,
};
use crate::provider::GenbankCds;
use crate::seq::window::SeqWindow;
use crate::seq::{aa_to_abbr, revcomp, MemSeqWindow};
use crate::shift::{indel_shift, indel_shift_applicable, trim_ref_alt, ShiftDirection, NO_MAX};
use crate::Result;

/// If the inserted sequence duplicates what precedes `ref_point`, return
/// the duplicated length, tolerating a few bases of extra insertion at the
/// end ("dupins"). Zero when not a duplication.
fn find_dup(alt: &[u8], win: &mut dyn SeqWindow, ref_point: u32, is_rc: bool) -> u32 {
    let alt_len = alt.len() as u32;
    if alt_len == 0 {
        return 0;
    }
    // Don't underflow the sequence
    if !is_rc && alt_len > ref_point {
        return 0;
    }
    let seq_start = if is_rc { ref_point } else { ref_point - alt_len };
    let mut preceding = match win.copy(seq_start, alt_len) {
        Ok(seq) => seq,
        Err(_) => return 0,
    };
    if is_rc {
        preceding = revcomp(&preceding);
    }
    if preceding == alt {
        return alt_len;
    }
    // Insertion plus a few slop bases at the end, like "dupinsTAT"
    let search_limit = 5;
    for offset in 1..search_limit {
        if offset < alt.len() && alt[..alt.len() - offset] == preceding[offset..] {
            return (alt.len() - offset) as u32;
        }
    }
    0
}

/// HGVS wants a 2-base range around an insertion point — unless the
/// insertion duplicates preceding sequence, in which case it becomes a dup
/// on the preceding range. Adjusts `start`/`end` accordingly and returns
/// the dup length (0 if plain insertion). Preceding sequence comes from the
/// transcript for exonic insertions, from the genome otherwise.
fn tweak_ins_dup(
    start: &mut VpTxPosition,
    end: &mut VpTxPosition,
    alt: &[u8],
    gwin: &mut dyn SeqWindow,
    ali: &TxAlignment,
    tx_seq: &[u8],
    cfg: &ProjectConfig,
) -> u32 {
    if !is_insertion_point(start, end) {
        return 0;
    }
    // "insTCA" beats "dupTinsCA"; require at least half the insertion to
    // duplicate before calling it a dup
    let min_dup = (alt.len() / 2) as u32;
    let mut dup_len;
    if start.region == Region::Exon && end.region == Region::Exon {
        let mut tx_win = MemSeqWindow::new(ali.q_name.clone(), tx_seq.to_vec());
        dup_len = find_dup(alt, &mut tx_win, start.tx_offset, false);
        if dup_len > min_dup {
            // Found against the transcript, so the new start is exonic; in
            // case start was looking forward from a boundary, make its
            // other fields exonic too
            start.region = Region::Exon;
            start.tx_offset -= dup_len;
            start.g_distance = 0;
            start.intron3_tx_offset = 0;
            start.intron3_distance = 0;
        } else {
            dup_len = 0;
        }
    } else {
        let is_rc = ali.strand.is_minus();
        dup_len = find_dup(alt, gwin, start.g_offset, is_rc);
        if dup_len > min_dup {
            let new_g_offset = if is_rc {
                start.g_offset + dup_len
            } else {
                start.g_offset - dup_len
            };
            *start = pos_geno_to_tx(new_g_offset, ali, false, cfg.min_intron);
        } else {
            dup_len = 0;
        }
    }
    if dup_len == 0 {
        // Expand to the 2-base region around the insertion point:
        // start = base to the left, looking 5'; end = base to the right,
        // looking 3'
        let mut new_start = *end;
        slide_in_same_region(&mut new_start, -1);
        let mut new_end = *start;
        slide_in_same_region(&mut new_end, 1);
        *start = new_start;
        *end = new_end;
    }
    dup_len
}

/// How many of `seq`'s bases are N; 0 unless all of them are.
fn all_n_count(seq: &[u8]) -> usize {
    if !seq.is_empty() && seq.iter().all(|&b| b == b'N') {
        seq.len()
    } else {
        0
    }
}

/// Append the change-description suffix for nucleotide ref/alt alleles:
/// one of `=`, `>`, `del`, `dup`, `ins`, `inv`, `delins`. With
/// `break_delins`, deleted bases are spelled out (`delAGinsTT`).
fn append_nuc_changes(out: &mut String, rref: &[u8], alt: &[u8], dup_len: u32, break_delins: bool) {
    let rref = rref.to_ascii_uppercase();
    let alt = alt.to_ascii_uppercase();
    if rref == alt {
        out.push_str(&String::from_utf8_lossy(&rref));
        out.push('=');
        return;
    }
    let ref_len = rref.len();
    let alt_len = alt.len();
    let push_seq = |out: &mut String, seq: &[u8]| {
        out.push_str(&String::from_utf8_lossy(seq));
    };
    if ref_len == 1 && alt_len == 1 {
        out.push(rref[0] as char);
        out.push('>');
        out.push(alt[0] as char);
    } else if dup_len > 0 {
        out.push_str("dup");
        if dup_len as usize <= HGVS_SEVERAL {
            push_seq(out, &alt[..dup_len as usize]);
        }
        // Could be a pure duplication followed by insertion
        if alt_len > dup_len as usize {
            out.push_str("ins");
            push_seq(out, &alt[dup_len as usize..]);
        }
    } else if ref_len == 0 {
        let n = all_n_count(&alt);
        if n > 0 {
            out.push_str(&format!("ins{}", n));
        } else {
            out.push_str("ins");
            push_seq(out, &alt);
        }
    } else if alt_len == 0 {
        out.push_str("del");
        if ref_len <= HGVS_SEVERAL {
            push_seq(out, &rref);
        }
    } else if ref_len == alt_len && ref_len > 1 && revcomp(&rref) == alt {
        out.push_str("inv");
        if ref_len <= HGVS_SEVERAL {
            push_seq(out, &rref);
        }
    } else {
        out.push_str("del");
        if break_delins && ref_len <= HGVS_SEVERAL {
            push_seq(out, &rref);
        }
        let n = all_n_count(&alt);
        if n > 0 {
            out.push_str(&format!("ins{}", n));
        } else {
            out.push_str("ins");
            push_seq(out, &alt);
        }
    }
}

/// Append the change-description suffix for peptide ref/alt alleles.
fn append_pep_changes(out: &mut String, rref: &[u8], alt: &[u8], dup_len: u32) {
    let rref = rref.to_ascii_uppercase();
    let alt = alt.to_ascii_uppercase();
    if rref == alt {
        out.push('=');
        return;
    }
    let alt_abbr: String = alt.iter().map(|&aa| aa_to_abbr(aa)).collect();
    let ref_len = rref.len();
    let alt_len = alt.len();
    if ref_len == 1 && alt_len == 1 {
        out.push_str(&alt_abbr);
    } else if dup_len > 0 {
        out.push_str("dup");
        // Could be a pure duplication followed by insertion
        if alt_len > dup_len as usize {
            out.push_str("ins");
            out.push_str(&alt_abbr[(dup_len as usize * 3)..]);
        }
    } else if ref_len == 0 {
        out.push_str("ins");
        out.push_str(&alt_abbr);
    } else if alt_len == 0 {
        out.push_str("del");
    } else {
        out.push_str("delins");
        out.push_str(&alt_abbr);
    }
}

/// Coordinates for CDS-relative rendering: the prefix (`-` for 5' UTR,
/// `*` for 3' UTR, none within the CDS) and the 1-based coordinate.
pub fn tx_to_cds(tx_offset: u32, cds: &GenbankCds, is_start: bool) -> (&'static str, u32) {
    let end_cmp: i64 = if is_start { 0 } else { 1 };
    let one_based: u32 = if is_start { 1 } else { 0 };
    let closed_end: u32 = if is_start { 0 } else { 1 };
    let cmp = tx_offset as i64 - end_cmp;
    if cmp < cds.start as i64 {
        // 5' UTR: negative distance from CDS start
        ("-", cds.start - tx_offset + closed_end)
    } else if cmp < cds.end as i64 {
        ("", tx_offset - cds.start + one_based)
    } else {
        // 3' UTR: positive distance past CDS end
        ("*", tx_offset - cds.end + one_based)
    }
}

/// Render a projected position (start or end) as an HGVS coordinate,
/// CDS-relative when `cds` is given.
fn append_nuc_pos(out: &mut String, pos: &VpTxPosition, is_start: bool, cds: Option<&GenbankCds>) {
    let end_cmp: i64 = if is_start { 0 } else { 1 };
    let one_based: u32 = if is_start { 1 } else { 0 };
    let closed_end: u32 = if is_start { 0 } else { 1 };
    match pos.region {
        Region::Upstream => {
            let mut distance = pos.g_distance;
            if let Some(cds) = cds {
                distance += cds.start;
            }
            out.push_str(&format!("-{}", distance + closed_end));
        }
        Region::Downstream => {
            let distance = pos.tx_offset + pos.g_distance;
            match cds {
                Some(cds) => out.push_str(&format!("*{}", distance - cds.end + one_based)),
                None => out.push_str(&format!("{}", distance + one_based)),
            }
        }
        Region::Exon => match cds {
            Some(cds) => {
                let (prefix, coord) = tx_to_cds(pos.tx_offset, cds, is_start);
                out.push_str(&format!("{}{}", prefix, coord));
            }
            None => out.push_str(&format!("{}", pos.tx_offset + one_based)),
        },
        Region::Intron => {
            // If the intron length is odd, bias toward the 5' exon (the
            // middle base gets a positive offset)
            let (anchor, direction, intron_offset, anchor_is_start) =
                if pos.g_distance as i64 - end_cmp < pos.intron3_distance as i64 {
                    (pos.tx_offset, '+', pos.g_distance + one_based, false)
                } else {
                    (
                        pos.intron3_tx_offset,
                        '-',
                        pos.intron3_distance + closed_end,
                        true,
                    )
                };
            let (prefix, coord) = match cds {
                Some(cds) => tx_to_cds(anchor, cds, anchor_is_start),
                None => ("", anchor + if anchor_is_start { 1 } else { 0 }),
            };
            out.push_str(&format!("{}{}{}{}", prefix, coord, direction, intron_offset));
        }
    }
}

/// Render an HGVS g. term for a genomic variant: reference allele from the
/// window, alternate supplied. Indels are 3'-shifted and re-expressed as
/// dup where applicable. `acc` overrides the region's sequence name.
pub fn hgvs_g(
    gwin: &mut dyn SeqWindow,
    region: &GenomicRegion,
    alt: &str,
    acc: Option<&str>,
    cfg: &ProjectConfig,
) -> Result<String> {
    let mut out = format!("{}:g.", acc.unwrap_or(&region.name));
    gwin.fetch(&region.name, region.start, region.end)?;
    let (mut v_start, mut v_end) = (region.start, region.end);
    let mut rref = gwin.copy(v_start, v_end - v_start)?;
    let mut alt_cpy = alt.as_bytes().to_ascii_uppercase();
    if rref != alt_cpy {
        // Keep the asserted range for an explicit no-change
        trim_ref_alt(&mut rref, &mut alt_cpy, &mut v_start, &mut v_end);
    }
    let ref_len = rref.len() as u32;
    if indel_shift_applicable(rref.len(), alt_cpy.len())
        && indel_shift(
            gwin,
            &mut v_start,
            &mut v_end,
            &mut alt_cpy,
            NO_MAX,
            ShiftDirection::Right,
        ) > 0
    {
        rref = gwin.copy(v_start, ref_len)?;
    }
    let mut dup_len = 0u32;
    if ref_len == 1 {
        // Single base: single 1-based coordinate
        out.push_str(&format!("{}", v_start + 1));
    } else if ref_len == 0 {
        // Insertion or duplication
        let alt_len = alt_cpy.len() as u32;
        if alt_len > 0 && alt_len <= v_start {
            let preceding = gwin.copy(v_start - alt_len, alt_len)?;
            if preceding == alt_cpy {
                dup_len = alt_len;
            }
        }
        if dup_len > 0 {
            if dup_len == 1 {
                // Single-base duplication
                out.push_str(&format!("{}", v_start));
            } else {
                // Range of the dup_len bases preceding v_start
                out.push_str(&format!("{}_{}", v_start - dup_len + 1, v_start));
            }
        } else {
            // Two-base range enclosing the zero-base insertion point
            out.push_str(&format!("{}_{}", v_start, v_end + 1));
        }
    } else {
        // Deletion or MNV
        out.push_str(&format!("{}_{}", v_start + 1, v_end));
    }
    append_nuc_changes(&mut out, &rref, &alt_cpy, dup_len, cfg.break_delins);
    Ok(out)
}

/// Render an HGVS n. (non-coding transcript) term for a projected variant.
pub fn hgvs_n(
    vp: &VpTx,
    gwin: &mut dyn SeqWindow,
    ali: &TxAlignment,
    tx_seq: &[u8],
    cfg: &ProjectConfig,
) -> Result<String> {
    let mut out = format!("{}:n.", vp.tx_name);
    let alt = vp.alt_for_tx().as_bytes().to_vec();
    // Local copies: ins/dup rendering may adjust the range
    let mut start = vp.start;
    let mut end = vp.end;
    let dup_len = tweak_ins_dup(&mut start, &mut end, &alt, gwin, ali, tx_seq, cfg);
    append_nuc_pos(&mut out, &start, true, None);
    if !range_is_single_base(&start, &end) {
        out.push('_');
        append_nuc_pos(&mut out, &end, false, None);
    }
    let rref = vp.tx_ref.clone().unwrap_or_else(|| vp.g_ref.clone());
    append_nuc_changes(&mut out, rref.as_bytes(), &alt, dup_len, cfg.break_delins);
    Ok(out)
}

/// Render an HGVS c. (coding transcript) term for a projected variant.
/// Returns None when the span's region classification makes a c. term
/// ill-formed: start and end in different regions (and not an insertion
/// point), where no transcript allele can be stated.
pub fn hgvs_c(
    vp: &VpTx,
    gwin: &mut dyn SeqWindow,
    ali: &TxAlignment,
    cds: &GenbankCds,
    tx_seq: &[u8],
    cfg: &ProjectConfig,
) -> Result<Option<String>> {
    if vp.start.region != vp.end.region && !is_insertion_point(&vp.start, &vp.end) {
        return Ok(None);
    }
    let mut out = format!("{}:c.", vp.tx_name);
    let alt = vp.alt_for_tx().as_bytes().to_vec();
    let mut start = vp.start;
    let mut end = vp.end;
    let dup_len = tweak_ins_dup(&mut start, &mut end, &alt, gwin, ali, tx_seq, cfg);
    append_nuc_pos(&mut out, &start, true, Some(cds));
    if !range_is_single_base(&start, &end) {
        out.push('_');
        append_nuc_pos(&mut out, &end, false, Some(cds));
    }
    let rref = vp.tx_ref.clone().unwrap_or_else(|| vp.g_ref.clone());
    append_nuc_changes(&mut out, rref.as_bytes(), &alt, dup_len, cfg.break_delins);
    Ok(Some(out))
}

fn is_start_loss(pep: &VpPep) -> bool {
    pep.start == 0
        && pep.p_ref.as_deref().is_some_and(|r| r.starts_with('M'))
        && !pep.p_alt.as_deref().is_some_and(|a| a.starts_with('M'))
}

/// Render an HGVS p. (protein) term for a protein-projected variant.
/// Strict HGVS wraps predicted changes in parentheses; few tools do, so it
/// is behind `cfg.add_parens`. Returns None when the projection carries no
/// renderable change.
pub fn hgvs_p(pep: &VpPep, prot_seq: &[u8], cfg: &ProjectConfig) -> Option<String> {
    let mut out = format!("{}:p.", pep.name);
    if cfg.add_parens {
        out.push('(');
    }
    let prot_len = prot_seq.len() as u32;
    let hits_stop = |end: u32| {
        end > prot_len || (prot_seq.last() == Some(&b'X') && end == prot_len)
    };
    let ref_len = pep.end - pep.start;
    let p_ref = pep.p_ref.as_deref().unwrap_or("");
    let p_alt = pep.p_alt.as_deref().unwrap_or("");
    // For frameshift/extension predictions ref runs past the nominal range
    let ref_ext_len = if pep.p_ref.is_some() {
        p_ref.len() as u32
    } else {
        ref_len
    };
    let alt_len = p_alt.len() as u32;
    let ref_start_abbr = p_ref
        .as_bytes()
        .first()
        .map(|&aa| aa_to_abbr(aa).to_string())
        .unwrap_or_else(|| "?".to_string());
    if pep.cant_predict || is_start_loss(pep) {
        out.push('?');
    } else if pep.likely_no_change {
        out.push('=');
    } else if pep.frameshift {
        out.push_str(&format!("{}{}", ref_start_abbr, pep.start + 1));
        if alt_len <= 1 {
            out.push_str("Ter");
        } else {
            let alt_start_abbr = aa_to_abbr(p_alt.as_bytes()[0]);
            if hits_stop(pep.end) && alt_len > ref_ext_len {
                out.push_str(&format!("{}ext*{}", alt_start_abbr, alt_len - ref_ext_len));
            } else {
                out.push_str(&format!("{}fsTer{}", alt_start_abbr, alt_len));
            }
        }
    } else if hits_stop(pep.end) && alt_len > ref_ext_len {
        // Stop-loss extension that preserves frame
        let alt_start_abbr = aa_to_abbr(p_alt.as_bytes()[0]);
        out.push_str(&format!(
            "{}{}{}ext*{}",
            ref_start_abbr,
            pep.start + 1,
            alt_start_abbr,
            alt_len - ref_ext_len
        ));
    } else {
        let mut dup_len = 0;
        if ref_len == 0 && alt_len > 0 {
            // An insertion; is it a duplication?
            let mut win = MemSeqWindow::new(pep.name.clone(), prot_seq.to_vec());
            dup_len = find_dup(p_alt.as_bytes(), &mut win, pep.start, false);
        }
        if ref_len == 1 {
            out.push_str(&format!("{}{}", ref_start_abbr, pep.start + 1));
        } else {
            let mut range_start = pep.start;
            let mut range_end = pep.end;
            let mut start_abbr = ref_start_abbr.clone();
            if dup_len > 0 {
                // Duplication: the range moves to the preceding residues
                range_end = range_start;
                range_start -= dup_len;
                start_abbr = aa_to_abbr(prot_seq[range_start as usize]).to_string();
            } else if ref_len == 0 {
                // Insertion: 2-residue range around the insertion point
                range_start = range_start.checked_sub(1)?;
                start_abbr = aa_to_abbr(prot_seq[range_start as usize]).to_string();
                range_end += 1;
            }
            let last_abbr = if hits_stop(range_end) {
                aa_to_abbr(b'X').to_string()
            } else {
                aa_to_abbr(*prot_seq.get(range_end as usize - 1)?).to_string()
            };
            if dup_len == 1 {
                out.push_str(&format!("{}{}", start_abbr, range_start + 1));
            } else {
                out.push_str(&format!(
                    "{}{}_{}{}",
                    start_abbr,
                    range_start + 1,
                    last_abbr,
                    range_end
                ));
            }
        }
        append_pep_changes(&mut out, p_ref.as_bytes(), p_alt.as_bytes(), dup_len);
    }
    if cfg.add_parens {
        out.push(')');
    }
    Some(out)
}
