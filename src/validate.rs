//! Term validation and mapping to the genome
//!
//! Validation resolves a parsed term's accession against the collaborators,
//! checks declared coordinates, and compares the asserted reference allele
//! against the stored sequence — a mismatch is a diagnostic, not an error.
//! Mapping models the variant as a single-block pseudo-alignment in
//! transcript space and composes it through the transcript's spliced
//! alignment; intron offsets and upstream/downstream overhang are applied
//! to the mapped genomic interval afterward.

use crate::align::{map_tx_span, MappedRegion, Strand};
use crate::config::ProjectConfig;
use crate::hgvs::{HgvsSeqType, HgvsVariant};
use crate::provider::VariantSource;
use crate::seq::amino::{codon_for_aa, token_to_aa};
use once_cell::sync::Lazy;
use regex::Regex;

const AA_EXP: &str = r"(?:(?i:Ala|Arg|Asn|Asp|Cys|Gln|Glu|Gly|His|Ile|Leu|Lys|Met|Phe|Pro|Ser|Thr|Trp|Tyr|Val|Ter)|[ARNDCQEGHILKMFPSTWYVX*])";

static NUC_SUBST_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)([ACGTU])>").expect("nuc subst regex"));
static PROT_LEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(?P<aa>{})(?P<pos>[0-9]*)", AA_EXP)).expect("aa regex"));

/// Result of validating a term against the stored sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// The accession as stored by the collaborators (with version)
    pub found_acc: String,
    /// Stored version, when the accession carries one
    pub found_version: Option<u32>,
    /// Declared coordinates are consistent with the stored sequence
    pub coords_ok: bool,
    /// When the term asserts a reference allele that disagrees with the
    /// stored sequence: the actual stored allele. Non-fatal.
    pub diff_ref_allele: Option<String>,
}

/// Reference base asserted by a nucleotide substitution change, if any.
fn nuc_subst_ref(changes: &str) -> Option<u8> {
    NUC_SUBST_REF
        .captures(changes)
        .map(|c| c[1].as_bytes()[0].to_ascii_uppercase())
}

/// Leading amino acid asserted by a protein change, if any.
fn prot_leading_aa(changes: &str) -> Option<u8> {
    PROT_LEADING
        .captures(changes)
        .and_then(|c| token_to_aa(c.name("aa")?.as_str()))
}

/// Compare the term's asserted reference allele against the stored
/// sequence at `start0`. Returns the actual stored allele on mismatch.
fn check_ref_allele(hgvs: &HgvsVariant, start0: i64, seq: &[u8]) -> Option<String> {
    let is_protein = hgvs.seq_type == HgvsSeqType::Protein;
    let asserted = if is_protein {
        prot_leading_aa(&hgvs.changes)
    } else {
        nuc_subst_ref(&hgvs.changes)
    };
    if let Some(want) = asserted {
        let got = seq.get(start0 as usize)?.to_ascii_uppercase();
        if got != want {
            return Some((got as char).to_string());
        }
    }
    if is_protein {
        // Protein ranges assert a second reference residue after the '_'
        if let Some((_, tail)) = hgvs.changes.split_once('_') {
            if let Some(caps) = PROT_LEADING.captures(tail) {
                if let (Some(want), Ok(end1)) = (
                    token_to_aa(&caps["aa"]),
                    caps["pos"].parse::<usize>(),
                ) {
                    if end1 > 0 {
                        let got = seq.get(end1 - 1)?.to_ascii_uppercase();
                        if got != want {
                            return Some((got as char).to_string());
                        }
                    }
                }
            }
        }
    }
    None
}

/// Validate a parsed term: resolve the accession, check coordinate bounds,
/// and diagnose asserted-reference mismatches. Returns None when the
/// accession cannot be resolved at all.
pub fn validate<S: VariantSource + ?Sized>(src: &S, hgvs: &HgvsVariant) -> Option<Validation> {
    let stored = src.resolve_accession(&hgvs.seq_acc)?;
    let found_version = stored
        .rsplit_once('.')
        .and_then(|(_, v)| v.parse::<u32>().ok());
    let seq_len = src.sequence_len(&stored)? as i64;
    let (mut start, mut end) = hgvs.zero_based_half_open();
    let mut validation = Validation {
        found_acc: stored.clone(),
        found_version,
        coords_ok: false,
        diff_ref_allele: None,
    };
    match hgvs.seq_type {
        HgvsSeqType::Genomic | HgvsSeqType::Mito => {
            validation.coords_ok = start >= 0 && start < seq_len && end > 0 && end <= seq_len;
            if validation.coords_ok && nuc_subst_ref(&hgvs.changes).is_some() {
                if let Ok(seq) = src.fetch(&stored, start as u32, end.max(start + 1) as u32) {
                    validation.diff_ref_allele = check_ref_allele(hgvs, 0, &seq);
                }
            }
        }
        HgvsSeqType::Coding => {
            // Transcript terms may legitimately reach outside the sequence
            // (upstream, intron, downstream); only ordering is checkable
            // without mapping
            if let Some(cds) = src.cds(&stored) {
                start += if hgvs.start_is_utr3 {
                    cds.end as i64
                } else {
                    cds.start as i64
                };
                end += if hgvs.end_is_utr3 {
                    cds.end as i64
                } else {
                    cds.start as i64
                };
                validation.coords_ok = start <= end;
                if validation.coords_ok
                    && hgvs.start_offset == 0
                    && start >= 0
                    && start <= seq_len
                {
                    if let Ok(seq) = src.fetch_all(&stored) {
                        validation.diff_ref_allele = check_ref_allele(hgvs, start, &seq);
                    }
                }
            }
        }
        HgvsSeqType::Noncoding | HgvsSeqType::Rna | HgvsSeqType::Protein => {
            validation.coords_ok = start <= end;
            if validation.coords_ok && hgvs.start_offset == 0 && start >= 0 && start < seq_len {
                if let Ok(seq) = src.fetch_all(&stored) {
                    validation.diff_ref_allele = check_ref_allele(hgvs, start, &seq);
                }
            }
        }
    }
    Some(validation)
}

/// Transcript-space coordinates for a nucleotide term, with CDS offsets
/// applied and out-of-transcript overhang split off, so the in-transcript
/// part can be mapped through the alignment and the overhang re-applied on
/// the genome.
fn tx_coords_with_overhang(
    hgvs: &HgvsVariant,
    max_coord: i64,
    cds: Option<&crate::provider::GenbankCds>,
) -> (u32, u32, i64, i64) {
    let (mut start, mut end) = hgvs.zero_based_half_open();
    if hgvs.seq_type == HgvsSeqType::Coding {
        if let Some(cds) = cds {
            start += if hgvs.start_is_utr3 {
                cds.end as i64
            } else {
                cds.start as i64
            };
            end += if hgvs.end_is_utr3 {
                cds.end as i64
            } else {
                cds.start as i64
            };
        }
    }
    let mut upstream = 0i64;
    let mut downstream = 0i64;
    if start < 0 {
        upstream = -start;
        start = 0;
    } else if start >= max_coord {
        // Even the start is past the transcript: negative "upstream"
        upstream = -(start - max_coord + 1);
        start = max_coord - 1;
    }
    if end > max_coord {
        downstream = end - max_coord;
        end = max_coord;
    } else if end <= 0 {
        end += upstream;
        downstream = -upstream;
    }
    (start as u32, end as u32, upstream, downstream)
}

/// Apply intron offsets and upstream/downstream overhang to a mapped
/// genomic region, minding strand, clamping to the sequence bounds.
fn apply_offsets(
    region: &mut MappedRegion,
    hgvs: &HgvsVariant,
    upstream: i64,
    downstream: i64,
    t_size: u32,
) {
    let rev = region.strand.is_minus();
    let mut start = region.start as i64;
    let mut end = region.end as i64;
    if hgvs.start_offset != 0 {
        if rev {
            end -= hgvs.start_offset as i64;
        } else {
            start += hgvs.start_offset as i64;
        }
    }
    if hgvs.end_offset != 0 {
        if rev {
            start -= hgvs.end_offset as i64;
        } else {
            end += hgvs.end_offset as i64;
        }
    }
    if rev {
        start -= downstream;
        end += upstream;
    } else {
        start -= upstream;
        end += downstream;
    }
    region.start = start.clamp(0, t_size as i64) as u32;
    region.end = end.clamp(0, t_size as i64) as u32;
}

/// HGVS insertion coordinates name the flanking bases; collapse to the
/// zero-length insertion point.
fn adjust_ins_region(hgvs: &HgvsVariant, region: &mut MappedRegion) {
    if hgvs.is_insertion() {
        region.start += 1;
        region.end -= 1;
    }
}

fn map_g_dot<S: VariantSource + ?Sized>(
    src: &S,
    hgvs: &HgvsVariant,
) -> Option<MappedRegion> {
    let stored = src.resolve_accession(&hgvs.seq_acc)?;
    if hgvs.start1 <= 0 {
        return None;
    }
    let (start, end) = (hgvs.start1 as u32 - 1, hgvs.end as u32);
    // A regional accession (e.g. LRG) may itself align to a chromosome;
    // otherwise the coordinates stand on the accession's own sequence
    let mut region = match src.alignments_for(&stored).first() {
        Some(ali) => map_tx_span(ali, start, end)?,
        None => MappedRegion {
            name: stored,
            start,
            end,
            strand: Strand::Plus,
        },
    };
    adjust_ins_region(hgvs, &mut region);
    Some(region)
}

fn map_nuc<S: VariantSource + ?Sized>(
    src: &S,
    hgvs: &HgvsVariant,
) -> Option<MappedRegion> {
    if matches!(hgvs.seq_type, HgvsSeqType::Genomic | HgvsSeqType::Mito) {
        return map_g_dot(src, hgvs);
    }
    let stored = src.resolve_accession(&hgvs.seq_acc)?;
    let alignments = src.alignments_for(&stored);
    let ali = alignments.first()?;
    let cds = src.cds(&stored);
    if hgvs.seq_type == HgvsSeqType::Coding && cds.is_none() {
        return None;
    }
    let (start, end, upstream, downstream) =
        tx_coords_with_overhang(hgvs, ali.q_end() as i64, cds.as_ref());
    let mut region = map_tx_span(ali, start, end)?;
    apply_offsets(&mut region, hgvs, upstream, downstream, ali.t_size);
    adjust_ins_region(hgvs, &mut region);
    Some(region)
}

fn map_p_dot<S: VariantSource + ?Sized>(
    src: &S,
    hgvs: &HgvsVariant,
) -> Option<MappedRegion> {
    let tx_acc = if hgvs.seq_acc.starts_with("LRG_") {
        // Each LRG_NpM has a corresponding LRG_NtM
        match hgvs.seq_acc.rfind('p') {
            Some(ix) => {
                let mut tx = hgvs.seq_acc.clone();
                tx.replace_range(ix..ix + 1, "t");
                tx
            }
            None => return None,
        }
    } else {
        src.nm_for_np(&hgvs.seq_acc)
            .or_else(|| src.nm_for_np(hgvs.versionless_acc()))?
    };
    // Re-expand amino acids to an arbitrary representative codon; the
    // exact codon is genuinely ambiguous without transcript data, and only
    // the positions matter for the mapped interval
    let changes = expand_aa_changes(&hgvs.changes).unwrap_or_default();
    let c_dot = HgvsVariant {
        seq_acc: tx_acc,
        gene_symbol: hgvs.gene_symbol.clone(),
        seq_type: HgvsSeqType::Coding,
        start1: (hgvs.start1 - 1) * 3 + 1,
        end: (hgvs.end - 1) * 3 + 3,
        start_offset: 0,
        end_offset: 0,
        start_is_utr3: false,
        end_is_utr3: false,
        changes,
    };
    map_nuc(src, &c_dot)
}

/// Turn a protein substitution description into a representative-codon
/// nucleotide description (e.g. `Gly12Asp` to `GGT>GAT`).
fn expand_aa_changes(changes: &str) -> Option<String> {
    let caps = PROT_LEADING.captures(changes)?;
    let ref_aa = token_to_aa(caps.name("aa")?.as_str())?;
    let pos_end = caps.get(0)?.end();
    let alt_caps = PROT_LEADING.captures(&changes[pos_end..])?;
    let alt_aa = token_to_aa(alt_caps.name("aa")?.as_str())?;
    let ref_codon = codon_for_aa(ref_aa)?;
    let alt_codon = codon_for_aa(alt_aa)?;
    Some(format!(
        "{}>{}",
        std::str::from_utf8(ref_codon).ok()?,
        std::str::from_utf8(alt_codon).ok()?
    ))
}

/// Map a parsed term to a genomic interval. Returns None when the
/// accession has no alignment on record, the CDS lookup fails for a coding
/// term, or the span cannot be anchored. Mapping does not validate; see
/// [`validate_and_map`].
pub fn map_to_genome<S: VariantSource + ?Sized>(
    src: &S,
    hgvs: &HgvsVariant,
    _cfg: &ProjectConfig,
) -> Option<MappedRegion> {
    match hgvs.seq_type {
        HgvsSeqType::Protein => map_p_dot(src, hgvs),
        _ => map_nuc(src, hgvs),
    }
}

/// Outcome of [`validate_and_map`]: the mapped region (when mapping
/// succeeded) plus any diagnostics worth reporting to a user.
#[derive(Debug, Clone, Default)]
pub struct MapOutcome {
    pub region: Option<MappedRegion>,
    pub warnings: Vec<String>,
}

/// Validate a term and, if its coordinates check out, map it to the
/// genome. Version skew and reference-allele mismatches are reported as
/// warnings alongside a successful mapping; a missing accession or bad
/// coordinates yield no region.
pub fn validate_and_map<S: VariantSource + ?Sized>(
    src: &S,
    hgvs: &HgvsVariant,
    term: &str,
    cfg: &ProjectConfig,
) -> MapOutcome {
    let mut outcome = MapOutcome::default();
    let Some(validation) = validate(src, hgvs) else {
        outcome.warnings.push(format!(
            "Can't find sequence for accession '{}'",
            hgvs.seq_acc
        ));
        return outcome;
    };
    if let (Some(term_version), Some(found_version)) = (hgvs.version(), validation.found_version)
    {
        if term_version != found_version {
            outcome.warnings.push(format!(
                "HGVS term '{}' is based on {} but stored sequence is version {}",
                term, hgvs.seq_acc, found_version
            ));
        }
    }
    if !validation.coords_ok {
        outcome.warnings.push(format!(
            "HGVS term '{}' has coordinates outside the bounds of {}",
            term, validation.found_acc
        ));
        return outcome;
    }
    if let Some(actual) = &validation.diff_ref_allele {
        outcome.warnings.push(format!(
            "HGVS term '{}' reference value does not match {} value '{}'",
            term, validation.found_acc, actual
        ));
    }
    outcome.region = map_to_genome(src, hgvs, cfg);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hgvs::parse_term;
    use crate::provider::MemSource;

    fn cfg() -> ProjectConfig {
        ProjectConfig::default()
    }

    #[test]
    fn test_validate_coding_ok() {
        let src = MemSource::with_test_data();
        // CDS starts at tx offset 10; c.1 is tx offset 10 = 'A' of ATG
        let hgvs = parse_term("NM_000001.1:c.1A>G").unwrap();
        let v = validate(&src, &hgvs).unwrap();
        assert!(v.coords_ok);
        assert_eq!(v.found_acc, "NM_000001.1");
        assert_eq!(v.found_version, Some(1));
        assert_eq!(v.diff_ref_allele, None);
    }

    #[test]
    fn test_validate_reports_ref_mismatch() {
        let src = MemSource::with_test_data();
        let hgvs = parse_term("NM_000001.1:c.1C>G").unwrap();
        let v = validate(&src, &hgvs).unwrap();
        assert!(v.coords_ok);
        assert_eq!(v.diff_ref_allele.as_deref(), Some("A"));
    }

    #[test]
    fn test_validate_unknown_accession() {
        let src = MemSource::with_test_data();
        let hgvs = parse_term("NM_424242.9:c.1A>G").unwrap();
        assert!(validate(&src, &hgvs).is_none());
    }

    #[test]
    fn test_validate_protein_residue() {
        let src = MemSource::with_test_data();
        // Protein position 2 is Gly
        let hgvs = parse_term("NP_000001.1:p.Gly2Asp").unwrap();
        let v = validate(&src, &hgvs).unwrap();
        assert!(v.coords_ok);
        assert_eq!(v.diff_ref_allele, None);
        // Wrong asserted residue reports the stored one
        let hgvs = parse_term("NP_000001.1:p.Trp2Asp").unwrap();
        let v = validate(&src, &hgvs).unwrap();
        assert_eq!(v.diff_ref_allele.as_deref(), Some("G"));
    }

    #[test]
    fn test_validate_genomic_bounds() {
        let src = MemSource::with_test_data();
        let hgvs = parse_term("chr1:g.99999999A>G");
        // chr terms only parse via the pseudo grammar
        assert!(hgvs.is_none());
        let hgvs = crate::hgvs::parse_pseudo_hgvs(&src, "chr1:g.99999999A>G").unwrap();
        let v = validate(&src, &hgvs).unwrap();
        assert!(!v.coords_ok);
    }

    #[test]
    fn test_map_coding_snv() {
        let src = MemSource::with_test_data();
        // c.1 = tx offset 10 = chr1 offset 110 (exon 1 starts at 100)
        let hgvs = parse_term("NM_000001.1:c.1A>G").unwrap();
        let region = map_to_genome(&src, &hgvs, &cfg()).unwrap();
        assert_eq!(region.name, "chr1");
        assert_eq!((region.start, region.end), (110, 111));
        assert_eq!(region.strand, Strand::Plus);
    }

    #[test]
    fn test_map_coding_across_exons() {
        let src = MemSource::with_test_data();
        // c.91 is tx offset 100 = first base of exon 2 at chr1 300
        let hgvs = parse_term("NM_000001.1:c.91G>T").unwrap();
        let region = map_to_genome(&src, &hgvs, &cfg()).unwrap();
        assert_eq!((region.start, region.end), (300, 301));
    }

    #[test]
    fn test_map_intron_offset() {
        let src = MemSource::with_test_data();
        // c.90+5: tx offset 100 maps to chr1 200 (exon 1 end); +5 into the
        // intron
        let hgvs = parse_term("NM_000001.1:c.90+5G>T").unwrap();
        let region = map_to_genome(&src, &hgvs, &cfg()).unwrap();
        assert_eq!((region.start, region.end), (204, 205));
    }

    #[test]
    fn test_map_utr3_anchor() {
        let src = MemSource::with_test_data();
        // c.*1 = tx offset 280 = chr1 offset 460 + (280-200) = 540
        let hgvs = parse_term("NM_000001.1:c.*1G>T").unwrap();
        let region = map_to_genome(&src, &hgvs, &cfg()).unwrap();
        assert_eq!((region.start, region.end), (540, 541));
    }

    #[test]
    fn test_map_minus_strand_transcript() {
        let src = MemSource::with_test_data();
        // NM_000002.1 on the minus strand: c.1 = tx offset 20; forward tx
        // [20,21) is stored coords [179,180) -> block1 offset 79 -> chr1
        // 979..980
        let hgvs = parse_term("NM_000002.1:c.1A>G").unwrap();
        let region = map_to_genome(&src, &hgvs, &cfg()).unwrap();
        assert_eq!((region.start, region.end), (979, 980));
        assert_eq!(region.strand, Strand::Minus);
    }

    #[test]
    fn test_map_insertion_collapses_to_point() {
        let src = MemSource::with_test_data();
        let hgvs = parse_term("NM_000001.1:c.1_2insACG").unwrap();
        let region = map_to_genome(&src, &hgvs, &cfg()).unwrap();
        // 2-base flanking range collapses to the zero-length point between
        assert_eq!((region.start, region.end), (111, 111));
    }

    #[test]
    fn test_map_protein_term() {
        let src = MemSource::with_test_data();
        // p.Gly2 covers codon 2 = c.4_6 = tx [13,16) = chr1 [113,116)
        let hgvs = parse_term("NP_000001.1:p.Gly2Asp").unwrap();
        let region = map_to_genome(&src, &hgvs, &cfg()).unwrap();
        assert_eq!((region.start, region.end), (113, 116));
    }

    #[test]
    fn test_map_no_alignment_is_none() {
        let mut src = MemSource::with_test_data();
        src.add_sequence("NM_777777.1", "ACGTACGTACGT");
        src.add_cds("NM_777777.1", crate::provider::GenbankCds::new(0, 12));
        let hgvs = parse_term("NM_777777.1:c.2C>G").unwrap();
        assert!(map_to_genome(&src, &hgvs, &cfg()).is_none());
    }

    #[test]
    fn test_validate_and_map_warns_on_version() {
        let src = MemSource::with_test_data();
        let hgvs = parse_term("NM_000001.3:c.1A>G").unwrap();
        let outcome = validate_and_map(&src, &hgvs, "NM_000001.3:c.1A>G", &cfg());
        // Versionless resolution finds .1 and warns about the skew
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.contains("version")));
    }

    #[test]
    fn test_validate_and_map_unknown_acc() {
        let src = MemSource::with_test_data();
        let hgvs = parse_term("NM_424242.9:c.1A>G").unwrap();
        let outcome = validate_and_map(&src, &hgvs, "NM_424242.9:c.1A>G", &cfg());
        assert!(outcome.region.is_none());
        assert!(!outcome.warnings.is_empty());
    }
}
