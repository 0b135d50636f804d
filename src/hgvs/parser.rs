//! HGVS term parsing
//!
//! A term is matched against a sequence of named sub-grammars; the first
//! grammar that matches wins. Matching is purely syntactic — accessions,
//! coordinates, and alleles are not checked against any real sequence
//! here. Failure to match every grammar yields `None`, never an error.
//!
//! `parse_pseudo_hgvs` additionally accepts common loose forms
//! (`GENE p.Ala123Val`, `NM_... p.Arg97Pro`, `chr1:g.123A>G`, ...) by
//! resolving gene symbols through the metadata collaborator and rewriting
//! into strict terms.

use crate::hgvs::{HgvsSeqType, HgvsVariant};
use crate::provider::{GeneLookup, SequenceSource};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const GENE: &str = r"[A-Za-z0-9./_-]+";

// Amino acids: one-letter codes (with * / X for stop) or three-letter
// codes, case-insensitive
const AA: &str = r"(?:(?i:Ala|Arg|Asn|Asp|Cys|Gln|Glu|Gly|His|Ile|Leu|Lys|Met|Phe|Pro|Ser|Thr|Trp|Tyr|Val|Ter)|[ARNDCQEGHILKMFPSTWYVX*])";

// g./m. position: 1-based start, optional range end
const GPOS: &str = r"(?P<spos>[0-9]+)(?:_(?P<epos>[0-9]+))?";

// c./n. position: optional UTR anchor, anchor base, optional intron offset,
// optionally repeated for a range end
const CPOS: &str = r"(?P<sa>[-*])?(?P<spos>[0-9]+)(?:(?P<sop>[-+])(?P<soff>[0-9]+))?(?:_(?P<ea>[-*])?(?P<epos>[0-9]+)(?:(?P<eop>[-+])(?P<eoff>[0-9]+))?)?";

fn refseq_acc(prefix: &str) -> String {
    format!(
        r"(?P<acc>{}_[0-9]+(?:\.[0-9]+)?)(?:\((?P<gene>{})\))?",
        prefix, GENE
    )
}

fn re(pattern: String) -> Regex {
    Regex::new(&pattern).expect("static grammar regex")
}

// ---- strict grammars, tried in order ----------------------------------

static LRG_C: Lazy<Regex> =
    Lazy::new(|| re(format!(r"^(?P<acc>LRG_[0-9]+t[0-9]+)[ :]+c\.?{}(?P<change>.*)$", CPOS)));
static ENS_C: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<acc>ENS(?:[A-Z]{{3}})?T[0-9]+\.[0-9]+)[ :]+c\.?{}(?P<change>.*)$",
        CPOS
    ))
});
static REFSEQ_C: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^{}[ :]+c\.?{}(?P<change>.*)$",
        refseq_acc("[NX]M"),
        CPOS
    ))
});
static LRG_N: Lazy<Regex> =
    Lazy::new(|| re(format!(r"^(?P<acc>LRG_[0-9]+t[0-9]+)[ :]+n\.?{}(?P<change>.*)$", CPOS)));
static ENS_N: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<acc>ENS(?:[A-Z]{{3}})?T[0-9]+\.[0-9]+)[ :]+n\.?{}(?P<change>.*)$",
        CPOS
    ))
});
static REFSEQ_N: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^{}[ :]+n\.?{}(?P<change>.*)$",
        refseq_acc("[NX][MR]"),
        CPOS
    ))
});

static LRG_P_SUBST: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<acc>LRG_[0-9]+p[0-9]+)[ :]+p\.\(?(?P<change>(?P<aref>{AA})(?P<pos>[0-9]+)(?P<aalt>{AA}|=))\)?"
    ))
});
static ENS_P_SUBST: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<acc>ENS(?:[A-Z]{{3}})?P[0-9]+\.[0-9]+)[ :]+p\.\(?(?P<change>(?P<aref>{AA})(?P<pos>[0-9]+)(?P<aalt>{AA}|=))\)?"
    ))
});
static REFSEQ_P_SUBST: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^{}[ :]+p\.\(?(?P<change>(?P<aref>{AA})(?P<pos>[0-9]+)(?P<aalt>{AA}|=))\)?",
        refseq_acc("[NX]P")
    ))
});

static LRG_P_RANGE: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<acc>LRG_[0-9]+p[0-9]+)[ :]+p\.\(?(?P<change>(?P<sref>{AA})(?P<spos>[0-9]+)(?:_(?P<eref>{AA})(?P<epos>[0-9]+))?(?P<desc>.*?))\)?$"
    ))
});
static ENS_P_RANGE: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<acc>ENS(?:[A-Z]{{3}})?P[0-9]+\.[0-9]+)[ :]+p\.\(?(?P<change>(?P<sref>{AA})(?P<spos>[0-9]+)(?:_(?P<eref>{AA})(?P<epos>[0-9]+))?(?P<desc>.*?))\)?$"
    ))
});
static REFSEQ_P_RANGE: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^{}[ :]+p\.\(?(?P<change>(?P<sref>{AA})(?P<spos>[0-9]+)(?:_(?P<eref>{AA})(?P<epos>[0-9]+))?(?P<desc>.*?))\)?$",
        refseq_acc("[NX]P")
    ))
});

static LRG_G: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<acc>LRG_[0-9]+)[ :]+(?P<d>[gm])\.?{}(?P<change>.*)$",
        GPOS
    ))
});
static REFSEQ_G: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^{}[ :]+(?P<d>[gm])\.?{}(?P<change>.*)$",
        refseq_acc("[NX][CTWG]"),
        GPOS
    ))
});

// ---- pseudo-HGVS grammars ---------------------------------------------

const MAYBE_PDOT: &str = r"[ :]+p?\.?\(?";

static CHR_G: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<acc>chr[0-9A-Za-z_]+)[ :]+(?P<d>[gm])\.?{}(?P<change>.*)$",
        GPOS
    ))
});
static NM_P_SUBST: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^{}{}(?P<desc>(?P<aref>{AA})(?P<pos>[0-9]+)(?P<aalt>{AA}|=))\)?",
        refseq_acc("[NX]M"),
        MAYBE_PDOT
    ))
});
static NM_P_RANGE: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^{}{}(?P<desc>(?P<sref>{AA})(?P<spos>[0-9]+)(?:_(?P<eref>{AA})(?P<epos>[0-9]+))?(?P<rest>.*?))\)?$",
        refseq_acc("[NX]M"),
        MAYBE_PDOT
    ))
});
static GENE_P_SUBST: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<gene>{GENE}){MAYBE_PDOT}(?P<desc>(?P<aref>{AA})(?P<pos>[0-9]+)(?P<aalt>{AA}|=))\)?"
    ))
});
static GENE_P_RANGE: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<gene>{GENE}){MAYBE_PDOT}(?P<desc>(?P<sref>{AA})(?P<spos>[0-9]+)(?:_(?P<eref>{AA})(?P<epos>[0-9]+))?(?P<rest>.*?))\)?$"
    ))
});
static GENE_P_POS: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<gene>{GENE}){MAYBE_PDOT}(?P<pos>[0-9]+)\)?$"
    ))
});
static GENE_C: Lazy<Regex> = Lazy::new(|| {
    re(format!(
        r"^(?P<gene>{GENE})[: ]+c\.?(?P<desc>[-*0-9].*)$"
    ))
});

// ---- extraction helpers -----------------------------------------------

fn cap_str(caps: &Captures, name: &str) -> Option<String> {
    caps.name(name).map(|m| m.as_str().to_string())
}

fn cap_i64(caps: &Captures, name: &str) -> Option<i64> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

/// Pull one complex (anchor, position, offset) triple out of a c./n. match.
fn complex_num(
    caps: &Captures,
    anchor: &str,
    pos: &str,
    offset_op: &str,
    offset: &str,
) -> (bool, i64, i32) {
    let is_utr3 = caps.name(anchor).map(|m| m.as_str() == "*").unwrap_or(false);
    let negate = caps.name(anchor).map(|m| m.as_str() == "-").unwrap_or(false);
    let mut p = cap_i64(caps, pos).unwrap_or(0);
    if negate {
        p = -p;
    }
    let mut off = caps
        .name(offset)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(0);
    if caps.name(offset_op).map(|m| m.as_str()) == Some("-") {
        off = -off;
    }
    (is_utr3, p, off)
}

fn g_variant_from(caps: &Captures) -> HgvsVariant {
    let start1 = cap_i64(caps, "spos").unwrap_or(0);
    let end = cap_i64(caps, "epos").unwrap_or(start1);
    let seq_type = if caps.name("d").map(|m| m.as_str()) == Some("m") {
        HgvsSeqType::Mito
    } else {
        HgvsSeqType::Genomic
    };
    HgvsVariant {
        seq_acc: cap_str(caps, "acc").unwrap_or_default(),
        gene_symbol: cap_str(caps, "gene"),
        seq_type,
        start1,
        end,
        start_offset: 0,
        end_offset: 0,
        start_is_utr3: false,
        end_is_utr3: false,
        changes: cap_str(caps, "change").unwrap_or_default(),
    }
}

fn cn_variant_from(caps: &Captures, noncoding: bool, term: &str) -> HgvsVariant {
    let (mut start_is_utr3, start1, start_offset) =
        complex_num(caps, "sa", "spos", "sop", "soff");
    let mut hgvs = HgvsVariant {
        seq_acc: cap_str(caps, "acc").unwrap_or_default(),
        gene_symbol: cap_str(caps, "gene"),
        seq_type: if noncoding {
            HgvsSeqType::Noncoding
        } else {
            HgvsSeqType::Coding
        },
        start1,
        end: start1,
        start_offset,
        end_offset: start_offset,
        start_is_utr3: false,
        end_is_utr3: false,
        changes: cap_str(caps, "change").unwrap_or_default(),
    };
    if noncoding && start_is_utr3 {
        log::warn!(
            "noncoding term '{}' appears to start in UTR3 (*), not applicable for noncoding",
            term
        );
        start_is_utr3 = false;
    }
    hgvs.start_is_utr3 = start_is_utr3;
    if caps.name("epos").is_some() {
        let (mut end_is_utr3, end, end_offset) = complex_num(caps, "ea", "epos", "eop", "eoff");
        if noncoding && end_is_utr3 {
            log::warn!(
                "noncoding term '{}' appears to end in UTR3 (*), not applicable for noncoding",
                term
            );
            end_is_utr3 = false;
        }
        hgvs.end = end;
        hgvs.end_offset = end_offset;
        hgvs.end_is_utr3 = end_is_utr3;
    } else {
        hgvs.end_is_utr3 = hgvs.start_is_utr3;
    }
    hgvs
}

fn p_variant_from(caps: &Captures, start_name: &str, end_name: Option<&str>) -> HgvsVariant {
    let start1 = cap_i64(caps, start_name).unwrap_or(0);
    let end = end_name
        .and_then(|n| cap_i64(caps, n))
        .unwrap_or(start1);
    HgvsVariant {
        seq_acc: cap_str(caps, "acc").unwrap_or_default(),
        gene_symbol: cap_str(caps, "gene"),
        seq_type: HgvsSeqType::Protein,
        start1,
        end,
        start_offset: 0,
        end_offset: 0,
        start_is_utr3: false,
        end_is_utr3: false,
        changes: cap_str(caps, "change").unwrap_or_default(),
    }
}

// ---- sub-grammar parse attempts ---------------------------------------

fn parse_cn_dot(term: &str) -> Option<HgvsVariant> {
    for (regex, noncoding) in [
        (&*LRG_C, false),
        (&*LRG_N, true),
        (&*ENS_C, false),
        (&*ENS_N, true),
        (&*REFSEQ_C, false),
        (&*REFSEQ_N, true),
    ] {
        if let Some(caps) = regex.captures(term) {
            return Some(cn_variant_from(&caps, noncoding, term));
        }
    }
    None
}

fn parse_p_dot_subst(term: &str) -> Option<HgvsVariant> {
    for regex in [&*LRG_P_SUBST, &*ENS_P_SUBST, &*REFSEQ_P_SUBST] {
        if let Some(caps) = regex.captures(term) {
            return Some(p_variant_from(&caps, "pos", None));
        }
    }
    None
}

fn parse_p_dot_range(term: &str) -> Option<HgvsVariant> {
    for regex in [&*LRG_P_RANGE, &*ENS_P_RANGE, &*REFSEQ_P_RANGE] {
        if let Some(caps) = regex.captures(term) {
            return Some(p_variant_from(&caps, "spos", Some("epos")));
        }
    }
    None
}

fn parse_g_dot(term: &str) -> Option<HgvsVariant> {
    for regex in [&*LRG_G, &*REFSEQ_G] {
        if let Some(caps) = regex.captures(term) {
            return Some(g_variant_from(&caps));
        }
    }
    None
}

/// Parse a strict HGVS term. Sub-grammars are tried in order (transcript,
/// protein substitution, protein range, genomic); the first match wins.
/// Returns None when no grammar matches. Accessions, coordinates, and
/// alleles are not validated here.
pub fn parse_term(term: &str) -> Option<HgvsVariant> {
    parse_cn_dot(term)
        .or_else(|| parse_p_dot_subst(term))
        .or_else(|| parse_p_dot_range(term))
        .or_else(|| parse_g_dot(term))
}

/// Parse things that are not strict HGVS but that people mean as HGVS:
/// protein changes hung off an NM_ accession or a bare gene symbol, c.
/// positions after a gene symbol, `chrN:g.` positions. Gene symbols and
/// NM-to-NP hops are resolved through the metadata collaborator, the term
/// is rewritten in strict form, and the strict parser does the rest.
pub fn parse_pseudo_hgvs<S>(src: &S, term: &str) -> Option<HgvsVariant>
where
    S: SequenceSource + GeneLookup + ?Sized,
{
    if let Some(caps) = NM_P_SUBST
        .captures(term)
        .or_else(|| NM_P_RANGE.captures(term))
    {
        // NM_ accession but a protein change: swap in the right NP_
        let nm = caps.name("acc")?.as_str();
        let np = src.np_for_nm(nm)?;
        let desc = caps.name("desc")?.as_str();
        let np_term = match caps.name("gene") {
            Some(gene) => format!("{}({}):p.{}", np, gene.as_str(), desc),
            None => format!("{}:p.{}", np, desc),
        };
        return parse_term(&np_term);
    }
    if let Some(caps) = GENE_P_SUBST
        .captures(term)
        .or_else(|| GENE_P_RANGE.captures(term))
    {
        let gene = caps.name("gene")?.as_str();
        let np = src.np_for_gene(gene)?;
        let desc = caps.name("desc")?.as_str();
        return parse_term(&format!("{}({}):p.{}", np, gene, desc));
    }
    if let Some(caps) = GENE_P_POS.captures(term) {
        // Only a position: look up the reference residue and synthesize a
        // no-change term so it parses
        let gene = caps.name("gene")?.as_str();
        let np = src.np_for_gene(gene)?;
        let pos: u32 = caps.name("pos")?.as_str().parse().ok()?;
        if pos == 0 {
            return None;
        }
        let stored = src.resolve_accession(&np)?;
        let residue = src.fetch(&stored, pos - 1, pos).ok()?;
        let np_term = format!(
            "{}({}):p.{}{}=",
            np, gene, residue[0].to_ascii_uppercase() as char, pos
        );
        return parse_term(&np_term);
    }
    if let Some(caps) = GENE_C.captures(term) {
        let gene = caps.name("gene")?.as_str();
        let nm = src.nm_for_gene(gene)?;
        let desc = caps.name("desc")?.as_str();
        return parse_term(&format!("{}({}):c.{}", nm, gene, desc));
    }
    if let Some(caps) = CHR_G.captures(term) {
        return Some(g_variant_from(&caps));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemSource;

    #[test]
    fn test_parse_c_subst() {
        let v = parse_term("NM_000088.3:c.459A>G").unwrap();
        assert_eq!(v.seq_acc, "NM_000088.3");
        assert_eq!(v.seq_type, HgvsSeqType::Coding);
        assert_eq!((v.start1, v.end), (459, 459));
        assert_eq!(v.changes, "A>G");
        assert_eq!(v.gene_symbol, None);
    }

    #[test]
    fn test_parse_c_with_gene_symbol() {
        let v = parse_term("NM_000088.3(COL1A1):c.459A>G").unwrap();
        assert_eq!(v.gene_symbol.as_deref(), Some("COL1A1"));
    }

    #[test]
    fn test_parse_c_range_del() {
        let v = parse_term("NM_000088.3:c.10_12del").unwrap();
        assert_eq!((v.start1, v.end), (10, 12));
        assert_eq!(v.changes, "del");
    }

    #[test]
    fn test_parse_c_intron_offset() {
        let v = parse_term("NM_000088.3:c.100+4G>T").unwrap();
        assert_eq!(v.start1, 100);
        assert_eq!(v.start_offset, 4);
        assert_eq!(v.end_offset, 4);
        let v = parse_term("NM_000088.3:c.101-25_101-24insT").unwrap();
        assert_eq!((v.start1, v.end), (101, 101));
        assert_eq!((v.start_offset, v.end_offset), (-25, -24));
    }

    #[test]
    fn test_parse_c_utr_positions() {
        let v = parse_term("NM_000088.3:c.-14A>G").unwrap();
        assert_eq!(v.start1, -14);
        assert!(!v.start_is_utr3);
        let v = parse_term("NM_000088.3:c.*6del").unwrap();
        assert_eq!(v.start1, 6);
        assert!(v.start_is_utr3);
        assert!(v.end_is_utr3);
    }

    #[test]
    fn test_parse_n_term() {
        let v = parse_term("NR_046018.2:n.50G>A").unwrap();
        assert_eq!(v.seq_type, HgvsSeqType::Noncoding);
        assert_eq!(v.start1, 50);
    }

    #[test]
    fn test_parse_g_term() {
        let v = parse_term("NC_000001.11:g.12345A>G").unwrap();
        assert_eq!(v.seq_type, HgvsSeqType::Genomic);
        assert_eq!((v.start1, v.end), (12345, 12345));
        let v = parse_term("NC_000001.11:g.100_200del").unwrap();
        assert_eq!((v.start1, v.end), (100, 200));
    }

    #[test]
    fn test_parse_m_term() {
        let v = parse_term("NC_012920.1:m.8993T>G").unwrap();
        assert_eq!(v.seq_type, HgvsSeqType::Mito);
    }

    #[test]
    fn test_parse_lrg_terms() {
        let v = parse_term("LRG_1t1:c.459A>G").unwrap();
        assert_eq!(v.seq_acc, "LRG_1t1");
        assert_eq!(v.seq_type, HgvsSeqType::Coding);
        let v = parse_term("LRG_1:g.8463G>C").unwrap();
        assert_eq!(v.seq_type, HgvsSeqType::Genomic);
        let v = parse_term("LRG_1p1:p.Gly12Asp").unwrap();
        assert_eq!(v.seq_type, HgvsSeqType::Protein);
    }

    #[test]
    fn test_parse_p_subst_three_letter() {
        let v = parse_term("NP_000079.2:p.Gly12Asp").unwrap();
        assert_eq!(v.seq_type, HgvsSeqType::Protein);
        assert_eq!((v.start1, v.end), (12, 12));
        assert_eq!(v.changes, "Gly12Asp");
    }

    #[test]
    fn test_parse_p_subst_one_letter() {
        let v = parse_term("NP_000079.2:p.G12D").unwrap();
        assert_eq!(v.changes, "G12D");
        // Case-insensitive three-letter codes
        let v = parse_term("NP_000079.2:p.gly12ASP").unwrap();
        assert_eq!((v.start1, v.end), (12, 12));
    }

    #[test]
    fn test_parse_p_subst_parens() {
        let v = parse_term("NP_000079.2:p.(Gly12Asp)").unwrap();
        assert_eq!(v.changes, "Gly12Asp");
    }

    #[test]
    fn test_parse_p_range() {
        let v = parse_term("NP_000079.2:p.Gly12_Leu14del").unwrap();
        assert_eq!((v.start1, v.end), (12, 14));
        assert_eq!(v.changes, "Gly12_Leu14del");
    }

    #[test]
    fn test_parse_ens_terms() {
        let v = parse_term("ENST00000380152.7:c.100A>G").unwrap();
        assert_eq!(v.seq_acc, "ENST00000380152.7");
        let v = parse_term("ENSP00000369497.3:p.Val600Glu").unwrap();
        assert_eq!(v.seq_type, HgvsSeqType::Protein);
    }

    #[test]
    fn test_no_parse_is_none() {
        assert_eq!(parse_term(""), None);
        assert_eq!(parse_term("hello world"), None);
        assert_eq!(parse_term("NM_000088.3"), None);
        assert_eq!(parse_term("rs12345"), None);
    }

    #[test]
    fn test_missing_dot_tolerated() {
        // Users often omit the dot after the type letter
        let v = parse_term("NM_000088.3:c459A>G").unwrap();
        assert_eq!(v.start1, 459);
    }

    #[test]
    fn test_pseudo_chr_g() {
        let src = MemSource::with_test_data();
        let v = parse_pseudo_hgvs(&src, "chr1:g.123A>G").unwrap();
        assert_eq!(v.seq_acc, "chr1");
        assert_eq!(v.seq_type, HgvsSeqType::Genomic);
        assert_eq!(v.start1, 123);
    }

    #[test]
    fn test_pseudo_gene_protein() {
        let src = MemSource::with_test_data();
        let v = parse_pseudo_hgvs(&src, "VMT1 p.Gly2Asp").unwrap();
        assert_eq!(v.seq_acc, "NP_000001.1");
        assert_eq!(v.gene_symbol.as_deref(), Some("VMT1"));
        assert_eq!(v.seq_type, HgvsSeqType::Protein);
        assert_eq!(v.start1, 2);
    }

    #[test]
    fn test_pseudo_nm_with_protein_change() {
        let src = MemSource::with_test_data();
        let v = parse_pseudo_hgvs(&src, "NM_000001.1:p.Gly2Asp").unwrap();
        assert_eq!(v.seq_acc, "NP_000001.1");
    }

    #[test]
    fn test_pseudo_gene_position_only() {
        let src = MemSource::with_test_data();
        // Protein position 2 of NP_000001.1 is Gly (first cycle codon GGT)
        let v = parse_pseudo_hgvs(&src, "VMT1 p.2").unwrap();
        assert_eq!(v.seq_acc, "NP_000001.1");
        assert_eq!(v.changes, "G2=");
    }

    #[test]
    fn test_pseudo_gene_cdot() {
        let src = MemSource::with_test_data();
        let v = parse_pseudo_hgvs(&src, "VMT1:c.10A>T").unwrap();
        assert_eq!(v.seq_acc, "NM_000001.1");
        assert_eq!(v.seq_type, HgvsSeqType::Coding);
        assert_eq!(v.start1, 10);
    }

    #[test]
    fn test_pseudo_unknown_gene() {
        let src = MemSource::with_test_data();
        assert_eq!(parse_pseudo_hgvs(&src, "NOPE p.Gly2Asp"), None);
    }
}
