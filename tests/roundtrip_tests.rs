//! Round-trip properties: term -> parse -> render, and c. -> genome -> c.

use ferro_varmap::generate::hgvs_c;
use ferro_varmap::seq::SourceSeqWindow;
use ferro_varmap::{
    genomic_to_transcript, map_to_genome, parse_term, AlignmentSource, CdsSource, GenomicRegion,
    MemSource, ProjectConfig, SequenceSource,
};

fn cfg() -> ProjectConfig {
    ProjectConfig::default()
}

#[test]
fn substitution_terms_render_back_to_themselves() {
    // For unambiguous single-base substitutions, render(parse(t)) == t
    let terms = [
        "NM_000088.3:c.459A>G",
        "NM_000088.3:c.-14A>G",
        "NM_000088.3:c.*6C>T",
        "NM_000088.3:c.100+4G>T",
        "NM_000088.3:c.101-25A>C",
        "NC_000001.11:g.12345A>G",
        "NR_046018.2:n.50G>A",
        "NM_000088.3(COL1A1):c.459A>G",
        "LRG_1t1:c.459A>G",
    ];
    for term in terms {
        let parsed = parse_term(term).unwrap_or_else(|| panic!("no parse for {}", term));
        assert_eq!(parsed.to_string(), term, "round trip failed for {}", term);
    }
}

#[test]
fn protein_terms_render_back_to_themselves() {
    let terms = ["NP_000079.2:p.Gly12Asp", "NP_000079.2:p.Gly12_Leu14del"];
    for term in terms {
        let parsed = parse_term(term).unwrap();
        assert_eq!(parsed.to_string(), term);
    }
}

#[test]
fn coding_terms_survive_genome_round_trip() {
    // Map a c. position to the genome, project the genomic variant back
    // onto the same transcript, and re-derive the c. coordinate
    let src = MemSource::with_test_data();
    let ali = &src.alignments_for("NM_000001.1")[0];
    let tx = src.fetch_all("NM_000001.1").unwrap();
    let cds = src.cds("NM_000001.1").unwrap();
    for c_pos in [1i64, 10, 45, 90, 91, 150, 269] {
        // Use the true transcript base so nothing shifts or mismatches
        let tx_offset = (c_pos - 1 + cds.start as i64) as usize;
        let rref = tx[tx_offset] as char;
        let alt = if rref == 'G' { 'C' } else { 'G' };
        let term = format!("NM_000001.1:c.{}{}>{}", c_pos, rref, alt);
        let parsed = parse_term(&term).unwrap();
        let region = map_to_genome(&src, &parsed, &cfg())
            .unwrap_or_else(|| panic!("no mapping for {}", term));
        assert_eq!(region.name, "chr1");
        assert_eq!(region.end - region.start, 1);

        let g_region = GenomicRegion::new("chr1", region.start, region.end);
        let mut win = SourceSeqWindow::new(&src, "chr1", region.start, region.end).unwrap();
        let vp = genomic_to_transcript(&mut win, &g_region, &alt.to_string(), ali, &tx, &cfg())
            .unwrap();
        let back = hgvs_c(&vp, &mut win, ali, &cds, &tx, &cfg()).unwrap().unwrap();
        let reparsed = parse_term(&back).unwrap();
        assert_eq!(reparsed.start1, c_pos, "c. position drifted for {}", term);
        assert_eq!(reparsed.end, c_pos);
        assert!(!vp.genome_mismatch, "unexpected mismatch for {}", term);
    }
}

#[test]
fn utr_terms_survive_genome_round_trip() {
    let src = MemSource::with_test_data();
    let ali = &src.alignments_for("NM_000001.1")[0];
    let tx = src.fetch_all("NM_000001.1").unwrap();
    let cds = src.cds("NM_000001.1").unwrap();
    // c.-5 is tx offset 5; c.*5 is tx offset 284
    for (term_pos, tx_offset, is_utr3) in [("-5", 5usize, false), ("*5", 284, true)] {
        let rref = tx[tx_offset] as char;
        let alt = if rref == 'G' { 'C' } else { 'G' };
        let term = format!("NM_000001.1:c.{}{}>{}", term_pos, rref, alt);
        let parsed = parse_term(&term).unwrap();
        assert_eq!(parsed.start_is_utr3, is_utr3);
        let region = map_to_genome(&src, &parsed, &cfg()).unwrap();
        let g_region = GenomicRegion::new("chr1", region.start, region.end);
        let mut win = SourceSeqWindow::new(&src, "chr1", region.start, region.end).unwrap();
        let vp = genomic_to_transcript(&mut win, &g_region, &alt.to_string(), ali, &tx, &cfg())
            .unwrap();
        let back = hgvs_c(&vp, &mut win, ali, &cds, &tx, &cfg()).unwrap().unwrap();
        assert!(
            back.contains(&format!("c.{}{}", term_pos, rref)),
            "expected c.{} in {}",
            term_pos,
            back
        );
    }
}

#[test]
fn intronic_term_survives_genome_round_trip() {
    let src = MemSource::with_test_data();
    let ali = &src.alignments_for("NM_000001.1")[0];
    let tx = src.fetch_all("NM_000001.1").unwrap();
    let cds = src.cds("NM_000001.1").unwrap();
    // c.90+5: 5 bases into the intron after exon 1 (chr1 204)
    let term = "NM_000001.1:c.90+5C>G";
    let parsed = parse_term(term).unwrap();
    let region = map_to_genome(&src, &parsed, &cfg()).unwrap();
    assert_eq!((region.start, region.end), (204, 205));
    let rref = src.fetch("chr1", 204, 205).unwrap()[0] as char;
    let alt = if rref == 'G' { 'C' } else { 'G' };
    let g_region = GenomicRegion::new("chr1", region.start, region.end);
    let mut win = SourceSeqWindow::new(&src, "chr1", region.start, region.end).unwrap();
    let vp =
        genomic_to_transcript(&mut win, &g_region, &alt.to_string(), ali, &tx, &cfg()).unwrap();
    let back = hgvs_c(&vp, &mut win, ali, &cds, &tx, &cfg()).unwrap().unwrap();
    assert!(back.starts_with("NM_000001.1:c.90+5"), "got {}", back);
}
