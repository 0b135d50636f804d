//! End-to-end projection scenarios against in-memory fixtures

use ferro_varmap::generate::{hgvs_c, hgvs_g, hgvs_n};
use ferro_varmap::project::Region;
use ferro_varmap::seq::{SeqWindow, SourceSeqWindow};
use ferro_varmap::{
    genomic_to_transcript, transcript_to_protein, validate, AlignmentSource, CdsSource,
    GenbankCds, GenomicRegion, MemSource, ProjectConfig, SequenceSource, Strand, TxAlignment,
};

fn cfg() -> ProjectConfig {
    ProjectConfig::default()
}

/// A single-exon transcript aligned flush at genomic offset 0, with the
/// CDS at transcript [10, 400).
fn flush_fixture() -> MemSource {
    let mut src = MemSource::new();
    const F: &[u8; 4] = b"CGTA";
    let genome: String = (0..600).map(|i| F[i % 4] as char).collect();
    let tx = genome[0..500].to_string();
    src.add_alignment(
        TxAlignment::new(
            "NM_FLUSH.1",
            500,
            "chrT",
            600,
            Strand::Plus,
            vec![500],
            vec![0],
            vec![0],
        )
        .unwrap(),
    );
    src.add_sequence("chrT", genome);
    src.add_sequence("NM_FLUSH.1", tx);
    src.add_cds("NM_FLUSH.1", GenbankCds::new(10, 400));
    src
}

#[test]
fn snv_projects_to_cds_relative_coordinate() {
    // Genomic SNV at 0-based offset 19, no indels before it: transcript
    // offset 19 renders as c.10 (19 - 10 + 1)
    let src = flush_fixture();
    let ali = &src.alignments_for("NM_FLUSH.1")[0];
    let tx = src.fetch_all("NM_FLUSH.1").unwrap();
    let cds = src.cds("NM_FLUSH.1").unwrap();
    let mut win = SourceSeqWindow::new(&src, "chrT", 0, 100).unwrap();
    assert_eq!(win.base_at(19), Some(b'A'));

    let region = GenomicRegion::new("chrT", 19, 20);
    let vp = genomic_to_transcript(&mut win, &region, "T", ali, &tx, &cfg()).unwrap();
    assert_eq!(vp.start.region, Region::Exon);
    assert_eq!(vp.start.tx_offset, 19);
    assert!(!vp.genome_mismatch);

    let term = hgvs_c(&vp, &mut win, ali, &cds, &tx, &cfg()).unwrap().unwrap();
    assert_eq!(term, "NM_FLUSH.1:c.10A>T");
}

#[test]
fn homopolymer_deletion_shifts_right() {
    // A 1-bp deletion at the start of a 4-base homopolymer run shifts to
    // the rightmost equivalent position
    let mut src = MemSource::new();
    const F: &[u8; 4] = b"CGTA";
    let mut genome: Vec<u8> = (0..600).map(|i| F[i % 4]).collect();
    for g in genome.iter_mut().take(34).skip(30) {
        *g = b'A';
    }
    let tx = String::from_utf8(genome[0..500].to_vec()).unwrap();
    src.add_sequence("chrT", String::from_utf8(genome).unwrap());
    src.add_sequence("NM_FLUSH.1", tx.clone());
    let ali = TxAlignment::new(
        "NM_FLUSH.1",
        500,
        "chrT",
        600,
        Strand::Plus,
        vec![500],
        vec![0],
        vec![0],
    )
    .unwrap();
    let mut win = SourceSeqWindow::new(&src, "chrT", 0, 100).unwrap();
    let vp = genomic_to_transcript(
        &mut win,
        &GenomicRegion::new("chrT", 30, 31),
        "",
        &ali,
        tx.as_bytes(),
        &cfg(),
    )
    .unwrap();
    assert!(vp.bases_shifted > 0);
    assert_eq!(vp.bases_shifted, 3);
    assert_eq!((vp.start.tx_offset, vp.end.tx_offset), (33, 34));
    // Minimality invariant: ref and alt share no leading/trailing base
    assert_eq!(vp.g_ref, "A");
    assert_eq!(vp.g_alt, "");
}

#[test]
fn exon_intron_span_renders_n_but_not_c() {
    // A variant whose start is exonic and end intronic: hgvsC refuses,
    // hgvsG/hgvsN still produce terms
    let src = MemSource::with_test_data();
    let ali = &src.alignments_for("NM_000001.1")[0];
    let tx = src.fetch_all("NM_000001.1").unwrap();
    let cds = src.cds("NM_000001.1").unwrap();
    let mut win = SourceSeqWindow::new(&src, "chr1", 190, 215).unwrap();
    // Exon 1 is chr1 [100,200); this span runs 5 bases into the intron
    let region = GenomicRegion::new("chr1", 195, 205);
    let vp = genomic_to_transcript(&mut win, &region, "", ali, &tx, &cfg()).unwrap();
    assert_eq!(vp.start.region, Region::Exon);
    assert_eq!(vp.end.region, Region::Intron);

    let c = hgvs_c(&vp, &mut win, ali, &cds, &tx, &cfg()).unwrap();
    assert!(c.is_none());
    let n = hgvs_n(&vp, &mut win, ali, &tx, &cfg()).unwrap();
    assert!(n.starts_with("NM_000001.1:n."));
    let g = hgvs_g(&mut win, &region, "", Some("chr1"), &cfg()).unwrap();
    assert!(g.starts_with("chr1:g."));
}

#[test]
fn protein_term_validation_reports_actual_residue() {
    // Stored protein has Gly at position 12: matching term validates
    // cleanly, a wrong assertion reports the stored residue
    let mut src = MemSource::new();
    src.add_sequence("NP_000000.1", "MAAAAAAAAAAGAAAAAAAA");
    let term = ferro_varmap::parse_term("NP_000000.1:p.Gly12Asp").unwrap();
    let v = validate(&src, &term).unwrap();
    assert!(v.coords_ok);
    assert_eq!(v.diff_ref_allele, None);

    let term = ferro_varmap::parse_term("NP_000000.1:p.Trp12Asp").unwrap();
    let v = validate(&src, &term).unwrap();
    assert_eq!(v.diff_ref_allele.as_deref(), Some("G"));
}

#[test]
fn one_base_insertion_in_cds_is_frameshift() {
    let src = MemSource::with_test_data();
    let ali = &src.alignments_for("NM_000001.1")[0];
    let tx = src.fetch_all("NM_000001.1").unwrap();
    let cds = src.cds("NM_000001.1").unwrap();
    let prot = src.fetch_all("NP_000001.1").unwrap();
    let mut win = SourceSeqWindow::new(&src, "chr1", 100, 130).unwrap();
    // Zero-length insertion point inside the CDS (tx offset 15)
    let region = GenomicRegion::new("chr1", 115, 115);
    let vp = genomic_to_transcript(&mut win, &region, "G", ali, &tx, &cfg()).unwrap();
    let pep = transcript_to_protein(&vp, &cds, &tx, &prot, "NP_000001.1", &cfg()).unwrap();
    assert!(pep.frameshift);
    assert!(!pep.cant_predict);
}

#[test]
fn false_intron_has_differing_two_sided_offsets() {
    // Identical flanking sequence, two alignments: a long gap is a true
    // intron (offsets agree), a short genomic-deletion gap is not
    // (offsets differ)
    use ferro_varmap::project::pos_geno_to_tx;
    let long_gap = TxAlignment::new(
        "NM_A.1",
        100,
        "chrT",
        1000,
        Strand::Plus,
        vec![50, 50],
        vec![0, 50],
        vec![100, 250],
    )
    .unwrap();
    let pos = pos_geno_to_tx(175, &long_gap, false, 45);
    assert_eq!(pos.region, Region::Intron);
    assert_eq!(pos.tx_offset, pos.intron3_tx_offset);

    let short_gap = TxAlignment::new(
        "NM_B.1",
        103,
        "chrT",
        1000,
        Strand::Plus,
        vec![50, 50],
        vec![0, 53],
        vec![100, 152],
    )
    .unwrap();
    let pos = pos_geno_to_tx(151, &short_gap, false, 45);
    assert_eq!(pos.region, Region::Intron);
    assert_ne!(pos.tx_offset, pos.intron3_tx_offset);
}

#[test]
fn deep_intronic_variant_predicts_no_protein_change() {
    let src = MemSource::with_test_data();
    let ali = &src.alignments_for("NM_000001.1")[0];
    let tx = src.fetch_all("NM_000001.1").unwrap();
    let cds = src.cds("NM_000001.1").unwrap();
    let prot = src.fetch_all("NP_000001.1").unwrap();
    let mut win = SourceSeqWindow::new(&src, "chr1", 240, 260).unwrap();
    // Middle of the 100-base intron after exon 1
    let region = GenomicRegion::new("chr1", 250, 251);
    let rref = src.fetch("chr1", 250, 251).unwrap();
    let alt = if rref[0] == b'C' { "G" } else { "C" };
    let vp = genomic_to_transcript(&mut win, &region, alt, ali, &tx, &cfg()).unwrap();
    let pep = transcript_to_protein(&vp, &cds, &tx, &prot, "NP_000001.1", &cfg()).unwrap();
    assert!(pep.likely_no_change);
    assert!(!pep.cant_predict);
}

#[test]
fn splice_region_variant_cannot_be_predicted() {
    let src = MemSource::with_test_data();
    let ali = &src.alignments_for("NM_000001.1")[0];
    let tx = src.fetch_all("NM_000001.1").unwrap();
    let cds = src.cds("NM_000001.1").unwrap();
    let prot = src.fetch_all("NP_000001.1").unwrap();
    let mut win = SourceSeqWindow::new(&src, "chr1", 195, 215).unwrap();
    // 2 bases into the intron: canonical splice region
    let region = GenomicRegion::new("chr1", 201, 202);
    let rref = src.fetch("chr1", 201, 202).unwrap();
    let alt = if rref[0] == b'C' { "G" } else { "C" };
    let vp = genomic_to_transcript(&mut win, &region, alt, ali, &tx, &cfg()).unwrap();
    let pep = transcript_to_protein(&vp, &cds, &tx, &prot, "NP_000001.1", &cfg()).unwrap();
    assert!(pep.cant_predict);
}
