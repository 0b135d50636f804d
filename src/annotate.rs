//! Forward annotation: variant calls to HGVS terms
//!
//! Drives the projection chain for each variant record against each
//! overlapping transcript and renders the g./n./c./p. terms as a
//! tab-separated row. Rows are independent; a record that fails is logged
//! and skipped, never aborting the batch. Lookup memoization lives in a
//! caller-owned [`AnnotationCaches`] passed into each call — never in
//! hidden statics — so independent runs can't leak or race over cache
//! state.

use crate::align::TxAlignment;
use crate::config::ProjectConfig;
use crate::generate::{hgvs_c, hgvs_g, hgvs_n, hgvs_p};
use crate::project::{genomic_to_transcript, transcript_to_protein, GenomicRegion};
use crate::provider::{GenbankCds, VariantSource};
use crate::seq::SourceSeqWindow;
use crate::Result;
use std::collections::HashMap;
use std::fmt;

/// One variant call: CHROM/POS/ID/REF/ALT of a VCF body row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub chrom: String,
    /// 1-based position as written in VCF
    pub pos: u32,
    pub id: String,
    pub rref: String,
    pub alt: String,
}

impl VariantRecord {
    pub fn new(
        chrom: impl Into<String>,
        pos: u32,
        id: impl Into<String>,
        rref: impl Into<String>,
        alt: impl Into<String>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
            id: id.into(),
            rref: rref.into(),
            alt: alt.into(),
        }
    }

    /// Parse a VCF body line (header and comment lines yield None). A
    /// multi-allelic ALT column produces one record per alternate allele.
    pub fn parse_vcf_line(line: &str) -> Vec<VariantRecord> {
        if line.is_empty() || line.starts_with('#') {
            return Vec::new();
        }
        let mut fields = line.split('\t');
        let (Some(chrom), Some(pos), Some(id), Some(rref), Some(alt)) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Vec::new();
        };
        let Ok(pos) = pos.parse::<u32>() else {
            return Vec::new();
        };
        alt.split(',')
            .map(|a| VariantRecord::new(chrom, pos, id, rref, a))
            .collect()
    }

    /// 0-based half-open genomic span of the reference allele
    pub fn region(&self) -> GenomicRegion {
        GenomicRegion::new(
            self.chrom.clone(),
            self.pos - 1,
            self.pos - 1 + self.rref.len() as u32,
        )
    }
}

/// One output row of the forward direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRow {
    pub chrom: String,
    pub pos: u32,
    pub id: String,
    pub rref: String,
    pub alt: String,
    pub transcript: String,
    pub hgvs_g: String,
    pub hgvs_n: String,
    /// Empty when the transcript has no CDS or the span is ill-formed
    pub hgvs_c: String,
    /// Empty when no protein prediction applies
    pub hgvs_p: String,
}

impl fmt::Display for AnnotationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            self.pos,
            self.id,
            self.rref,
            self.alt,
            self.transcript,
            self.hgvs_g,
            self.hgvs_n,
            self.hgvs_c,
            self.hgvs_p
        )
    }
}

/// Header matching [`AnnotationRow`]'s tab layout
pub const ROW_HEADER: &str =
    "#CHROM\tPOS\tID\tREF\tALT\tTRANSCRIPT\thgvsG\thgvsN\thgvsC\thgvsP";

/// Caller-owned memoization for a batch of annotations
#[derive(Debug, Clone, Default)]
pub struct AnnotationCaches {
    alignments: HashMap<String, Vec<TxAlignment>>,
    cds: HashMap<String, Option<GenbankCds>>,
    tx_seqs: HashMap<String, Option<Vec<u8>>>,
    proteins: HashMap<String, Option<(String, Vec<u8>)>>,
}

impl AnnotationCaches {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Batch annotator for a fixed transcript set
pub struct Annotator<'a, S: VariantSource + ?Sized> {
    src: &'a S,
    transcripts: Vec<String>,
    cfg: ProjectConfig,
}

impl<'a, S: VariantSource + ?Sized> Annotator<'a, S> {
    pub fn new(src: &'a S, transcripts: Vec<String>, cfg: ProjectConfig) -> Self {
        Self {
            src,
            transcripts,
            cfg,
        }
    }

    /// Fill the caches for every transcript in this annotator's set.
    pub fn warm_caches(&self, caches: &mut AnnotationCaches) {
        for acc in &self.transcripts {
            caches
                .alignments
                .entry(acc.clone())
                .or_insert_with(|| self.src.alignments_for(acc));
            caches
                .cds
                .entry(acc.clone())
                .or_insert_with(|| self.src.cds(acc));
            caches
                .tx_seqs
                .entry(acc.clone())
                .or_insert_with(|| self.src.fetch_all(acc).ok());
            caches.proteins.entry(acc.clone()).or_insert_with(|| {
                let np = self.src.np_for_nm(acc)?;
                let seq = self.src.fetch_all(&np).ok()?;
                Some((np, seq))
            });
        }
    }

    /// Annotate one record against every overlapping transcript.
    pub fn annotate_record(
        &self,
        record: &VariantRecord,
        caches: &mut AnnotationCaches,
    ) -> Result<Vec<AnnotationRow>> {
        self.warm_caches(caches);
        self.annotate_with_warm_caches(record, caches)
    }

    fn annotate_with_warm_caches(
        &self,
        record: &VariantRecord,
        caches: &AnnotationCaches,
    ) -> Result<Vec<AnnotationRow>> {
        let region = record.region();
        let mut rows = Vec::new();
        for acc in &self.transcripts {
            let alis = match caches.alignments.get(acc) {
                Some(alis) => alis,
                None => continue,
            };
            for ali in alis {
                if ali.t_name != region.name
                    || region.start >= ali.t_end()
                    || region.end <= ali.t_start()
                {
                    continue;
                }
                let Some(Some(tx_seq)) = caches.tx_seqs.get(acc) else {
                    log::warn!("no sequence on record for transcript {}", acc);
                    continue;
                };
                let mut gwin =
                    SourceSeqWindow::new(self.src, &region.name, region.start, region.end)?;
                let vp = genomic_to_transcript(
                    &mut gwin, &region, &record.alt, ali, tx_seq, &self.cfg,
                )?;
                let g_term = hgvs_g(&mut gwin, &region, &record.alt, None, &self.cfg)?;
                let n_term = hgvs_n(&vp, &mut gwin, ali, tx_seq, &self.cfg)?;
                let cds = caches.cds.get(acc).copied().flatten();
                let mut c_term = String::new();
                let mut p_term = String::new();
                if let Some(cds) = cds {
                    c_term = hgvs_c(&vp, &mut gwin, ali, &cds, tx_seq, &self.cfg)?
                        .unwrap_or_default();
                    if let Some(Some((np, prot_seq))) = caches.proteins.get(acc) {
                        if let Some(pep) = transcript_to_protein(
                            &vp, &cds, tx_seq, prot_seq, np, &self.cfg,
                        ) {
                            p_term = hgvs_p(&pep, prot_seq, &self.cfg).unwrap_or_default();
                        }
                    }
                }
                rows.push(AnnotationRow {
                    chrom: record.chrom.clone(),
                    pos: record.pos,
                    id: record.id.clone(),
                    rref: record.rref.clone(),
                    alt: record.alt.clone(),
                    transcript: acc.clone(),
                    hgvs_g: g_term,
                    hgvs_n: n_term,
                    hgvs_c: c_term,
                    hgvs_p: p_term,
                });
            }
        }
        Ok(rows)
    }

    /// Annotate a batch row by row. A failing record is logged and
    /// skipped; the rest of the batch continues.
    pub fn annotate_batch(
        &self,
        records: &[VariantRecord],
        caches: &mut AnnotationCaches,
    ) -> Vec<AnnotationRow> {
        self.warm_caches(caches);
        let mut rows = Vec::new();
        for record in records {
            match self.annotate_with_warm_caches(record, caches) {
                Ok(mut record_rows) => rows.append(&mut record_rows),
                Err(err) => {
                    log::warn!(
                        "skipping {}:{} {}>{}: {}",
                        record.chrom,
                        record.pos,
                        record.rref,
                        record.alt,
                        err
                    );
                }
            }
        }
        rows
    }

    /// Parallel batch annotation: rows are independent, so after warming
    /// the caches the fan-out needs no synchronization beyond
    /// shared-immutable access.
    #[cfg(feature = "parallel")]
    pub fn annotate_batch_parallel(
        &self,
        records: &[VariantRecord],
        caches: &mut AnnotationCaches,
    ) -> Vec<AnnotationRow>
    where
        S: Sync,
    {
        use rayon::prelude::*;
        self.warm_caches(caches);
        let caches = &*caches;
        records
            .par_iter()
            .flat_map(|record| match self.annotate_with_warm_caches(record, caches) {
                Ok(rows) => rows,
                Err(err) => {
                    log::warn!(
                        "skipping {}:{} {}>{}: {}",
                        record.chrom,
                        record.pos,
                        record.rref,
                        record.alt,
                        err
                    );
                    Vec::new()
                }
            })
            .collect()
    }
}
