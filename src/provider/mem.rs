//! In-memory data source
//!
//! Implements every collaborator trait from a handful of maps. Fixtures can
//! be built programmatically, loaded from JSON, or taken from
//! [`MemSource::with_test_data`], which constructs a small self-consistent
//! genome (transcript sequences spliced out of the chromosome, proteins
//! translated from the CDS) so round-trip tests hold by construction.

use crate::align::{Strand, TxAlignment};
use crate::error::VarmapError;
use crate::provider::{AlignmentSource, CdsSource, GenbankCds, GeneLookup, SequenceSource};
use crate::seq::{revcomp, translate};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Gene symbol cross-references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneXref {
    pub nm: Option<String>,
    pub np: Option<String>,
}

/// In-memory implementation of all collaborator traits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemSource {
    /// Sequences by name: chromosomes, transcripts, proteins
    #[serde(default)]
    sequences: HashMap<String, String>,
    /// Spliced alignments by transcript accession
    #[serde(default)]
    alignments: HashMap<String, Vec<TxAlignment>>,
    /// CDS annotations by transcript accession
    #[serde(default)]
    cds: HashMap<String, GenbankCds>,
    /// Gene symbol cross-references
    #[serde(default)]
    genes: HashMap<String, GeneXref>,
    /// Transcript accession to protein accession
    #[serde(default)]
    nm_to_np: HashMap<String, String>,
}

impl MemSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a source from a JSON fixture file
    pub fn from_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load a source from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let src: Self = serde_json::from_str(content)?;
        for alis in src.alignments.values() {
            for ali in alis {
                ali.check()?;
            }
        }
        Ok(src)
    }

    /// Add a named sequence (chromosome, transcript, or protein)
    pub fn add_sequence(&mut self, name: impl Into<String>, seq: impl Into<String>) {
        self.sequences.insert(name.into(), seq.into());
    }

    /// Add a spliced alignment, keyed by its query name
    pub fn add_alignment(&mut self, ali: TxAlignment) {
        self.alignments.entry(ali.q_name.clone()).or_default().push(ali);
    }

    /// Add a CDS annotation for a transcript accession
    pub fn add_cds(&mut self, acc: impl Into<String>, cds: GenbankCds) {
        self.cds.insert(acc.into(), cds);
    }

    /// Register gene symbol cross-references
    pub fn add_gene(
        &mut self,
        gene: impl Into<String>,
        nm: Option<String>,
        np: Option<String>,
    ) {
        if let (Some(nm), Some(np)) = (&nm, &np) {
            self.nm_to_np.insert(nm.clone(), np.clone());
        }
        self.genes.insert(gene.into(), GeneXref { nm, np });
    }

    /// Build a small self-consistent fixture: two transcripts (one per
    /// strand) on a synthetic chromosome, with CDS annotations, protein
    /// sequences, and gene cross-references.
    ///
    /// `NM_000001.1` (gene VMT1, `+` strand): 300-base transcript, exons at
    /// chr1 100-200/300-400/460-560, CDS 11..280.
    /// `NM_000002.1` (gene VMT2, `-` strand): 200-base transcript, exons at
    /// chr1 700-800/900-1000, CDS 21..170.
    pub fn with_test_data() -> Self {
        let mut src = Self::new();

        const CYCLE: [&str; 8] = ["GGT", "GCT", "GTT", "CTT", "TCT", "ACT", "CCT", "ATT"];
        let coding = |codons: usize| -> String {
            let mut s = String::from("ATG");
            for i in 0..codons {
                s.push_str(CYCLE[i % 8]);
            }
            s.push_str("TAA");
            s
        };
        let filler = |len: usize, phase: usize| -> String {
            const F: &[u8; 4] = b"TGCA";
            (0..len).map(|i| F[(i + phase) % 4] as char).collect()
        };
        let intron = |len: usize| -> String {
            const B: &[u8; 4] = b"CTTC";
            let mut s = String::from("GT");
            for i in 0..len - 4 {
                s.push(B[i % 4] as char);
            }
            s.push_str("AG");
            s
        };

        // Plus-strand transcript: 10 UTR5 + 270 CDS + 20 UTR3 = 300
        let tx1 = format!("GGCAGCAGCA{}GGCAGCAGCAGGCAGCAGCA", coding(88));
        debug_assert_eq!(tx1.len(), 300);
        // Minus-strand transcript: 20 UTR5 + 150 CDS + 30 UTR3 = 200
        let tx2 = format!(
            "CAGCAGCAGCAGCAGCAGCA{}CAGCAGCAGCAGCAGCAGCAGCAGCAGCAG",
            coding(48)
        );
        debug_assert_eq!(tx2.len(), 200);
        let tx2_spliced = String::from_utf8(revcomp(tx2.as_bytes())).unwrap();

        let mut chr1 = String::new();
        chr1.push_str(&filler(100, 0));
        chr1.push_str(&tx1[0..100]);
        chr1.push_str(&intron(100));
        chr1.push_str(&tx1[100..200]);
        chr1.push_str(&intron(60));
        chr1.push_str(&tx1[200..300]);
        chr1.push_str(&filler(40, 0));
        chr1.push_str(&filler(100, 1));
        chr1.push_str(&tx2_spliced[0..100]);
        chr1.push_str(&intron(100));
        chr1.push_str(&tx2_spliced[100..200]);
        chr1.push_str(&filler(100, 2));
        debug_assert_eq!(chr1.len(), 1100);

        let prot1: String = {
            let aa = translate(&tx1.as_bytes()[10..280]);
            String::from_utf8(aa[..aa.len() - 1].to_vec()).unwrap()
        };
        let prot2: String = {
            let aa = translate(&tx2.as_bytes()[20..170]);
            String::from_utf8(aa[..aa.len() - 1].to_vec()).unwrap()
        };

        let ali1 = TxAlignment::new(
            "NM_000001.1",
            300,
            "chr1",
            chr1.len() as u32,
            Strand::Plus,
            vec![100, 100, 100],
            vec![0, 100, 200],
            vec![100, 300, 460],
        )
        .expect("fixture alignment");
        let ali2 = TxAlignment::new(
            "NM_000002.1",
            200,
            "chr1",
            chr1.len() as u32,
            Strand::Minus,
            vec![100, 100],
            vec![0, 100],
            vec![700, 900],
        )
        .expect("fixture alignment");

        src.add_sequence("chr1", chr1);
        src.add_sequence("NM_000001.1", tx1);
        src.add_sequence("NP_000001.1", prot1);
        src.add_sequence("NM_000002.1", tx2);
        src.add_sequence("NP_000002.1", prot2);
        src.add_alignment(ali1);
        src.add_alignment(ali2);
        src.add_cds("NM_000001.1", GenbankCds::new(10, 280));
        src.add_cds("NM_000002.1", GenbankCds::new(20, 170));
        src.add_gene(
            "VMT1",
            Some("NM_000001.1".to_string()),
            Some("NP_000001.1".to_string()),
        );
        src.add_gene(
            "VMT2",
            Some("NM_000002.1".to_string()),
            Some("NP_000002.1".to_string()),
        );
        src
    }
}

impl SequenceSource for MemSource {
    fn sequence_len(&self, name: &str) -> Option<u32> {
        self.sequences.get(name).map(|s| s.len() as u32)
    }

    fn fetch(&self, name: &str, start: u32, end: u32) -> Result<Vec<u8>> {
        let seq = self
            .sequences
            .get(name)
            .ok_or_else(|| VarmapError::ReferenceNotFound {
                id: name.to_string(),
            })?;
        if start > end || end as usize > seq.len() {
            return Err(VarmapError::SequenceNotAvailable {
                name: name.to_string(),
                start,
                end,
            });
        }
        Ok(seq.as_bytes()[start as usize..end as usize].to_vec())
    }

    fn resolve_accession(&self, acc: &str) -> Option<String> {
        if self.sequences.contains_key(acc) {
            return Some(acc.to_string());
        }
        // Strip any version and take the highest stored version of the
        // base accession (the term may cite a version we don't have)
        let base = match acc.rsplit_once('.') {
            Some((base, v)) if !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()) => base,
            _ => acc,
        };
        let prefix = format!("{}.", base);
        self.sequences
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .max_by_key(|k| {
                k[prefix.len()..]
                    .parse::<u32>()
                    .unwrap_or(0)
            })
            .cloned()
    }
}

impl AlignmentSource for MemSource {
    fn alignments_for(&self, acc: &str) -> Vec<TxAlignment> {
        self.alignments.get(acc).cloned().unwrap_or_default()
    }
}

impl CdsSource for MemSource {
    fn cds(&self, acc: &str) -> Option<GenbankCds> {
        self.cds.get(acc).copied()
    }
}

impl GeneLookup for MemSource {
    fn nm_for_gene(&self, gene: &str) -> Option<String> {
        self.genes.get(gene).and_then(|x| x.nm.clone())
    }

    fn np_for_gene(&self, gene: &str) -> Option<String> {
        self.genes.get(gene).and_then(|x| x.np.clone())
    }

    fn np_for_nm(&self, nm: &str) -> Option<String> {
        self.nm_to_np.get(nm).cloned()
    }

    fn nm_for_np(&self, np: &str) -> Option<String> {
        self.nm_to_np
            .iter()
            .find(|(_, v)| v.as_str() == np)
            .map(|(k, _)| k.clone())
    }
}
