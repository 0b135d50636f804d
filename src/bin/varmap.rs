// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! varmap CLI
//!
//! Command-line interface for HGVS parsing, genome mapping, and VCF
//! annotation against a JSON data fixture.

use clap::{Parser, Subcommand};
use ferro_varmap::annotate::ROW_HEADER;
use ferro_varmap::{
    parse_pseudo_hgvs, parse_term, validate_and_map, AnnotationCaches, Annotator, MemSource,
    ProjectConfig, VariantRecord,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "varmap")]
#[command(author, version, about = "HGVS variant parser and projector")]
#[command(
    long_about = "Parse HGVS terms, map them onto the genome, and annotate
variant calls with HGVS g./n./c./p. terms.

Sequences, alignments, and CDS annotations are loaded from a JSON data
file (see MemSource::from_json).

Examples:
  varmap parse 'NM_000088.3:c.459A>G'
  varmap map --data data.json 'NM_000001.1:c.1A>G'
  varmap annotate --data data.json -i calls.vcf --transcript NM_000001.1"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an HGVS term and print its structured form
    Parse {
        /// HGVS term (e.g. NM_000088.3:c.459A>G)
        term: String,
    },

    /// Map an HGVS term to genomic coordinates
    Map {
        /// HGVS term, strict or loose (e.g. 'GENE p.Ala123Val')
        term: String,

        /// JSON data file with sequences, alignments and CDS annotations
        #[arg(long)]
        data: PathBuf,
    },

    /// Annotate VCF variant calls with HGVS terms
    Annotate {
        /// Input VCF file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output TSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON data file with sequences, alignments and CDS annotations
        #[arg(long)]
        data: PathBuf,

        /// Transcript accession(s) to annotate against
        #[arg(long = "transcript", required = true)]
        transcripts: Vec<String>,

        /// Show deleted bases in delins terms
        #[arg(long)]
        break_delins: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("varmap: {}", err);
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Parse { term } => {
            match parse_term(&term) {
                Some(variant) => {
                    println!("{}", serde_json::to_string_pretty(&variant)?);
                    Ok(())
                }
                None => Err(format!("not parseable as HGVS: '{}'", term).into()),
            }
        }
        Commands::Map { term, data } => {
            let source = MemSource::from_json(&data)?;
            let variant = parse_term(&term)
                .or_else(|| parse_pseudo_hgvs(&source, &term))
                .ok_or_else(|| format!("not parseable as HGVS: '{}'", term))?;
            let outcome = validate_and_map(&source, &variant, &term, &ProjectConfig::default());
            for warning in &outcome.warnings {
                eprintln!("warning: {}", warning);
            }
            match outcome.region {
                Some(region) => {
                    println!(
                        "{}\t{}\t{}\t{}",
                        region.name, region.start, region.end, region.strand
                    );
                    Ok(())
                }
                None => Err(format!("unable to map '{}' to the genome", term).into()),
            }
        }
        Commands::Annotate {
            input,
            output,
            data,
            transcripts,
            break_delins,
        } => {
            let source = MemSource::from_json(&data)?;
            let cfg = ProjectConfig::default().with_break_delins(break_delins);
            let annotator = Annotator::new(&source, transcripts, cfg);
            let mut caches = AnnotationCaches::new();

            let reader: Box<dyn BufRead> = if input.as_os_str() == "-" {
                Box::new(BufReader::new(io::stdin()))
            } else {
                Box::new(BufReader::new(File::open(&input)?))
            };
            let mut writer: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(BufWriter::new(io::stdout())),
            };

            writeln!(writer, "{}", ROW_HEADER)?;
            let mut records = Vec::new();
            for line in reader.lines() {
                records.extend(VariantRecord::parse_vcf_line(&line?));
            }
            for row in annotator.annotate_batch(&records, &mut caches) {
                writeln!(writer, "{}", row)?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}
