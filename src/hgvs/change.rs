//! Change-description parsing
//!
//! Parses the part of an HGVS term after the position range (`A>G`, `del`,
//! `dup5`, `insACGT`, `delinsTT`, ...) into a list of structured changes.
//! A term like `delinsTT` is two changes in sequence: a deletion followed
//! by an insertion.
//!
//! Sequences are normalized to uppercase DNA (RNA `u` becomes `T`) so that
//! downstream comparison against reference sequence is direct. Repeat
//! notation is parsed but rejected by the allele materializer: repeat
//! counts depend on the assembly and cannot be resolved syntactically.

use crate::hgvs::HgvsSeqType;
use crate::seq::revcomp;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    IResult,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Alternate-allele payload of an insertion-like change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HgvsAlt {
    /// Literal inserted sequence
    Literal(String),
    /// Only the inserted length is known (`ins5`, `ins(5)`)
    Length(u32),
    /// Sequence copied from another accession's range
    /// (`insL37425.1:23_361`)
    Nested(NestedTerm),
}

/// A nested term naming bases copied from another sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedTerm {
    pub seq_acc: String,
    pub seq_type: HgvsSeqType,
    pub start1: i64,
    pub end: i64,
    /// The copied range is inverted before insertion
    pub inverted: bool,
}

/// One structural change from an HGVS change description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HgvsChange {
    /// `=`, possibly with an asserted reference sequence before it
    NoChange { reference: Option<String> },
    /// `A>G`
    Substitution {
        reference: String,
        alternative: String,
    },
    /// `del`, `delA`, `del12`
    Deletion {
        reference: Option<String>,
        ref_len: Option<u32>,
    },
    /// `dup`, `dupA`, `dup12`
    Duplication {
        reference: Option<String>,
        ref_len: Option<u32>,
    },
    /// `inv`, `invACGT`, `inv12`
    Inversion {
        reference: Option<String>,
        ref_len: Option<u32>,
    },
    /// `insACGT`, `ins5`, `insACC:c.1_2`
    Insertion { alt: HgvsAlt },
    /// Conversion, `con...` — equivalent to delins
    Conversion { alt: HgvsAlt },
    /// `A[12]`, `[12]`, `ACG[3_5]` — repeat counts, possibly unknown (`?`)
    Repeat {
        reference: Option<String>,
        min: Option<u32>,
        max: Option<u32>,
    },
}

/// Nucleotide run: IUPAC codes, either case; normalized to uppercase DNA.
fn nt_seq(input: &str) -> IResult<&str, String> {
    let bytes = input.as_bytes();
    let mut end = 0;
    while end < bytes.len() && crate::seq::is_iupac_base(bytes[end].to_ascii_uppercase()) {
        end += 1;
    }
    if end == 0 {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeWhile1,
        )));
    }
    let seq: String = input[..end]
        .bytes()
        .map(|b| {
            let b = b.to_ascii_uppercase();
            if b == b'U' {
                'T'
            } else {
                b as char
            }
        })
        .collect();
    Ok((&input[end..], seq))
}

fn number(input: &str) -> IResult<&str, u32> {
    let (rest, digits) = digit1(input)?;
    match digits.parse::<u32>() {
        Ok(n) => Ok((rest, n)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// A count or `?`
fn count(input: &str) -> IResult<&str, Option<u32>> {
    if let Ok((rest, _)) = char::<&str, nom::error::Error<&str>>('?')(input) {
        return Ok((rest, None));
    }
    let (rest, n) = number(input)?;
    Ok((rest, Some(n)))
}

/// A count or `_`-separated count range, optionally in parentheses
fn count_range(input: &str) -> IResult<&str, (Option<u32>, Option<u32>)> {
    if let Ok((rest, _)) = char::<&str, nom::error::Error<&str>>('(')(input) {
        let (rest, range) = count_range(rest)?;
        let (rest, _) = char(')')(rest)?;
        return Ok((rest, range));
    }
    let (rest, min) = count(input)?;
    if let Ok((rest2, _)) = char::<&str, nom::error::Error<&str>>('_')(rest) {
        let (rest2, max) = count(rest2)?;
        return Ok((rest2, (min, max)));
    }
    Ok((rest, (min, min)))
}

/// Repeat notation following an optional sequence: `[n]`, `(n)`, `[n_m]`
fn repeat_tail(input: &str, reference: Option<String>) -> IResult<&str, HgvsChange> {
    let (open, close) = match input.chars().next() {
        Some('[') => ('[', ']'),
        Some('(') => ('(', ')'),
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Char,
            )))
        }
    };
    let (rest, _) = char(open)(input)?;
    let (rest, (min, max)) = count_range(rest)?;
    let (rest, _) = char(close)(rest)?;
    Ok((
        rest,
        HgvsChange::Repeat {
            reference,
            min,
            max,
        },
    ))
}

/// A change led by literal sequence: substitution, asserted no-change,
/// or a repeat
fn parse_seq_led(input: &str) -> IResult<&str, HgvsChange> {
    let (rest, reference) = nt_seq(input)?;
    match rest.chars().next() {
        Some('>') => {
            let (rest, alternative) = nt_seq(&rest[1..])?;
            Ok((
                rest,
                HgvsChange::Substitution {
                    reference,
                    alternative,
                },
            ))
        }
        Some('=') => Ok((
            &rest[1..],
            HgvsChange::NoChange {
                reference: Some(reference),
            },
        )),
        Some('[') | Some('(') => repeat_tail(rest, Some(reference)),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Alt,
        ))),
    }
}

/// del, dup or inv, optionally followed by an asserted reference sequence
/// or a redundant length
fn parse_del_dup_inv(input: &str) -> IResult<&str, HgvsChange> {
    let (rest, op) = alt((tag("del"), tag("dup"), tag("inv")))(input)?;
    let (rest, reference, ref_len) = if let Ok((rest2, seq)) = nt_seq(rest) {
        (rest2, Some(seq), None)
    } else if let Ok((rest2, n)) = number(rest) {
        (rest2, None, Some(n))
    } else {
        (rest, None, None)
    };
    let change = match op {
        "del" => HgvsChange::Deletion { reference, ref_len },
        "dup" => HgvsChange::Duplication { reference, ref_len },
        _ => HgvsChange::Inversion { reference, ref_len },
    };
    Ok((rest, change))
}

// Inserted sequence can come from another accession:
// g.123_124insL37425.1:23_361
static NESTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<acc>[A-Z][A-Z0-9_]*_?[0-9]+(?:\.[0-9]+)?):(?P<t>[cgmnr])\.(?P<s>[0-9]+)_(?P<e>[0-9]+)(?P<inv>inv[0-9]*)?",
    )
    .expect("nested term regex")
});

/// ins or con, whose payload may be a literal sequence, a bare or
/// parenthesized length, or a nested term naming another accession's bases
fn parse_ins_con(input: &str) -> IResult<&str, HgvsChange> {
    let (rest, op) = alt((tag("ins"), tag("con")))(input)?;
    let mk = |alt: HgvsAlt| {
        if op == "ins" {
            HgvsChange::Insertion { alt }
        } else {
            HgvsChange::Conversion { alt }
        }
    };
    if let Some(caps) = NESTED_RE.captures(rest) {
        let seq_type = HgvsSeqType::from_prefix(caps["t"].chars().next().unwrap())
            .expect("regex restricts prefix");
        let nested = NestedTerm {
            seq_acc: caps["acc"].to_string(),
            seq_type,
            start1: caps["s"].parse().unwrap_or(0),
            end: caps["e"].parse().unwrap_or(0),
            inverted: caps.name("inv").is_some(),
        };
        let consumed = caps.get(0).unwrap().end();
        return Ok((&rest[consumed..], mk(HgvsAlt::Nested(nested))));
    }
    if let Ok((rest2, seq)) = nt_seq(rest) {
        return Ok((rest2, mk(HgvsAlt::Literal(seq))));
    }
    // Length only, possibly in parens; a range here would mean copying
    // another region of this sequence, which is not supported
    let (rest2, (min, max)) = count_range(rest)?;
    match (min, max) {
        (Some(a), Some(b)) if a == b => Ok((rest2, mk(HgvsAlt::Length(a)))),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            rest,
            nom::error::ErrorKind::Verify,
        ))),
    }
}

fn parse_equal(input: &str) -> IResult<&str, HgvsChange> {
    let (rest, _) = char('=')(input)?;
    Ok((rest, HgvsChange::NoChange { reference: None }))
}

fn parse_bare_repeat(input: &str) -> IResult<&str, HgvsChange> {
    repeat_tail(input, None)
}

fn parse_one(input: &str) -> IResult<&str, HgvsChange> {
    // Operator tags before sequence: "del" would otherwise scan as the
    // ambiguity code 'd' followed by garbage
    alt((
        parse_ins_con,
        parse_del_dup_inv,
        parse_seq_led,
        parse_bare_repeat,
        parse_equal,
    ))(input)
}

/// Parse an HGVS nucleotide change description into a list of changes.
/// Returns None when any part of the text fails to parse. The sequence
/// type is accepted for interface symmetry; all nucleotide dialects share
/// one normalized alphabet here.
pub fn parse_nucleotide_change(text: &str, _seq_type: HgvsSeqType) -> Option<Vec<HgvsChange>> {
    let mut input = text;
    let mut changes = Vec::new();
    while !input.is_empty() {
        match parse_one(input) {
            Ok((rest, change)) => {
                changes.push(change);
                input = rest;
            }
            Err(_) => return None,
        }
    }
    if changes.is_empty() {
        None
    } else {
        Some(changes)
    }
}

/// The reference sequence asserted by the first change, if any.
/// Repeat changes never assert one: the true reference usually spans more
/// than the repeating unit.
pub fn asserted_ref(changes: &[HgvsChange]) -> Option<String> {
    match changes.first()? {
        HgvsChange::NoChange { reference }
        | HgvsChange::Deletion { reference, .. }
        | HgvsChange::Duplication { reference, .. }
        | HgvsChange::Inversion { reference, .. } => reference.clone(),
        HgvsChange::Substitution { reference, .. } => Some(reference.clone()),
        HgvsChange::Insertion { .. } | HgvsChange::Conversion { .. } => None,
        HgvsChange::Repeat { .. } => None,
    }
}

/// Materialize the alternate allele implied by a change list against the
/// reference allele `hgvs_ref`. `nested` resolves nested-term payloads to
/// sequence (already oriented; inversion is applied here). Returns None
/// when any change cannot be materialized (repeats, unresolvable nested
/// terms).
pub fn alt_from_changes(
    changes: &[HgvsChange],
    hgvs_ref: &str,
    nested: &mut dyn FnMut(&NestedTerm) -> Option<String>,
) -> Option<String> {
    let mut out = String::new();
    for change in changes {
        match change {
            HgvsChange::Repeat { .. } => return None,
            HgvsChange::NoChange { .. } => out.push_str(hgvs_ref),
            HgvsChange::Duplication { .. } => {
                out.push_str(hgvs_ref);
                out.push_str(hgvs_ref);
            }
            HgvsChange::Deletion { .. } => {}
            HgvsChange::Inversion { .. } => {
                out.push_str(std::str::from_utf8(&revcomp(hgvs_ref.as_bytes())).ok()?);
            }
            HgvsChange::Substitution { alternative, .. } => out.push_str(alternative),
            HgvsChange::Insertion { alt } | HgvsChange::Conversion { alt } => match alt {
                HgvsAlt::Literal(seq) => out.push_str(seq),
                HgvsAlt::Length(n) => out.extend(std::iter::repeat('N').take(*n as usize)),
                HgvsAlt::Nested(term) => {
                    let mut seq = nested(term)?;
                    if term.inverted {
                        seq = String::from_utf8(revcomp(seq.as_bytes())).ok()?;
                    }
                    out.push_str(&seq);
                }
            },
        }
    }
    Some(out)
}
