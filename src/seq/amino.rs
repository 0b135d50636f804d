//! Amino-acid code conversion
//!
//! Three-letter to one-letter mapping (and back) for the protein term
//! grammar, plus the representative-codon table used when a protein term
//! must be re-expressed in nucleotide space.

/// Three-letter abbreviation for a one-letter amino acid code.
/// Stop ('X' or '*') renders as "Ter".
pub fn aa_to_abbr(aa: u8) -> &'static str {
    match aa.to_ascii_uppercase() {
        b'A' => "Ala",
        b'R' => "Arg",
        b'N' => "Asn",
        b'D' => "Asp",
        b'C' => "Cys",
        b'Q' => "Gln",
        b'E' => "Glu",
        b'G' => "Gly",
        b'H' => "His",
        b'I' => "Ile",
        b'L' => "Leu",
        b'K' => "Lys",
        b'M' => "Met",
        b'F' => "Phe",
        b'P' => "Pro",
        b'S' => "Ser",
        b'T' => "Thr",
        b'W' => "Trp",
        b'Y' => "Tyr",
        b'V' => "Val",
        b'X' | b'*' => "Ter",
        _ => "Xaa",
    }
}

/// One-letter code for a three-letter abbreviation, case-insensitive.
/// "Ter" maps to 'X'.
pub fn abbr_to_aa(abbr: &str) -> Option<u8> {
    let mut buf = [0u8; 3];
    if abbr.len() != 3 {
        return None;
    }
    for (i, b) in abbr.bytes().enumerate() {
        buf[i] = b.to_ascii_lowercase();
    }
    let aa = match &buf {
        b"ala" => b'A',
        b"arg" => b'R',
        b"asn" => b'N',
        b"asp" => b'D',
        b"cys" => b'C',
        b"gln" => b'Q',
        b"glu" => b'E',
        b"gly" => b'G',
        b"his" => b'H',
        b"ile" => b'I',
        b"leu" => b'L',
        b"lys" => b'K',
        b"met" => b'M',
        b"phe" => b'F',
        b"pro" => b'P',
        b"ser" => b'S',
        b"thr" => b'T',
        b"trp" => b'W',
        b"tyr" => b'Y',
        b"val" => b'V',
        b"ter" => b'X',
        _ => return None,
    };
    Some(aa)
}

/// Normalize a single amino-acid token (one-letter or three-letter,
/// `*` allowed for stop) to its one-letter code.
pub fn token_to_aa(token: &str) -> Option<u8> {
    match token.len() {
        1 => {
            let b = token.as_bytes()[0].to_ascii_uppercase();
            if b"ARNDCQEGHILKMFPSTWYVX*".contains(&b) {
                Some(if b == b'*' { b'X' } else { b })
            } else {
                None
            }
        }
        3 => abbr_to_aa(token),
        _ => None,
    }
}

/// Map a string of three-letter codes to one-letter codes, codon by codon.
/// Rejects strings whose length is not a multiple of three or that contain
/// an unrecognized abbreviation. Single-letter input passes through if every
/// character is a valid code.
pub fn three_letter_seq_to_one(seq: &str) -> Option<String> {
    if seq.is_empty() {
        return Some(String::new());
    }
    // Already one-letter?
    if seq
        .bytes()
        .all(|b| b"ARNDCQEGHILKMFPSTWYVX*".contains(&b.to_ascii_uppercase()))
    {
        return Some(
            seq.bytes()
                .map(|b| {
                    let b = b.to_ascii_uppercase();
                    if b == b'*' {
                        'X'
                    } else {
                        b as char
                    }
                })
                .collect(),
        );
    }
    if seq.len() % 3 != 0 {
        return None;
    }
    let mut out = String::with_capacity(seq.len() / 3);
    for chunk in seq.as_bytes().chunks(3) {
        let abbr = std::str::from_utf8(chunk).ok()?;
        out.push(abbr_to_aa(abbr)? as char);
    }
    Some(out)
}

/// An arbitrary representative codon for an amino acid. The true codon for a
/// protein change is genuinely ambiguous without transcript-level data; any
/// valid codon serves for position mapping.
pub fn codon_for_aa(aa: u8) -> Option<&'static [u8; 3]> {
    let codon: &[u8; 3] = match aa.to_ascii_uppercase() {
        b'A' => b"GCT",
        b'R' => b"CGT",
        b'N' => b"AAT",
        b'D' => b"GAT",
        b'C' => b"TGT",
        b'Q' => b"CAA",
        b'E' => b"GAA",
        b'G' => b"GGT",
        b'H' => b"CAT",
        b'I' => b"ATT",
        b'L' => b"CTT",
        b'K' => b"AAA",
        b'M' => b"ATG",
        b'F' => b"TTT",
        b'P' => b"CCT",
        b'S' => b"TCT",
        b'T' => b"ACT",
        b'W' => b"TGG",
        b'Y' => b"TAT",
        b'V' => b"GTT",
        b'X' | b'*' => b"TAA",
        _ => return None,
    };
    Some(codon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::translate_codon;

    #[test]
    fn test_aa_to_abbr() {
        assert_eq!(aa_to_abbr(b'G'), "Gly");
        assert_eq!(aa_to_abbr(b'g'), "Gly");
        assert_eq!(aa_to_abbr(b'X'), "Ter");
        assert_eq!(aa_to_abbr(b'*'), "Ter");
        assert_eq!(aa_to_abbr(b'?'), "Xaa");
    }

    #[test]
    fn test_abbr_to_aa() {
        assert_eq!(abbr_to_aa("Gly"), Some(b'G'));
        assert_eq!(abbr_to_aa("GLY"), Some(b'G'));
        assert_eq!(abbr_to_aa("ter"), Some(b'X'));
        assert_eq!(abbr_to_aa("Foo"), None);
        assert_eq!(abbr_to_aa("Gl"), None);
    }

    #[test]
    fn test_token_to_aa() {
        assert_eq!(token_to_aa("V"), Some(b'V'));
        assert_eq!(token_to_aa("v"), Some(b'V'));
        assert_eq!(token_to_aa("*"), Some(b'X'));
        assert_eq!(token_to_aa("Val"), Some(b'V'));
        assert_eq!(token_to_aa("Zz"), None);
        assert_eq!(token_to_aa("B"), None);
    }

    #[test]
    fn test_three_letter_seq() {
        assert_eq!(
            three_letter_seq_to_one("GlyAlaTer"),
            Some("GAX".to_string())
        );
        assert_eq!(three_letter_seq_to_one("GA"), Some("GA".to_string()));
        assert_eq!(three_letter_seq_to_one("Glyala"), Some("GA".to_string()));
        assert_eq!(three_letter_seq_to_one("GlyAl"), None);
        assert_eq!(three_letter_seq_to_one("FooBar"), None);
    }

    #[test]
    fn test_codon_round_trip() {
        for aa in b"ARNDCQEGHILKMFPSTWYV" {
            let codon = codon_for_aa(*aa).unwrap();
            assert_eq!(translate_codon(codon), *aa, "codon for {}", *aa as char);
        }
        // Stop codon translates to X
        assert_eq!(translate_codon(codon_for_aa(b'X').unwrap()), b'X');
    }
}
