//! Projection and rendering configuration
//!
//! Tunables shared by the gap normalizer, the projectors, and the term
//! generators. All of these have sensible defaults; none are user-visible
//! knobs in the usual case.

use serde::{Deserialize, Serialize};

/// Shortest gap that is still plausibly a genuine intron. Alignment gaps
/// shorter than this are treated as indels between genome and transcript.
/// Surveys of short introns put the floor around 48-50 bp in most species.
pub const MIN_INTRON: u32 = 45;

/// How close an intronic position can be to a splice junction before a
/// protein-level "no change" prediction is withheld.
pub const SPLICE_REGION_FUDGE: u32 = 6;

/// HGVS allows del/dup/inv terms to spell out the affected bases when there
/// are "several"; beyond this many bases only the length is implied.
pub const HGVS_SEVERAL: usize = 30;

/// Configuration for variant projection and HGVS term generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Shortest plausible intron; shorter gaps are classified as indels
    pub min_intron: u32,
    /// Splice-region distance for protein no-change calls
    pub splice_region_fudge: u32,
    /// Show deleted bases in delins terms (`delAGinsTT` vs `delinsTT`)
    pub break_delins: bool,
    /// Wrap predicted protein changes in parentheses (strict HGVS)
    pub add_parens: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            min_intron: MIN_INTRON,
            splice_region_fudge: SPLICE_REGION_FUDGE,
            break_delins: false,
            add_parens: false,
        }
    }
}

impl ProjectConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Show deleted bases in delins terms
    pub fn with_break_delins(mut self, break_delins: bool) -> Self {
        self.break_delins = break_delins;
        self
    }

    /// Wrap predicted protein changes in parentheses
    pub fn with_parens(mut self, add_parens: bool) -> Self {
        self.add_parens = add_parens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.min_intron, 45);
        assert_eq!(config.splice_region_fudge, 6);
        assert!(!config.break_delins);
        assert!(!config.add_parens);
    }

    #[test]
    fn test_builder() {
        let config = ProjectConfig::new().with_break_delins(true).with_parens(true);
        assert!(config.break_delins);
        assert!(config.add_parens);
    }
}
