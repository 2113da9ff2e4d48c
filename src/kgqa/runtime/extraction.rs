//! Mention Extraction Strategies
//!
//! Provides the trait interface for finding schema terms in a question and
//! the dictionary-based implementation.
//!
//! Matching rule for the dictionary extractor: scan left to right; at each
//! position the longest term that matches wins (ties between equal-length
//! terms go to the lexicographically smaller one); a matched term is
//! consumed, so matches never overlap.

use crate::kgqa::domain::{
    candidate::MentionTable,
    schema::{SchemaTermSets, SlotCategory},
};
use regex::Regex;
use std::collections::BTreeSet;

// =============================================================================
// Extraction Strategy Trait
// =============================================================================

/// Strategy for finding schema term mentions in a sentence.
pub trait MentionExtractor: Send + Sync + std::fmt::Debug {
    /// Extract every mention of every slot category.
    fn extract(&self, sentence: &str) -> MentionTable;

    /// Get the name of this extraction strategy.
    fn name(&self) -> &'static str;
}

// =============================================================================
// Dictionary Extractor
// =============================================================================

/// Dictionary lookup against the schema term sets, one compiled
/// alternation per category.
#[derive(Debug, Clone)]
pub struct DictionaryExtractor {
    matchers: Vec<(SlotCategory, Option<Regex>)>,
}

impl DictionaryExtractor {
    /// Compile matchers for all four categories.
    ///
    /// Fails only when a term set is too large for the regex size limit.
    pub fn new(schema: &SchemaTermSets) -> Result<Self, regex::Error> {
        let matchers = SlotCategory::ALL
            .into_iter()
            .map(|category| Ok((category, build_matcher(schema.terms(category))?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { matchers })
    }
}

impl MentionExtractor for DictionaryExtractor {
    fn extract(&self, sentence: &str) -> MentionTable {
        let mut table = MentionTable::new();
        for (category, matcher) in &self.matchers {
            let mentions = matcher
                .as_ref()
                .map(|re| find_all(re, sentence))
                .unwrap_or_default();
            table.insert(*category, mentions);
        }
        table
    }

    fn name(&self) -> &'static str {
        "dictionary"
    }
}

/// Alternation ordered longest-first. The regex engine prefers the earliest
/// alternative at the leftmost match position, which yields longest-match.
fn build_matcher(terms: &BTreeSet<String>) -> Result<Option<Regex>, regex::Error> {
    let mut ordered: Vec<&String> = terms.iter().filter(|t| !t.is_empty()).collect();
    if ordered.is_empty() {
        return Ok(None);
    }
    ordered.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });

    let pattern = ordered
        .into_iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&pattern).map(Some)
}

fn find_all(re: &Regex, sentence: &str) -> Vec<String> {
    re.find_iter(sentence)
        .map(|m| m.as_str().to_string())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
