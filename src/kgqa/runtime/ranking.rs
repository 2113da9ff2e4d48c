//! Candidate Ranking
//!
//! Lexical similarity between the user's sentence and each candidate's
//! resolved question: the Jaccard index of the two strings' character sets.

use crate::kgqa::domain::candidate::Candidate;
use std::collections::HashSet;

/// Jaccard similarity of the distinct characters of `a` and `b`.
///
/// Two empty strings score 0.0: the union is empty, so there is nothing to
/// be similar about.
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let left: HashSet<char> = a.chars().collect();
    let right: HashSet<char> = b.chars().collect();

    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = left.intersection(&right).count();
    intersection as f64 / union as f64
}

/// Score every candidate against `sentence` and sort best first.
///
/// The sort is stable: equal scores keep generation order.
pub fn rank(sentence: &str, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    for candidate in &mut candidates {
        candidate.score = similarity(sentence, &candidate.question);
    }

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for c in &candidates {
        tracing::debug!(
            question = %c.question,
            score = c.score,
            query = %c.query,
            "Ranked candidate"
        );
    }
    candidates
}

// =============================================================================
// Tests
// =============================================================================
