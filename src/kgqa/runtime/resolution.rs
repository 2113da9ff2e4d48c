//! Candidate Resolution
//!
//! Runs ranked candidates against the graph store one at a time, best
//! first, and stops at the first one that returns rows. A failing
//! candidate is skipped like an empty one; only a run where every attempt
//! failed is reported as the store being unavailable.

use crate::kgqa::domain::{
    candidate::{AnswerPattern, Candidate},
    result::ResultRow,
};
use crate::kgqa::error::{QaError, Result};
use crate::kgqa::persistence::GraphStore;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Knobs for the resolution loop.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Per-execution timeout. An elapsed timeout counts as a failure.
    pub query_timeout: Option<Duration>,
    /// Stop after this many executed candidates (`None` tries them all).
    pub max_attempts: Option<usize>,
    /// Joins the formatted answer of each result row.
    pub separator: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            query_timeout: Some(Duration::from_secs(5)),
            max_attempts: None,
            separator: ",".to_string(),
        }
    }
}

/// Terminal state of one resolution run.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A candidate returned rows.
    Answered {
        answer: String,
        candidate: Candidate,
        /// Candidates executed, including the successful one.
        attempts: usize,
    },
    /// No candidate returned rows.
    Exhausted { attempts: usize, failures: usize },
}

impl Resolution {
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answered { answer, .. } => Some(answer),
            Self::Exhausted { .. } => None,
        }
    }

    pub fn into_answer(self) -> Option<String> {
        match self {
            Self::Answered { answer, .. } => Some(answer),
            Self::Exhausted { .. } => None,
        }
    }

    pub fn attempts(&self) -> usize {
        match self {
            Self::Answered { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Try `candidates` in order until one yields rows.
pub async fn resolve(
    candidates: &[Candidate],
    store: &dyn GraphStore,
    options: &ResolveOptions,
) -> Result<Resolution> {
    let limit = options.max_attempts.unwrap_or(usize::MAX);
    let mut attempts = 0;
    let mut failures = 0;
    let mut last_error = String::new();

    for candidate in candidates.iter().take(limit) {
        attempts += 1;
        debug!(
            attempt = attempts,
            store = store.name(),
            query = %candidate.query,
            "Executing candidate"
        );

        match execute(store, &candidate.query, options.query_timeout).await {
            Ok(rows) if rows.is_empty() => {}
            Ok(rows) => {
                let answer = format_answer(&candidate.answer, &rows, &options.separator);
                info!(
                    question = %candidate.question,
                    score = candidate.score,
                    rows = rows.len(),
                    attempts,
                    "Candidate answered"
                );
                return Ok(Resolution::Answered {
                    answer,
                    candidate: candidate.clone(),
                    attempts,
                });
            }
            Err(e) => {
                warn!(
                    query = %candidate.query,
                    error = %e,
                    "Candidate failed in graph store, trying next"
                );
                failures += 1;
                last_error = e;
            }
        }
    }

    if attempts > 0 && failures == attempts {
        return Err(QaError::StoreUnavailable {
            attempts,
            last_error,
        });
    }
    Ok(Resolution::Exhausted { attempts, failures })
}

async fn execute(
    store: &dyn GraphStore,
    query: &str,
    timeout: Option<Duration>,
) -> std::result::Result<Vec<ResultRow>, String> {
    let run = store.run(query);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(result) => result,
            Err(_) => return Err(format!("timed out after {}ms", limit.as_millis())),
        },
        None => run.await,
    };
    result.map_err(|e| format!("{e:#}"))
}

/// Fill an answer pattern once per row and join the results.
///
/// Every field name in the row is replaced literally wherever it occurs in
/// the pattern text, in the same single pass that fills the slots.
pub fn format_answer(pattern: &AnswerPattern, rows: &[ResultRow], separator: &str) -> String {
    rows.iter()
        .map(|row| pattern.fill(row.iter().map(|(name, value)| (name, value.as_answer_text()))))
        .collect::<Vec<_>>()
        .join(separator)
}

// =============================================================================
// Tests
// =============================================================================
