//! Scripted in-memory graph store.
//!
//! Answers queries from a fixed table keyed by the exact query text. Used
//! for offline demos (fixtures file) and tests. With recording switched on,
//! every executed query is logged so tests can check what was run and in
//! which order.

use crate::kgqa::domain::result::ResultRow;
use crate::kgqa::persistence::GraphStore;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
enum Outcome {
    Rows(Vec<ResultRow>),
    Failure(String),
}

#[derive(Debug, Clone)]
struct Scripted {
    outcome: Outcome,
    delay: Option<Duration>,
}

/// On-disk fixtures format.
#[derive(Debug, Deserialize)]
struct FixturesFile {
    #[serde(default)]
    queries: Vec<FixtureEntry>,
}

#[derive(Debug, Deserialize)]
struct FixtureEntry {
    query: String,
    #[serde(default)]
    rows: Vec<ResultRow>,
    #[serde(default)]
    error: Option<String>,
}

/// Graph store backed by a query-text lookup table. Unknown queries return
/// no rows.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    responses: HashMap<String, Scripted>,
    /// `None` unless recording was requested.
    executed: Option<Mutex<Vec<String>>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a log of executed queries, read back with [`Self::executed`].
    #[must_use]
    pub fn with_recording(mut self) -> Self {
        self.executed = Some(Mutex::new(Vec::new()));
        self
    }

    /// Answer `query` with `rows`.
    #[must_use]
    pub fn with_rows(mut self, query: impl Into<String>, rows: Vec<ResultRow>) -> Self {
        self.responses.insert(
            query.into(),
            Scripted {
                outcome: Outcome::Rows(rows),
                delay: None,
            },
        );
        self
    }

    /// Fail `query` with `message`.
    #[must_use]
    pub fn with_failure(mut self, query: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses.insert(
            query.into(),
            Scripted {
                outcome: Outcome::Failure(message.into()),
                delay: None,
            },
        );
        self
    }

    /// Delay the response to an already scripted `query`.
    #[must_use]
    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        if let Some(scripted) = self.responses.get_mut(query) {
            scripted.delay = Some(delay);
        }
        self
    }

    /// Parse a fixtures document:
    /// `{"queries": [{"query": "...", "rows": [...]}, {"query": "...", "error": "..."}]}`.
    pub fn from_fixtures_json(content: &str) -> Result<Self> {
        let file: FixturesFile =
            serde_json::from_str(content).context("Invalid graph store fixtures")?;
        Ok(file
            .queries
            .into_iter()
            .fold(Self::new(), |store, entry| match entry.error {
                Some(message) => store.with_failure(entry.query, message),
                None => store.with_rows(entry.query, entry.rows),
            }))
    }

    pub async fn from_fixtures_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read fixtures {}", path.display()))?;
        let store = Self::from_fixtures_json(&content)?;
        tracing::info!(
            path = %path.display(),
            queries = store.responses.len(),
            "Loaded graph store fixtures"
        );
        Ok(store)
    }

    /// Queries run so far, in execution order. Always empty without
    /// [`Self::with_recording`].
    pub async fn executed(&self) -> Vec<String> {
        match &self.executed {
            Some(log) => log.lock().await.clone(),
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn run(&self, query: &str) -> Result<Vec<ResultRow>> {
        if let Some(log) = &self.executed {
            log.lock().await.push(query.to_string());
        }

        let Some(scripted) = self.responses.get(query) else {
            return Ok(Vec::new());
        };
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        match &scripted.outcome {
            Outcome::Rows(rows) => Ok(rows.clone()),
            Outcome::Failure(message) => Err(anyhow!(message.clone())),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kgqa::domain::result::FieldValue;

    #[tokio::test]
    async fn test_scripted_responses() {
        let store = InMemoryGraphStore::new()
            .with_recording()
            .with_rows("q1", vec![ResultRow::new().with("%ANS%", serde_json::json!("A"))])
            .with_failure("q2", "syntax error");

        assert_eq!(store.run("q1").await.unwrap().len(), 1);
        assert!(store.run("q2").await.is_err());
        assert!(store.run("unknown").await.unwrap().is_empty());
        assert_eq!(store.executed().await, vec!["q1", "q2", "unknown"]);
    }

    #[tokio::test]
    async fn test_queries_are_not_kept_without_recording() {
        let store = InMemoryGraphStore::new().with_rows("q1", Vec::new());
        for _ in 0..100 {
            store.run("q1").await.unwrap();
        }
        assert!(store.executed().await.is_empty());
        assert!(store.executed.is_none());
    }

    #[tokio::test]
    async fn test_fixtures_json() {
        let store = InMemoryGraphStore::from_fixtures_json(
            r#"{"queries": [
                {"query": "rel", "rows": [{"REL": {"types": ["毕业院校"]}}]},
                {"query": "bad", "error": "boom"}
            ]}"#,
        )
        .unwrap();

        let rows = store.run("rel").await.unwrap();
        assert_eq!(rows[0].get("REL"), Some(&FieldValue::relation(["毕业院校"])));
        assert_eq!(store.run("bad").await.unwrap_err().to_string(), "boom");
    }
}
