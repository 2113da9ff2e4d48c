//! Question Answering Engine
//!
//! One query runs in two regions:
//!
//! - **plan** (synchronous, pure): extract mentions, expand eligible
//!   templates, score and stable-sort the candidates;
//! - **consume** (async, sequential): try candidates best first and stop
//!   at the first one the graph store answers.

use super::expansion::expand_all;
use super::extraction::{DictionaryExtractor, MentionExtractor};
use super::ranking::rank;
use super::resolution::{Resolution, ResolveOptions, resolve};
use crate::kgqa::domain::{candidate::Candidate, catalog::QaCatalog};
use crate::kgqa::error::{QaError, Result};
use crate::kgqa::persistence::GraphStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Answers questions against one catalog and one graph store.
///
/// Cheap to share behind an `Arc`; every query runs independently.
pub struct QaEngine {
    catalog: Arc<QaCatalog>,
    extractor: Arc<dyn MentionExtractor>,
    store: Arc<dyn GraphStore>,
    options: ResolveOptions,
    /// Upper bound on expanded candidates per question.
    candidate_limit: Option<usize>,
}

impl std::fmt::Debug for QaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaEngine")
            .field("templates", &self.catalog.templates().len())
            .field("schema_terms", &self.catalog.schema().len())
            .field("extractor", &self.extractor.name())
            .field("store", &self.store.name())
            .field("options", &self.options)
            .field("candidate_limit", &self.candidate_limit)
            .finish()
    }
}

impl QaEngine {
    /// Create an engine using dictionary extraction over the catalog's
    /// schema.
    pub fn new(catalog: Arc<QaCatalog>, store: Arc<dyn GraphStore>) -> Result<Self> {
        let extractor = DictionaryExtractor::new(catalog.schema())
            .map_err(|e| QaError::Extractor(e.to_string()))?;
        Ok(Self::with_extractor(catalog, store, Arc::new(extractor)))
    }

    /// Create an engine with a custom mention extractor.
    pub fn with_extractor(
        catalog: Arc<QaCatalog>,
        store: Arc<dyn GraphStore>,
        extractor: Arc<dyn MentionExtractor>,
    ) -> Self {
        Self {
            catalog,
            extractor,
            store,
            options: ResolveOptions::default(),
            candidate_limit: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Cap the candidates expanded per question. Repeated mentions make
    /// expansion grow combinatorially; candidates past the cap are never
    /// generated.
    #[must_use]
    pub fn with_candidate_limit(mut self, limit: Option<usize>) -> Self {
        self.candidate_limit = limit;
        self
    }

    pub fn catalog(&self) -> &QaCatalog {
        &self.catalog
    }

    /// Ranked candidates for `sentence`, best first.
    pub fn plan(&self, sentence: &str) -> Result<Vec<Candidate>> {
        let mentions = self.extractor.extract(sentence);
        debug!(sentence, mentions = ?mentions, "Extracted mentions");

        let candidates = expand_all(self.catalog.templates(), &mentions, self.candidate_limit)
            .map_err(|(index, source)| QaError::Template { index, source })?;
        debug!(candidates = candidates.len(), "Expanded templates");

        Ok(rank(sentence, candidates))
    }

    /// Answer `sentence`, reporting which candidate answered.
    pub async fn ask(&self, sentence: &str) -> Result<Resolution> {
        let candidates = self.plan(sentence)?;
        let resolution = resolve(&candidates, self.store.as_ref(), &self.options).await?;

        if let Resolution::Exhausted { attempts, failures } = &resolution {
            info!(sentence, attempts, failures, "No candidate produced an answer");
        }
        Ok(resolution)
    }

    /// Answer `sentence`. `Ok(None)` means no template matched data in the
    /// graph; it is an ordinary outcome, not a failure.
    pub async fn query(&self, sentence: &str) -> Result<Option<String>> {
        Ok(self.ask(sentence).await?.into_answer())
    }
}

// =============================================================================
// Tests
// =============================================================================
