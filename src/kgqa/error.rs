use crate::kgqa::domain::template::TemplateError;

/// Errors surfaced by the question answering engine.
///
/// "No answer" is not an error; see [`crate::kgqa::runtime::engine::QaEngine::query`].
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    /// A template failed to expand. Templates are validated on load, so
    /// this points at a catalog built around validation.
    #[error("template {index} is invalid: {source}")]
    Template {
        index: usize,
        #[source]
        source: TemplateError,
    },

    /// The mention extractor could not be built from the schema.
    #[error("mention extractor could not be built: {0}")]
    Extractor(String),

    /// Every candidate that was tried failed in the graph store, so the
    /// question may well have an answer we could not reach.
    #[error("graph store unavailable after {attempts} attempt(s): {last_error}")]
    StoreUnavailable { attempts: usize, last_error: String },
}

pub type Result<T> = std::result::Result<T, QaError>;
