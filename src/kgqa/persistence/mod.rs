use crate::kgqa::domain::result::ResultRow;
use anyhow::Result;
use async_trait::async_trait;

pub mod providers;

/// Client for the graph store holding the knowledge graph.
///
/// Query text is opaque to the engine: it is whatever the templates were
/// written in for the store behind this trait.
#[async_trait]
pub trait GraphStore: Send + Sync + std::fmt::Debug {
    /// Run one query and return its rows. An empty vector means the query
    /// matched nothing; `Err` means the store rejected or failed it.
    async fn run(&self, query: &str) -> Result<Vec<ResultRow>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
