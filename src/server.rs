use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::{AppConfig, StoreConfig};
use crate::kgqa::{
    self,
    loader::load_catalog,
    persistence::{
        GraphStore,
        providers::{memory::InMemoryGraphStore, surreal::SurrealGraphStore},
    },
    runtime::QaEngine,
};

/// Connect the graph store selected by `store.provider`.
pub async fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn GraphStore>> {
    let store: Arc<dyn GraphStore> = match config.provider.as_str() {
        "surrealdb" => {
            let store =
                SurrealGraphStore::new(&config.url, &config.namespace, &config.database).await?;
            if let Some(path) = &config.seed_path {
                let script = tokio::fs::read_to_string(path).await?;
                store.import(&script).await?;
            }
            Arc::new(store)
        }
        "memory" => match &config.fixtures_path {
            Some(path) => Arc::new(InMemoryGraphStore::from_fixtures_file(path).await?),
            None => Arc::new(InMemoryGraphStore::new()),
        },
        other => anyhow::bail!("Unknown graph store provider: {other} (expected surrealdb or memory)"),
    };

    info!(
        name: "store.connected",
        provider = store.name(),
        "Graph store ready"
    );
    Ok(store)
}

/// Load the catalog, connect the store and assemble the engine.
pub async fn build_engine(config: &AppConfig) -> anyhow::Result<QaEngine> {
    let catalog = load_catalog(&config.catalog.schema_path, &config.catalog.templates_path).await?;
    let store = build_store(&config.store).await?;
    let engine = QaEngine::new(Arc::new(catalog), store)?
        .with_options(config.resolve_options())
        .with_candidate_limit(config.engine.max_candidates);
    Ok(engine)
}

/// HTTP application: health check plus the question answering API.
pub fn build_app(engine: Arc<QaEngine>, cors_enabled: bool) -> Router {
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api", kgqa::api::router().with_state(engine))
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    } else {
        app
    }
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>, engine: Arc<QaEngine>) -> anyhow::Result<()> {
    let app = build_app(engine, config.server.cors_enabled);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
