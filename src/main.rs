//! Template-matching knowledge-graph QA server.
//!
//! `--ask "<question>"` answers once and exits; otherwise serves HTTP.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

use graph_template_qa::{
    config::{AppConfig, Cli},
    kgqa::telemetry,
    server::{build_engine, start_server},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before clap reads env-backed flags
    let _ = dotenv();

    telemetry::init();

    let cli = Cli::parse();
    let config = Arc::new(AppConfig::from_cli(&cli)?);
    info!(
        name: "config.loaded",
        provider = %config.store.provider,
        schema = %config.catalog.schema_path,
        templates = %config.catalog.templates_path,
        "Configuration loaded"
    );

    let engine = Arc::new(build_engine(&config).await?);

    if let Some(question) = cli.ask.as_deref() {
        match engine.query(question).await? {
            Some(answer) => println!("{answer}"),
            None => println!("(no answer)"),
        }
        return Ok(());
    }

    start_server(config, engine).await
}
