use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::kgqa::runtime::resolution::ResolveOptions;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Schema term sets (JSON)
    #[arg(long, env = "KGQA_SCHEMA")]
    pub schema: Option<String>,

    /// Template table (JSON or YAML)
    #[arg(long, env = "KGQA_TEMPLATES")]
    pub templates: Option<String>,

    /// Answer one question and exit instead of serving HTTP
    #[arg(long)]
    pub ask: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub store: StoreConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Allow cross-origin browser clients.
    pub cors_enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub schema_path: String,
    pub templates_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// `surrealdb` or `memory`.
    pub provider: String,
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Scripted responses for the `memory` provider.
    #[serde(default)]
    pub fixtures_path: Option<String>,
    /// SurrealQL script run once after connecting (`surrealdb` provider).
    #[serde(default)]
    pub seed_path: Option<String>,
    /// Per-query timeout; 0 disables it.
    pub query_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Cap on candidates executed per question.
    #[serde(default)]
    pub max_attempts: Option<usize>,
    /// Cap on candidates expanded per question.
    #[serde(default)]
    pub max_candidates: Option<usize>,
    pub answer_separator: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Build the layered configuration:
    /// defaults < config file < `KGQA_` environment < CLI flags.
    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.cors_enabled", true)?
            .set_default("catalog.schema_path", "data/kg_schema.json")?
            .set_default("catalog.templates_path", "data/question_templates.yaml")?
            .set_default("store.provider", "memory")?
            .set_default("store.url", "mem://")?
            .set_default("store.namespace", "kgqa")?
            .set_default("store.database", "music")?
            .set_default("store.fixtures_path", "data/fixtures.json")?
            .set_default("store.query_timeout_ms", 5000)?
            .set_default("engine.max_candidates", 1000)?
            .set_default("engine.answer_separator", ",")?;

        // 2. Config file: explicit path must exist, ./config.yaml is optional
        match &cli.config {
            Some(path) => builder = builder.add_source(File::with_name(path)),
            None if Path::new("config.yaml").exists() => {
                builder = builder.add_source(File::with_name("config.yaml"));
            }
            None => {}
        }

        // 3. Environment variables, e.g. KGQA_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("KGQA")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI overrides (clap also maps PORT / KGQA_SCHEMA / KGQA_TEMPLATES)
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(schema) = &cli.schema {
            builder = builder.set_override("catalog.schema_path", schema.as_str())?;
        }
        if let Some(templates) = &cli.templates {
            builder = builder.set_override("catalog.templates_path", templates.as_str())?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        let timeout = self.store.query_timeout_ms;
        ResolveOptions {
            query_timeout: (timeout > 0).then(|| Duration::from_millis(timeout)),
            max_attempts: self.engine.max_attempts,
            separator: self.engine.answer_separator.clone(),
        }
    }
}
