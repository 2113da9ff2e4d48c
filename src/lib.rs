//! Template-Matching Knowledge-Graph Question Answering
//!
//! Answers natural-language questions over a knowledge graph without
//! machine learning: known schema terms are found in the question, a
//! library of question templates is expanded with them, the expanded
//! questions are ranked by character overlap with the input, and their
//! graph queries are tried best first until one returns data.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP surface (`POST /api/query`)
//! - **Engine**: plan (extract, expand, rank) then resolve against a graph store
//! - **Graph stores**: SurrealDB, or a scripted in-memory store for demos and tests
//!
//! # Modules
//!
//! - [`kgqa`]: domain model, engine, catalog loading and graph stores
//! - [`config`]: layered configuration (defaults, file, environment, CLI)
//! - [`server`]: wiring and HTTP server

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod kgqa;
pub mod server;
