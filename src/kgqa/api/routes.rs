//! REST routes for asking questions and inspecting the template catalog.

use crate::kgqa::{
    domain::template::SlotRequirements,
    error::QaError,
    runtime::{QaEngine, resolution::Resolution},
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

pub fn build_router() -> Router<Arc<QaEngine>> {
    Router::new()
        .route("/query", post(query))
        .route("/templates", get(list_templates))
}

// =============================================================================
// Request/Response DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    /// `null` when no template matched data in the graph.
    pub answer: Option<String>,
    pub matched_question: Option<String>,
    pub score: Option<f64>,
    /// Candidates executed against the graph store.
    pub attempts: usize,
}

impl From<Resolution> for QueryResponse {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Answered {
                answer,
                candidate,
                attempts,
            } => Self {
                answer: Some(answer),
                matched_question: Some(candidate.question),
                score: Some(candidate.score),
                attempts,
            },
            Resolution::Exhausted { attempts, .. } => Self {
                answer: None,
                matched_question: None,
                score: None,
                attempts,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TemplateDto<'a> {
    pub index: usize,
    pub question: &'a str,
    pub query: &'a str,
    pub check: &'a SlotRequirements,
    pub answer: &'a str,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/query - Answer one question.
async fn query(
    State(engine): State<Arc<QaEngine>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "question must not be empty".to_string()));
    }
    info!(question, "Received question");

    match engine.ask(question).await {
        Ok(resolution) => Ok(Json(resolution.into())),
        Err(e @ QaError::StoreUnavailable { .. }) => {
            error!(error = %e, "Graph store unavailable");
            Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
        Err(e) => {
            error!(error = %e, "Question answering failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// GET /api/templates - List loaded templates in catalog order.
async fn list_templates(State(engine): State<Arc<QaEngine>>) -> Json<serde_json::Value> {
    let templates: Vec<_> = engine
        .catalog()
        .templates()
        .iter()
        .enumerate()
        .map(|(index, t)| TemplateDto {
            index,
            question: t.question(),
            query: t.query(),
            check: t.requirements(),
            answer: t.answer(),
        })
        .collect();
    Json(serde_json::json!({ "templates": templates }))
}
