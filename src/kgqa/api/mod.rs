pub mod routes;

use axum::Router;

use crate::kgqa::runtime::QaEngine;
use std::sync::Arc;

pub fn router() -> Router<Arc<QaEngine>> {
    routes::build_router()
}
