//! REST APIハンドラー
//!
//! `POST /query`、`GET /one`、`GET /all`

pub mod samples;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use scraper_common::auth::{require_api_key, ApiKey};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::ProbeManager;

/// APIルーターを作成
pub fn create_router(manager: Arc<ProbeManager>, key: ApiKey) -> Router {
    Router::new()
        .route("/query", post(samples::query))
        .route("/one", get(samples::get_one))
        .route("/all", get(samples::get_all))
        .layer(middleware::from_fn_with_state(key, require_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(manager)
}
