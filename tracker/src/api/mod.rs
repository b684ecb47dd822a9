//! REST APIハンドラー
//!
//! 集計の受け付け（`/update`）と管理者向けの期間集計

pub mod requests;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use scraper_common::auth::{require_api_key, ApiKey};
use scraper_common::protocol::{ADMIN_QUERY_ALL_PATH, ADMIN_QUERY_ONE_PATH, UPDATE_PATH};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// APIルーターを作成
pub fn create_router(state: AppState, key: ApiKey) -> Router {
    Router::new()
        .route(UPDATE_PATH, post(requests::update))
        .route(ADMIN_QUERY_ONE_PATH, get(requests::query_one))
        .route(ADMIN_QUERY_ALL_PATH, get(requests::query_all))
        .layer(middleware::from_fn_with_state(key, require_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
