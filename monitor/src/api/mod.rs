//! REST APIハンドラー
//!
//! ユーザー向け（`user_id` ヘッダー必須）と管理者向け（`admin_token` ヘッダー必須）のルート

pub mod admin;
pub mod auth;
pub mod endpoints;

use axum::{middleware, routing::get, Router};
use scraper_common::protocol::{ADMIN_QUERY_ALL_PATH, ADMIN_QUERY_ONE_PATH};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::Monitor;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// モニター本体
    pub monitor: Arc<Monitor>,
    /// 管理者トークン（未設定なら管理者ルートはすべて拒否）
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// 状態を作成（空のトークンは未設定扱い）
    pub fn new(monitor: Arc<Monitor>, admin_token: Option<&str>) -> Self {
        Self {
            monitor,
            admin_token: admin_token.filter(|t| !t.is_empty()).map(Arc::from),
        }
    }
}

/// APIルーターを作成
pub fn create_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/force", get(endpoints::force))
        .route("/check", get(endpoints::check))
        .route("/min", get(endpoints::min))
        .route("/max", get(endpoints::max))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::track_user,
        ));

    let admin_routes = Router::new()
        .route(ADMIN_QUERY_ONE_PATH, get(admin::forward))
        .route(ADMIN_QUERY_ALL_PATH, get(admin::forward))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin_token,
        ));

    user_routes
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
