//! リクエスト数API
//!
//! 期間集計の結果は整数をそのままプレーンテキストで返す。

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use scraper_common::error::{AppError, ScraperError};
use scraper_common::protocol::{RangeQuery, UsersRequests};

use crate::AppState;

/// POST /update - 集計バッチを受信時刻で追記
pub async fn update(
    State(state): State<AppState>,
    Json(batch): Json<UsersRequests>,
) -> Result<StatusCode, AppError> {
    let now = chrono::Utc::now().timestamp();
    state.storage.append_batch(&batch, now).await?;
    Ok(StatusCode::OK)
}

/// GET /admin_query_one - 1ユーザーの期間合計
///
/// `user` が無い、または空文字の場合は 400 を返す。
/// 記録の無いユーザーは 0（エラーではない）。
pub async fn query_one(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<String, AppError> {
    let user = query
        .user
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ScraperError::InvalidInput("missing user".into()))?;
    let to = query.resolve_to(chrono::Utc::now().timestamp());

    let total = state.storage.sum_one(user, query.from, to).await?;
    Ok(total.to_string())
}

/// GET /admin_query_all - 全ユーザーの期間合計
pub async fn query_all(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<String, AppError> {
    let to = query.resolve_to(chrono::Utc::now().timestamp());

    let total = state.storage.sum_all(query.from, to).await?;
    Ok(total.to_string())
}
