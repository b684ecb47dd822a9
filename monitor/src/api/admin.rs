//! 管理者向け問い合わせの転送

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode, Uri},
    response::Response,
};
use scraper_common::error::{AppError, ScraperError};

use super::AppState;

/// GET /admin_query_one, /admin_query_all - パスとクエリをそのまま tracker へ転送
pub async fn forward(State(state): State<AppState>, uri: Uri) -> Result<Response, AppError> {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let forwarded = state.monitor.forward(path_and_query).await?;

    let mut builder = Response::builder()
        .status(StatusCode::from_u16(forwarded.status).unwrap_or(StatusCode::BAD_GATEWAY));
    if let Some(content_type) = forwarded.content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }

    builder
        .body(Body::from(forwarded.body))
        .map_err(|e| AppError(ScraperError::Http(format!("failed to build response: {e}"))))
}
