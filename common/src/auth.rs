//! APIキー認証ミドルウェア
//!
//! `api-key` ヘッダーを設定値と照合する。設定が空ならチェックしない。

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::protocol::API_KEY_HEADER;

/// サービスに設定されたAPIキー
#[derive(Debug, Clone, Default)]
pub struct ApiKey(Option<Arc<str>>);

impl ApiKey {
    /// 設定値から作成（空文字は「チェック無効」）
    pub fn new(key: Option<&str>) -> Self {
        Self(key.filter(|k| !k.is_empty()).map(Arc::from))
    }

    /// 提示されたキーが許可されるか
    pub fn accepts(&self, provided: Option<&str>) -> bool {
        match &self.0 {
            None => true,
            Some(expected) => provided == Some(expected.as_ref()),
        }
    }
}

/// `api-key` ヘッダーを検証するミドルウェア
pub async fn require_api_key(
    State(key): State<ApiKey>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    if !key.accepts(provided) {
        tracing::warn!(path = %request.uri().path(), "Rejected request with incorrect API key");
        return Err((StatusCode::UNAUTHORIZED, "incorrect API key").into_response());
    }

    Ok(next.run(request).await)
}
