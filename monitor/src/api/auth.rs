//! ヘッダー検証ミドルウェア

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::AppState;

/// ユーザーIDを運ぶヘッダー
pub const USER_ID_HEADER: &str = "user_id";

/// 管理者トークンを運ぶヘッダー
pub const ADMIN_TOKEN_HEADER: &str = "admin_token";

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// `user_id` ヘッダーを必須とし、そのユーザーのアクティビティを記録する
pub async fn track_user(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(user_id) = header(&request, USER_ID_HEADER) else {
        return Err((StatusCode::BAD_REQUEST, "missing user_id header").into_response());
    };

    state.monitor.trigger(user_id);
    Ok(next.run(request).await)
}

/// `admin_token` ヘッダーが設定値と一致することを要求する
///
/// トークンが未設定の場合は管理者エンドポイントを常に 401 で拒否する。
pub async fn require_admin_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let provided = header(&request, ADMIN_TOKEN_HEADER);
    let authorized = match (&state.admin_token, provided) {
        (Some(expected), Some(provided)) => expected.as_ref() == provided,
        _ => false,
    };

    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request");
        return Err((StatusCode::UNAUTHORIZED, "invalid admin token").into_response());
    }

    Ok(next.run(request).await)
}
