//! エンドポイント状態API

use axum::{
    extract::{Query, RawQuery, State},
    Json,
};
use scraper_common::error::{AppError, ScraperError};
use scraper_common::types::{SampleData, Status};
use serde::Deserialize;
use std::collections::HashMap;

use super::AppState;

/// `GET /force` のクエリ
#[derive(Debug, Deserialize)]
pub struct ForceQuery {
    /// 対象アドレス
    #[serde(default)]
    pub target: String,
}

/// クエリ文字列から `target` を出現順にすべて取り出す（空値は除外）
pub fn parse_targets(raw: Option<&str>) -> Result<Vec<String>, ScraperError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)
        .map_err(|e| ScraperError::InvalidInput(format!("malformed query: {e}")))?;

    Ok(pairs
        .into_iter()
        .filter(|(key, value)| key == "target" && !value.is_empty())
        .map(|(_, value)| value)
        .collect())
}

/// GET /force - 再計測を要求
pub async fn force(State(state): State<AppState>, Query(query): Query<ForceQuery>) {
    state.monitor.force(&query.target);
}

/// GET /check - 複数エンドポイントの状態
pub async fn check(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<HashMap<String, Status>>, AppError> {
    let targets = parse_targets(raw.as_deref())?;
    Ok(Json(state.monitor.check(&targets)))
}

/// GET /min - 最小レイテンシ（未計算なら `null`）
pub async fn min(State(state): State<AppState>) -> Json<Option<SampleData>> {
    Json(state.monitor.min().as_deref().cloned())
}

/// GET /max - 最大レイテンシ（未計算なら `null`）
pub async fn max(State(state): State<AppState>) -> Json<Option<SampleData>> {
    Json(state.monitor.max().as_deref().cloned())
}
