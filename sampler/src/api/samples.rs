//! 計測結果の参照API

use axum::{
    extract::{Query, State},
    Json,
};
use scraper_common::types::SampleData;
use serde::Deserialize;
use std::sync::Arc;

use crate::ProbeManager;

/// `GET /one` のクエリ
#[derive(Debug, Deserialize)]
pub struct OneQuery {
    /// 対象アドレス
    #[serde(default)]
    pub address: String,
}

/// POST /query - 指定アドレスの最新サンプル
pub async fn query(
    State(manager): State<Arc<ProbeManager>>,
    Json(addresses): Json<Vec<String>>,
) -> Json<Vec<SampleData>> {
    Json(manager.query(&addresses))
}

/// GET /one - 1件（未知なら `null`）
pub async fn get_one(
    State(manager): State<Arc<ProbeManager>>,
    Query(params): Query<OneQuery>,
) -> Json<Option<SampleData>> {
    Json(manager.get_one(&params.address))
}

/// GET /all - 全件
pub async fn get_all(State(manager): State<Arc<ProbeManager>>) -> Json<Vec<SampleData>> {
    Json(manager.get_all())
}
