//! 通信プロトコル定義
//!
//! monitor → tracker、monitor → sampler 間でやり取りするメッセージ

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// フラッシュ1回分の集計（user_id → 累計リクエスト数）
pub type UsersRequests = HashMap<String, i64>;

/// APIキーを運ぶHTTPヘッダー名
pub const API_KEY_HEADER: &str = "api-key";

/// tracker の集計受け付けパス
pub const UPDATE_PATH: &str = "/update";

/// 単一ユーザーの範囲集計パス
pub const ADMIN_QUERY_ONE_PATH: &str = "/admin_query_one";

/// 全ユーザーの範囲集計パス
pub const ADMIN_QUERY_ALL_PATH: &str = "/admin_query_all";

/// 範囲集計クエリ `[from, to)`（Unix秒）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQuery {
    /// 対象ユーザー（全ユーザー集計では未使用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// 開始時刻（含む）
    pub from: i64,
    /// 終了時刻（含まない）。未指定なら現在時刻
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<i64>,
}

impl RangeQuery {
    /// `to` を解決する（未指定なら `now`）
    pub fn resolve_to(&self, now: i64) -> i64 {
        self.to.unwrap_or(now)
    }
}
