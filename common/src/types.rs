//! 計測データ型
//!
//! エンドポイントごとの最新サンプルと、その共通ヘルパー

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// エンドポイントの到達性とレイテンシ
///
/// `availability == false` の場合、`latency` は直前の値のまま残り、意味を持たない。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// 接続できたかどうか
    pub availability: bool,
    /// 接続に要した時間（ナノ秒整数でシリアライズ）
    #[serde(rename = "access_time", with = "duration_nanos")]
    pub latency: Duration,
}

impl Status {
    /// 到達可能なステータスを作成
    pub fn available(latency: Duration) -> Self {
        Self {
            availability: true,
            latency,
        }
    }
}

/// 監視対象1件分の最新サンプル
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleData {
    /// 設定ファイルに記載されたアドレス（ポート補完前）
    pub address: String,
    /// 最新ステータス
    #[serde(flatten)]
    pub status: Status,
}

impl SampleData {
    /// 未計測のサンプルを作成
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status: Status::default(),
        }
    }

    /// 到達可能かどうか
    pub fn is_available(&self) -> bool {
        self.status.availability
    }
}

/// 入力順を保ったまま重複を取り除く（最初の出現を残す）
pub fn unique(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

/// `Duration` をナノ秒の整数として読み書きする
mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(value.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        // 負値は「未計測」として0扱い
        let nanos = i64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos.max(0) as u64))
    }
}
