//! 問い合わせ/転送の窓口
//!
//! エンドポイント状態の取得元とアクティビティ集計をまとめ、HTTP層へ小さな操作だけを見せる。

use scraper_common::error::ScraperResult;
use scraper_common::types::{SampleData, Status};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::aggregator::ActivityTracker;
use crate::collector::{CollectorClient, Forwarded};
use crate::source::EndpointStatus;

/// モニター本体
pub struct Monitor {
    status: Arc<dyn EndpointStatus>,
    activity: ActivityTracker,
    collector: CollectorClient,
}

impl Monitor {
    /// 構成要素から作成
    pub fn new(
        status: Arc<dyn EndpointStatus>,
        activity: ActivityTracker,
        collector: CollectorClient,
    ) -> Self {
        Self {
            status,
            activity,
            collector,
        }
    }

    /// ユーザーのアクティビティを記録
    pub fn trigger(&self, user_id: &str) {
        self.activity.trigger(user_id);
    }

    /// エンドポイントの再計測を要求（空文字は無視）
    pub fn force(&self, target: &str) {
        if target.is_empty() {
            return;
        }
        self.status.force_update(target);
    }

    /// 複数エンドポイントの状態
    pub fn check(&self, targets: &[String]) -> HashMap<String, Status> {
        if targets.is_empty() {
            return HashMap::new();
        }
        self.status.query(targets)
    }

    /// 最小レイテンシのエンドポイント
    pub fn min(&self) -> Option<Arc<SampleData>> {
        self.status.min()
    }

    /// 最大レイテンシのエンドポイント
    pub fn max(&self) -> Option<Arc<SampleData>> {
        self.status.max()
    }

    /// 管理者向け問い合わせを tracker へ素通しする
    pub async fn forward(&self, path_and_query: &str) -> ScraperResult<Forwarded> {
        self.collector.forward(path_and_query).await
    }

    /// アクティビティ集計
    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    /// バックグラウンドループをすべて起動
    pub async fn start(&self) {
        self.status.run().await;
        self.activity.run().await;
        info!("Monitor loops started");
    }

    /// バックグラウンドループをすべて停止
    pub async fn stop(&self) {
        self.activity.stop().await;
        self.status.stop().await;
        info!("Monitor loops stopped");
    }
}
