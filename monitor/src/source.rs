//! エンドポイント状態の取得元
//!
//! ローカルで計測する `ProbeManager` と、リモート sampler を写す `RemoteSampler` を
//! 同じ形で扱うためのトレイト。

use async_trait::async_trait;
use scraper_common::types::{SampleData, Status};
use scraper_sampler::ProbeManager;
use std::collections::HashMap;
use std::sync::Arc;

use crate::remote::RemoteSampler;

/// エンドポイント状態の取得元
#[async_trait]
pub trait EndpointStatus: Send + Sync {
    /// バックグラウンドループを起動する
    async fn run(&self);

    /// バックグラウンドループを停止し、終了を待つ
    async fn stop(&self);

    /// 再計測を要求する（完了は待たない）
    fn force_update(&self, address: &str);

    /// 指定アドレスの状態（未知のアドレスは除外）
    fn query(&self, addresses: &[String]) -> HashMap<String, Status>;

    /// 最小レイテンシ
    fn min(&self) -> Option<Arc<SampleData>>;

    /// 最大レイテンシ
    fn max(&self) -> Option<Arc<SampleData>>;
}

#[async_trait]
impl EndpointStatus for ProbeManager {
    async fn run(&self) {
        ProbeManager::run(self).await;
    }

    async fn stop(&self) {
        ProbeManager::stop(self).await;
    }

    fn force_update(&self, address: &str) {
        ProbeManager::force_update(self, address);
    }

    fn query(&self, addresses: &[String]) -> HashMap<String, Status> {
        ProbeManager::query(self, addresses)
            .into_iter()
            .map(|s| (s.address, s.status))
            .collect()
    }

    fn min(&self) -> Option<Arc<SampleData>> {
        ProbeManager::min(self)
    }

    fn max(&self) -> Option<Arc<SampleData>> {
        ProbeManager::max(self)
    }
}

#[async_trait]
impl EndpointStatus for RemoteSampler {
    async fn run(&self) {
        RemoteSampler::run(self).await;
    }

    async fn stop(&self) {
        RemoteSampler::stop(self).await;
    }

    fn force_update(&self, address: &str) {
        RemoteSampler::force_update(self, address);
    }

    fn query(&self, addresses: &[String]) -> HashMap<String, Status> {
        RemoteSampler::query(self, addresses)
    }

    fn min(&self) -> Option<Arc<SampleData>> {
        RemoteSampler::min(self)
    }

    fn max(&self) -> Option<Arc<SampleData>> {
        RemoteSampler::max(self)
    }
}
