//! リモート sampler のミラー
//!
//! 全件ループで `GET /all` を取り込み、強制ループ（1秒間隔）で強制セットを
//! `POST /query` に送って該当分だけ取り直す。取得したバッチはキャッシュへ上書きし、
//! そのバッチから最小/最大を再計算する。取得失敗はログに残してそのサイクルを飛ばす。

use async_trait::async_trait;
use scraper_common::error::{ScraperError, ScraperResult};
use scraper_common::extrema::Extrema;
use scraper_common::runner::{PeriodicRunner, PeriodicTask};
use scraper_common::sync::SafeMap;
use scraper_common::types::{unique, SampleData, Status};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::http::ServiceClient;

/// 強制ループの間隔
pub const FORCE_PERIOD: Duration = Duration::from_secs(1);

struct RemoteState {
    http: ServiceClient,
    cache: SafeMap<Status>,
    force: SafeMap<()>,
    extrema: Extrema,
}

impl RemoteState {
    async fn fetch_all(&self) -> ScraperResult<Vec<SampleData>> {
        let response = self
            .http
            .get("/all")?
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ScraperError::Http(format!("failed to fetch samples: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| ScraperError::Http(format!("failed to decode samples: {e}")))
    }

    async fn fetch(&self, addresses: &[String]) -> ScraperResult<Vec<SampleData>> {
        let response = self
            .http
            .post("/query")?
            .json(addresses)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ScraperError::Http(format!("failed to query samples: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| ScraperError::Http(format!("failed to decode samples: {e}")))
    }

    fn merge(&self, batch: &[SampleData]) {
        self.cache
            .set_many(batch.iter().map(|s| (s.address.clone(), s.status)));
        self.extrema.update(batch);
    }

    async fn update_all(&self) {
        match self.fetch_all().await {
            Ok(batch) => {
                debug!(count = batch.len(), "Fetched remote samples");
                self.merge(&batch);
            }
            Err(e) => warn!(error = %e, "Remote full sync failed"),
        }
    }

    async fn update_force(&self) {
        let pending = self.force.clear();
        if pending.is_empty() {
            return;
        }

        let addresses: Vec<String> = pending.into_keys().collect();
        match self.fetch(&addresses).await {
            Ok(batch) => {
                debug!(requested = addresses.len(), received = batch.len(), "Fetched forced samples");
                self.merge(&batch);
            }
            Err(e) => warn!(error = %e, "Remote force sync failed"),
        }
    }
}

struct FullSync(Arc<RemoteState>);

#[async_trait]
impl PeriodicTask for FullSync {
    async fn run_once(&self) {
        self.0.update_all().await;
    }
}

struct ForceSync(Arc<RemoteState>);

#[async_trait]
impl PeriodicTask for ForceSync {
    async fn run_once(&self) {
        self.0.update_force().await;
    }
}

/// リモート sampler のミラー
pub struct RemoteSampler {
    state: Arc<RemoteState>,
    full: PeriodicRunner,
    force: PeriodicRunner,
}

impl RemoteSampler {
    /// sampler のベースURLから作成（まだ取得は始めない）
    pub fn new(base_url: &str, key: Option<&str>, period: Duration) -> ScraperResult<Self> {
        if period.is_zero() {
            return Err(ScraperError::Config("sampling period must be positive".into()));
        }

        let state = Arc::new(RemoteState {
            http: ServiceClient::new(base_url, key)?,
            cache: SafeMap::new(),
            force: SafeMap::new(),
            extrema: Extrema::new(),
        });

        Ok(Self {
            full: PeriodicRunner::new("remote-full", period, Arc::new(FullSync(state.clone()))),
            force: PeriodicRunner::new("remote-force", FORCE_PERIOD, Arc::new(ForceSync(state.clone()))),
            state,
        })
    }

    /// 全件を1回取り込む
    pub async fn update_all(&self) {
        self.state.update_all().await;
    }

    /// 強制セットを1回取り込む
    pub async fn update_force(&self) {
        self.state.update_force().await;
    }

    /// 次の強制サイクルでの取り直しを要求する
    pub fn force_update(&self, address: &str) {
        self.state.force.set(address, ());
        self.force.trigger();
    }

    /// キャッシュ済みの状態（未知のアドレスは除外）
    pub fn query(&self, addresses: &[String]) -> HashMap<String, Status> {
        self.state.cache.get_many(unique(addresses).as_slice())
    }

    /// 直近バッチの最小レイテンシ
    pub fn min(&self) -> Option<Arc<SampleData>> {
        self.state.extrema.min()
    }

    /// 直近バッチの最大レイテンシ
    pub fn max(&self) -> Option<Arc<SampleData>> {
        self.state.extrema.max()
    }

    /// 両方のループを起動する
    pub async fn run(&self) {
        self.full.run().await;
        self.force.run().await;
    }

    /// 両方のループを停止し、終了を待つ
    pub async fn stop(&self) {
        self.force.stop().await;
        self.full.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn samples() -> serde_json::Value {
        json!([
            {"address": "a.test", "availability": true, "access_time": 30_000_000},
            {"address": "b.test", "availability": true, "access_time": 10_000_000},
            {"address": "c.test", "availability": false, "access_time": 0}
        ])
    }

    #[tokio::test]
    async fn test_full_sync_fills_cache_and_extrema() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(samples()))
            .mount(&server)
            .await;

        let remote = RemoteSampler::new(&server.uri(), None, Duration::from_secs(300)).unwrap();
        remote.update_all().await;

        let got = remote.query(&["a.test".into(), "c.test".into(), "zzz".into()]);
        assert_eq!(got.len(), 2);
        assert!(got["a.test"].availability);
        assert!(!got["c.test"].availability);

        assert_eq!(remote.min().unwrap().address, "b.test");
        assert_eq!(remote.max().unwrap().address, "a.test");
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(samples()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/all"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let remote = RemoteSampler::new(&server.uri(), None, Duration::from_secs(300)).unwrap();
        remote.update_all().await;
        remote.update_all().await;

        assert_eq!(remote.query(&["a.test".into()]).len(), 1);
        assert_eq!(remote.min().unwrap().address, "b.test");
    }

    #[tokio::test]
    async fn test_force_posts_pending_addresses_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_json(json!(["b.test"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"address": "b.test", "availability": true, "access_time": 5_000_000}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let remote = RemoteSampler::new(&server.uri(), None, Duration::from_secs(300)).unwrap();
        remote.force_update("b.test");
        remote.update_force().await;
        remote.update_force().await;

        let got = remote.query(&["b.test".into()]);
        assert_eq!(got["b.test"].latency, Duration::from_millis(5));
    }
}
