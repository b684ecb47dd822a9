//! ユーザー別アクティビティの集計とフラッシュ
//!
//! `trigger` はカウンタを進めて変更済みにするだけ。周期ループが変更済みユーザーの累計を
//! まとめて tracker へ送る。送信失敗はログに残すのみで、同じサイクル内では再送しない。

use async_trait::async_trait;
use scraper_common::runner::{PeriodicRunner, PeriodicTask};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::collector::CollectorClient;
use crate::counter::CounterManager;

struct FlushCycle {
    counters: Arc<CounterManager>,
    collector: CollectorClient,
}

#[async_trait]
impl PeriodicTask for FlushCycle {
    async fn run_once(&self) {
        let batch = self.counters.changed_info();
        if batch.is_empty() {
            return;
        }

        match self.collector.push(&batch).await {
            Ok(()) => debug!(users = batch.len(), "Flushed activity batch"),
            Err(e) => warn!(users = batch.len(), error = %e, "Failed to flush activity batch"),
        }
    }
}

/// アクティビティ集計
pub struct ActivityTracker {
    cycle: Arc<FlushCycle>,
    runner: PeriodicRunner,
}

impl ActivityTracker {
    /// フラッシュ周期と送信先から作成（まだ起動しない）
    pub fn new(period: Duration, collector: CollectorClient) -> Self {
        let cycle = Arc::new(FlushCycle {
            counters: Arc::new(CounterManager::new()),
            collector,
        });
        Self {
            runner: PeriodicRunner::new("activity-flush", period, cycle.clone()),
            cycle,
        }
    }

    /// ユーザーのアクティビティを1件記録する（ブロックしない）
    pub fn trigger(&self, user_id: &str) {
        self.cycle.counters.update(user_id);
    }

    /// 変更分を今すぐ1回フラッシュする
    pub async fn flush(&self) {
        self.cycle.run_once().await;
    }

    /// カウンタ
    pub fn counters(&self) -> &CounterManager {
        &self.cycle.counters
    }

    /// フラッシュループを起動する
    pub async fn run(&self) {
        self.runner.run().await;
    }

    /// フラッシュループを停止し、終了を待つ
    pub async fn stop(&self) {
        self.runner.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_flush_sends_totals_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update"))
            .and(body_json(serde_json::json!({"u1": 3, "u2": 1})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let collector = CollectorClient::new(&server.uri(), None).unwrap();
        let tracker = ActivityTracker::new(Duration::from_secs(30), collector);

        tracker.trigger("u1");
        tracker.trigger("u1");
        tracker.trigger("u1");
        tracker.trigger("u2");

        tracker.flush().await;
        // 変更が無ければ送信しない
        tracker.flush().await;
    }

    #[tokio::test]
    async fn test_failed_flush_is_not_resent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let collector = CollectorClient::new(&server.uri(), None).unwrap();
        let tracker = ActivityTracker::new(Duration::from_secs(30), collector);

        tracker.trigger("u1");
        tracker.flush().await;
        tracker.flush().await;

        assert_eq!(tracker.counters().total("u1"), Some(1));
    }

    #[tokio::test]
    async fn test_running_loop_flushes_and_stops() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let collector = CollectorClient::new(&server.uri(), None).unwrap();
        let tracker = ActivityTracker::new(Duration::from_millis(50), collector);
        tracker.trigger("u1");

        tracker.run().await;
        let mut delivered = false;
        for _ in 0..50 {
            if !server.received_requests().await.unwrap_or_default().is_empty() {
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tracker.stop().await;

        assert!(delivered);
    }
}
