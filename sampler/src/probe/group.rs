//! プローブグループ
//!
//! グループ内のエンドポイントは1つずつ順番に計測し、グループ同士は並行に動かす。
//! グループサイズは「タイムアウトを順に積み上げても1周期に収まる件数」で決まる。

use scraper_common::sync::SafeValue;
use scraper_common::types::{SampleData, Status};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;

/// タイムアウトに上乗せする余裕時間
pub const GUARD: Duration = Duration::from_millis(100);

/// ポート未指定アドレスに補うポート
pub const DEFAULT_PORT: u16 = 80;

/// 1周期に順番に計測できる件数 `floor(period / (timeout + GUARD)) + 1`
///
/// `timeout + GUARD` が `Duration` の範囲を超える場合は `None`。
pub fn group_size(period: Duration, timeout: Duration) -> Option<usize> {
    let budget = timeout.checked_add(GUARD)?.as_nanos();
    let fits = usize::try_from(period.as_nanos() / budget).unwrap_or(usize::MAX);
    Some(fits.saturating_add(1))
}

/// 重複除去済みアドレス列を連続したグループに分割する（最後のグループは余り）
pub fn plan_groups(
    period: Duration,
    timeout: Duration,
    addresses: &[String],
) -> Option<Vec<Vec<String>>> {
    let size = group_size(period, timeout)?;
    Some(addresses.chunks(size).map(|chunk| chunk.to_vec()).collect())
}

/// 接続先（ポートが無ければ既定ポートを付与）
pub fn dial_target(address: &str) -> String {
    if address.contains(':') {
        address.to_string()
    } else {
        format!("{address}:{DEFAULT_PORT}")
    }
}

/// TCP接続を試み、成功までの経過時間を返す。失敗やタイムアウトは `None`
pub async fn probe(target: &str, timeout: Duration) -> Option<Duration> {
    let started = Instant::now();
    match tokio::time::timeout(timeout, TcpStream::connect(target)).await {
        Ok(Ok(_stream)) => Some(started.elapsed()),
        Ok(Err(e)) => {
            debug!(target, error = %e, "Probe failed");
            None
        }
        Err(_) => {
            debug!(target, ?timeout, "Probe timed out");
            None
        }
    }
}

/// エンドポイント1件分の計測スロット
///
/// スロットはプロセス終了まで同じものが使われ、毎サイクル中身だけが上書きされる。
#[derive(Debug)]
pub struct ProbeSlot {
    order: usize,
    target: String,
    data: SafeValue<SampleData>,
}

impl ProbeSlot {
    /// 新しいスロット（未計測は `availability = false`）
    pub fn new(order: usize, address: &str) -> Self {
        Self {
            order,
            target: dial_target(address),
            data: SafeValue::new(SampleData::new(address)),
        }
    }

    /// 全アドレス中での並び順
    pub fn order(&self) -> usize {
        self.order
    }

    /// 最新のサンプル
    pub fn sample(&self) -> SampleData {
        self.data.get()
    }

    /// 1回計測して結果を書き込む
    ///
    /// 失敗時は到達不可にするだけで、レイテンシは前回値のまま残す。
    pub async fn probe(&self, timeout: Duration) {
        let result = probe(&self.target, timeout).await;
        self.data.update(|data| match result {
            Some(latency) => data.status = Status::available(latency),
            None => data.status.availability = false,
        });
    }
}

/// 順番に計測されるスロットの組
#[derive(Debug)]
pub struct ProbeGroup {
    slots: Vec<Arc<ProbeSlot>>,
}

impl ProbeGroup {
    /// スロット列からグループを作成
    pub fn new(slots: Vec<Arc<ProbeSlot>>) -> Self {
        Self { slots }
    }

    /// 所属スロット
    pub fn slots(&self) -> &[Arc<ProbeSlot>] {
        &self.slots
    }

    /// メンバーを1件ずつ順番に計測する
    pub async fn probe_all(&self, timeout: Duration) {
        for slot in &self.slots {
            slot.probe(timeout).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn addrs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("host{i}.test:80")).collect()
    }

    #[test]
    fn test_group_size_fits_period_budget() {
        // floor(5 / 3.1) + 1 = 2
        assert_eq!(
            group_size(Duration::from_secs(5), Duration::from_secs(3)),
            Some(2)
        );
        // 周期がタイムアウトより短くても最低1件
        assert_eq!(
            group_size(Duration::from_secs(1), Duration::from_secs(60)),
            Some(1)
        );
        // 既定値: floor(300 / 60.1) + 1 = 5
        assert_eq!(
            group_size(Duration::from_secs(300), Duration::from_secs(60)),
            Some(5)
        );
    }

    #[test]
    fn test_group_size_rejects_overflowing_timeout() {
        assert_eq!(group_size(Duration::from_secs(5), Duration::MAX), None);
        assert!(plan_groups(Duration::from_secs(5), Duration::MAX, &addrs(2)).is_none());

        // 巨大な周期でも1件以上、パニックしない
        assert!(group_size(Duration::MAX, Duration::from_nanos(1)).is_some_and(|n| n > 1));
    }

    #[test]
    fn test_plan_groups_two_addresses_single_group() {
        let groups = plan_groups(
            Duration::from_secs(5),
            Duration::from_secs(3),
            &["a.test:80".to_string(), "b.test:80".to_string()],
        )
        .unwrap();
        assert_eq!(groups, vec![vec!["a.test:80", "b.test:80"]]);
    }

    #[test]
    fn test_plan_groups_partitions_exactly() {
        let period = Duration::from_secs(300);
        let timeout = Duration::from_secs(60);
        for n in [0, 1, 4, 5, 6, 23] {
            let input = addrs(n);
            let groups = plan_groups(period, timeout, &input).unwrap();

            let flat: Vec<_> = groups.iter().flatten().cloned().collect();
            assert_eq!(flat, input, "n = {n}");
            assert_eq!(flat.iter().collect::<HashSet<_>>().len(), n);

            assert_eq!(groups.len(), n.div_ceil(5));
            if let Some(max) = groups.iter().map(Vec::len).max() {
                assert!(max <= 5);
            }
        }
    }

    #[test]
    fn test_dial_target_appends_default_port() {
        assert_eq!(dial_target("example.com"), "example.com:80");
        assert_eq!(dial_target("example.com:443"), "example.com:443");
    }

    #[tokio::test]
    async fn test_failed_probe_keeps_previous_latency() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let slot = ProbeSlot::new(0, &address);

        slot.probe(Duration::from_secs(2)).await;
        let first = slot.sample();
        assert!(first.is_available());

        drop(listener);
        slot.probe(Duration::from_secs(2)).await;
        let second = slot.sample();
        assert!(!second.is_available());
        assert_eq!(second.status.latency, first.status.latency);
    }
}
