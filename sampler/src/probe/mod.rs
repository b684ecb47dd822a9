//! バッチ化されたプローブスケジューラ
//!
//! 2本の周期ループを持つ:
//! - 全件ループ（周期 `period`）: 全グループを並行に計測し、完了後に最小/最大を再計算
//! - 強制ループ（1秒間隔、または `force_update` で即時起床）: 強制セットを取り出して
//!   該当アドレスだけを計測し直す
//!
//! 2本のループは同じスロットに独立に書き込むため、後勝ちになる。

pub mod group;

use async_trait::async_trait;
use futures::future::join_all;
use scraper_common::error::{ScraperError, ScraperResult};
use scraper_common::extrema::Extrema;
use scraper_common::runner::{PeriodicRunner, PeriodicTask};
use scraper_common::sync::SafeMap;
use scraper_common::types::{unique, SampleData};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use self::group::{plan_groups, ProbeGroup, ProbeSlot};

/// 強制ループの間隔
pub const FORCE_PERIOD: Duration = Duration::from_secs(1);

struct ProbeState {
    groups: Vec<Arc<ProbeGroup>>,
    lut: HashMap<String, Arc<ProbeSlot>>,
    force: SafeMap<()>,
    extrema: Extrema,
    timeout: Duration,
}

impl ProbeState {
    async fn update_all(&self) {
        let started = tokio::time::Instant::now();
        let timeout = self.timeout;

        let handles: Vec<_> = self
            .groups
            .iter()
            .map(|group| {
                let group = group.clone();
                tokio::spawn(async move { group.probe_all(timeout).await })
            })
            .collect();

        // すべてのグループが終わってから最小/最大を計算する
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Probe group task failed");
            }
        }

        let samples: Vec<SampleData> = self
            .groups
            .iter()
            .flat_map(|g| g.slots())
            .map(|slot| slot.sample())
            .collect();
        let available = samples.iter().filter(|s| s.is_available()).count();
        self.extrema.update(&samples);

        info!(
            total = samples.len(),
            available,
            elapsed = ?started.elapsed(),
            "Full probe cycle completed"
        );
    }

    async fn update_force(&self) {
        let pending = self.force.clear();
        if pending.is_empty() {
            return;
        }

        let mut slots: Vec<Arc<ProbeSlot>> = pending
            .keys()
            .filter_map(|address| self.lut.get(address).cloned())
            .collect();
        if slots.is_empty() {
            debug!(requested = pending.len(), "Force set had no known addresses");
            return;
        }
        slots.sort_by_key(|slot| slot.order());

        join_all(slots.iter().map(|slot| slot.probe(self.timeout))).await;

        let samples: Vec<SampleData> = slots.iter().map(|slot| slot.sample()).collect();
        self.extrema.update(&samples);

        debug!(probed = samples.len(), "Force probe cycle completed");
    }
}

struct FullCycle(Arc<ProbeState>);

#[async_trait]
impl PeriodicTask for FullCycle {
    async fn run_once(&self) {
        self.0.update_all().await;
    }
}

struct ForceCycle(Arc<ProbeState>);

#[async_trait]
impl PeriodicTask for ForceCycle {
    async fn run_once(&self) {
        self.0.update_force().await;
    }
}

/// プローブマネージャー
///
/// グループ構成とルックアップテーブルは構築時に一度だけ作られ、以後変わらない。
pub struct ProbeManager {
    state: Arc<ProbeState>,
    full: PeriodicRunner,
    force: PeriodicRunner,
}

impl std::fmt::Debug for ProbeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeManager")
            .field("endpoints", &self.state.lut.len())
            .field("groups", &self.state.groups.len())
            .field("timeout", &self.state.timeout)
            .finish()
    }
}

impl ProbeManager {
    /// アドレス列からマネージャーを構築する（まだ計測は始めない）
    ///
    /// アドレスは順序を保って重複除去される。`period` / `timeout` が0、
    /// またはタイムアウトが大きすぎてグループを計算できない場合は設定エラー。
    pub fn new(period: Duration, timeout: Duration, addresses: &[String]) -> ScraperResult<Self> {
        if period.is_zero() {
            return Err(ScraperError::Config("probe period must be positive".into()));
        }
        if timeout.is_zero() {
            return Err(ScraperError::Config("probe timeout must be positive".into()));
        }

        let addresses = unique(addresses);
        let mut lut = HashMap::with_capacity(addresses.len());
        let mut groups = Vec::new();
        let mut order = 0;

        let planned = plan_groups(period, timeout, &addresses).ok_or_else(|| {
            ScraperError::Config(format!("probe timeout {timeout:?} is too large"))
        })?;

        for members in planned {
            let mut slots = Vec::with_capacity(members.len());
            for address in members {
                let slot = Arc::new(ProbeSlot::new(order, &address));
                order += 1;
                lut.insert(address, slot.clone());
                slots.push(slot);
            }
            groups.push(Arc::new(ProbeGroup::new(slots)));
        }

        info!(
            endpoints = lut.len(),
            groups = groups.len(),
            ?period,
            ?timeout,
            "Probe manager initialized"
        );

        let state = Arc::new(ProbeState {
            groups,
            lut,
            force: SafeMap::new(),
            extrema: Extrema::new(),
            timeout,
        });

        Ok(Self {
            full: PeriodicRunner::new("probe-full", period, Arc::new(FullCycle(state.clone()))),
            force: PeriodicRunner::new("probe-force", FORCE_PERIOD, Arc::new(ForceCycle(state.clone()))),
            state,
        })
    }

    /// 両方のループを起動する（起動中なら再起動）
    pub async fn run(&self) {
        self.full.run().await;
        self.force.run().await;
    }

    /// 両方のループを停止し、終了を待つ
    pub async fn stop(&self) {
        self.force.stop().await;
        self.full.stop().await;
    }

    /// 全件ループが動作中か
    pub fn is_running(&self) -> bool {
        self.full.is_running()
    }

    /// 全グループを1サイクル計測する
    pub async fn update_all(&self) {
        self.state.update_all().await;
    }

    /// 強制セットを取り出して1サイクル計測する
    ///
    /// ルックアップテーブルに無いアドレスは捨てられる。
    pub async fn update_force(&self) {
        self.state.update_force().await;
    }

    /// 次の強制サイクルでの再計測を要求する（完了は待たない）
    pub fn force_update(&self, address: &str) {
        self.state.force.set(address, ());
        self.force.trigger();
    }

    /// 指定アドレスの最新サンプル（未知のアドレスは黙って除外）
    pub fn query(&self, addresses: &[String]) -> Vec<SampleData> {
        unique(addresses)
            .iter()
            .filter_map(|address| self.state.lut.get(address))
            .map(|slot| slot.sample())
            .collect()
    }

    /// 1件取得
    pub fn get_one(&self, address: &str) -> Option<SampleData> {
        self.state.lut.get(address).map(|slot| slot.sample())
    }

    /// 全件のスナップショット（グループ順）
    pub fn get_all(&self) -> Vec<SampleData> {
        self.state
            .groups
            .iter()
            .flat_map(|g| g.slots())
            .map(|slot| slot.sample())
            .collect()
    }

    /// 直近サイクルの最小レイテンシ
    pub fn min(&self) -> Option<Arc<SampleData>> {
        self.state.extrema.min()
    }

    /// 直近サイクルの最大レイテンシ
    pub fn max(&self) -> Option<Arc<SampleData>> {
        self.state.extrema.max()
    }

    /// 各グループの件数
    pub fn group_sizes(&self) -> Vec<usize> {
        self.state.groups.iter().map(|g| g.slots().len()).collect()
    }
}
