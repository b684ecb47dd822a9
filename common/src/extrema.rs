//! 最速/最遅エンドポイントの追跡
//!
//! 直近に完了したサイクルのサンプル列から毎回まるごと再計算する。
//! 増分更新はしないので、一度だけの外れ値が次サイクル以降に残ることはない。

use crate::sync::SafeValue;
use crate::types::SampleData;
use std::sync::Arc;

/// 最小/最大レイテンシのペア
///
/// どちらも `availability == true` のサンプルのスナップショット。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtremumPair {
    /// 最小レイテンシ
    pub min: Arc<SampleData>,
    /// 最大レイテンシ
    pub max: Arc<SampleData>,
}

/// 到達可能なサンプルの中から最小/最大レイテンシを選ぶ
///
/// 最初に見つかった到達可能サンプルで初期化し、残りを厳密比較で走査する。
/// 同値の場合は先に現れたサンプルを残す。到達可能なサンプルが無ければ `None`。
pub fn fold_extrema<'a, I>(samples: I) -> Option<(&'a SampleData, &'a SampleData)>
where
    I: IntoIterator<Item = &'a SampleData>,
{
    let mut available = samples.into_iter().filter(|s| s.is_available());
    let first = available.next()?;

    Some(available.fold((first, first), |(min, max), s| {
        let min = if s.status.latency < min.status.latency {
            s
        } else {
            min
        };
        let max = if s.status.latency > max.status.latency {
            s
        } else {
            max
        };
        (min, max)
    }))
}

/// 直近サイクルの最小/最大
///
/// min と max は同じロックで保持するため、読み手が別サイクルの値を混ぜて観測することはない。
#[derive(Debug, Default)]
pub struct Extrema {
    pair: SafeValue<Option<ExtremumPair>>,
}

impl Extrema {
    /// 空の状態で作成
    pub fn new() -> Self {
        Self::default()
    }

    /// サンプル列から再計算して置き換える
    ///
    /// 到達可能なサンプルが1件も無い場合は前回の値を維持し `false` を返す。
    pub fn update<'a, I>(&self, samples: I) -> bool
    where
        I: IntoIterator<Item = &'a SampleData>,
    {
        match fold_extrema(samples) {
            Some((min, max)) => {
                self.pair.set(Some(ExtremumPair {
                    min: Arc::new(min.clone()),
                    max: Arc::new(max.clone()),
                }));
                true
            }
            None => false,
        }
    }

    /// 最小レイテンシのサンプル
    pub fn min(&self) -> Option<Arc<SampleData>> {
        self.pair.get().map(|p| p.min)
    }

    /// 最大レイテンシのサンプル
    pub fn max(&self) -> Option<Arc<SampleData>> {
        self.pair.get().map(|p| p.max)
    }
}
