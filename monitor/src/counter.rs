//! ユーザー別カウンタ
//!
//! カウンタはユーザーごとに高々1つだけ作られる。既存カウンタの取得は読み込みロックだけで済み、
//! 作成時のみ専用ロックを取ってから再確認する（ダブルチェック）。

use scraper_common::protocol::UsersRequests;
use scraper_common::sync::{SafeCounter, SafeMap};
use std::sync::{Arc, Mutex};

/// カウンタ管理
#[derive(Debug, Default)]
pub struct CounterManager {
    create_lock: Mutex<()>,
    counters: SafeMap<Arc<SafeCounter>>,
    updated: SafeMap<()>,
}

impl CounterManager {
    /// 空の状態で作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ユーザーのカウンタを取得（無ければ作成）
    pub fn counter(&self, user_id: &str) -> Arc<SafeCounter> {
        if let Some(counter) = self.counters.get(user_id) {
            return counter;
        }

        let _guard = self.create_lock.lock().unwrap_or_else(|e| e.into_inner());
        // ロック待ちの間に他のタスクが作っているかもしれない
        if let Some(counter) = self.counters.get(user_id) {
            return counter;
        }

        let counter = Arc::new(SafeCounter::new());
        self.counters.set(user_id, counter.clone());
        counter
    }

    /// 1加算して変更済みにする
    pub fn update(&self, user_id: &str) {
        self.counter(user_id).inc();
        self.updated.set(user_id, ());
    }

    /// 前回呼び出し以降に変更されたユーザーの現在の累計
    ///
    /// 変更済みセットは取り出すと同時に空になる。
    pub fn changed_info(&self) -> UsersRequests {
        self.updated
            .clear()
            .into_keys()
            .filter_map(|user_id| {
                let total = self.counters.get(&user_id)?.get();
                Some((user_id, total))
            })
            .collect()
    }

    /// ユーザーの現在の累計
    pub fn total(&self, user_id: &str) -> Option<i64> {
        self.counters.get(user_id).map(|c| c.get())
    }

    /// 全カウンタと変更済みセットを破棄する
    pub fn reset(&self) {
        let _guard = self.create_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.counters.clear();
        self.updated.clear();
    }
}
