//! 読み書きロックで保護されたコンテナ
//!
//! 「スナップショットしてリセット」や「まとめて読む/書く」を、get+set の組み合わせではなく
//! 単一ロック内の操作として提供する。ロックはawaitをまたいで保持しないため `std::sync::RwLock` を使う。

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    // 書き込み中のpanicでポイズンされても値自体は一貫しているので読み続ける
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// 読み書きロックで保護された単一値
#[derive(Debug, Default)]
pub struct SafeValue<T> {
    value: RwLock<T>,
}

impl<T> SafeValue<T> {
    /// 初期値を指定して作成
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// 値を置き換える（書き込みロック）
    pub fn set(&self, value: T) {
        *write(&self.value) = value;
    }

    /// 書き込みロック下で値を更新する
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut write(&self.value))
    }
}

impl<T: Clone> SafeValue<T> {
    /// 値のコピーを取得（読み込みロック）
    pub fn get(&self) -> T {
        read(&self.value).clone()
    }
}

/// 単調増加カウンタ
#[derive(Debug, Default)]
pub struct SafeCounter {
    value: SafeValue<i64>,
}

impl SafeCounter {
    /// 0から始まるカウンタを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 1加算する（書き込みロック）
    pub fn inc(&self) {
        self.value.update(|v| *v += 1);
    }

    /// 現在値（読み込みロック）
    pub fn get(&self) -> i64 {
        self.value.get()
    }
}

/// 文字列キーのマップ
#[derive(Debug)]
pub struct SafeMap<T> {
    data: RwLock<HashMap<String, T>>,
}

impl<T> Default for SafeMap<T> {
    fn default() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> SafeMap<T> {
    /// 空のマップを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 1件書き込む
    pub fn set(&self, key: impl Into<String>, value: T) {
        write(&self.data).insert(key.into(), value);
    }

    /// まとめて書き込む（1回の書き込みロック）
    pub fn set_many(&self, entries: impl IntoIterator<Item = (String, T)>) {
        write(&self.data).extend(entries);
    }

    /// 空のマップと入れ替え、それまでの中身を返す
    ///
    /// 「スナップショットしてリセット」を単一の書き込みロックで行う。
    pub fn clear(&self) -> HashMap<String, T> {
        std::mem::take(&mut *write(&self.data))
    }

    /// キーが存在するか
    pub fn contains(&self, key: &str) -> bool {
        read(&self.data).contains_key(key)
    }

    /// 件数
    pub fn len(&self) -> usize {
        read(&self.data).len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> SafeMap<T> {
    /// 1件取得
    pub fn get(&self, key: &str) -> Option<T> {
        read(&self.data).get(key).cloned()
    }

    /// まとめて取得する。存在しないキーは黙って読み飛ばす
    pub fn get_many<S: AsRef<str>>(&self, keys: &[S]) -> HashMap<String, T> {
        let data = read(&self.data);
        keys.iter()
            .filter_map(|k| {
                let k = k.as_ref();
                data.get(k).map(|v| (k.to_string(), v.clone()))
            })
            .collect()
    }

    /// 全件のコピー
    pub fn all(&self) -> HashMap<String, T> {
        read(&self.data).clone()
    }
}
