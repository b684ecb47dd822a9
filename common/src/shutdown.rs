//! 協調的シャットダウン
//!
//! 各サービスの `main.rs` がOSシグナルと組み合わせて使う。

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::Notify;

/// グレースフル終了用のシャットダウンシグナル
///
/// テストや起動失敗時など、OSシグナル以外から終了を要求するために使う。
#[derive(Clone, Debug, Default)]
pub struct ShutdownController {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownController {
    /// シャットダウンが要求済みか
    pub fn is_shutdown_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// シャットダウンを要求し、待機者をすべて起こす
    pub fn request_shutdown(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// シャットダウンが要求されるまで待つ
    pub async fn wait(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // フラグ確認より先に登録しておき、確認直後の要求を取りこぼさない
        notified.as_mut().enable();

        if self.is_shutdown_requested() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_returns_immediately_when_already_requested() {
        let shutdown = ShutdownController::default();
        shutdown.request_shutdown();

        tokio::time::timeout(Duration::from_millis(100), shutdown.wait())
            .await
            .expect("wait should not block after request");
        assert!(shutdown.is_shutdown_requested());
    }

    #[tokio::test]
    async fn request_wakes_all_clones() {
        let shutdown = ShutdownController::default();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let s = shutdown.clone();
                tokio::spawn(async move { s.wait().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.request_shutdown();

        for w in waiters {
            tokio::time::timeout(Duration::from_secs(2), w)
                .await
                .expect("waiter timed out")
                .expect("waiter panicked");
        }
    }
}
