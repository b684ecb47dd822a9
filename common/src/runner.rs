//! 周期実行タスクランナー
//!
//! すべての常駐ループ（全件プローブ、強制プローブ、集計フラッシュ）が使う共通部品。
//!
//! - `run()` は作業を即座に1回実行し、`period - 作業時間`（下限0）だけ待って繰り返す
//! - 待機中は `trigger()` または `stop()` で即座に起こせる
//! - `stop()` はループが完全に終了するまで戻らない。停止済みなら何もしない
//! - `run()` は内部で先に `stop()` するので、二重起動ではなく再起動になる

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::sync::SafeValue;

/// ランナーが周期的に呼び出す作業
///
/// エラーチャネルは持たない。失敗は作業側でログに記録し、次の周期で再試行される。
#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    /// 1サイクル分の作業
    async fn run_once(&self);
}

/// 起動中ループ1本分の制御シグナル
#[derive(Debug, Default)]
struct LoopSignal {
    running: AtomicBool,
    wake: Notify,
}

impl LoopSignal {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn wake(&self) {
        // notify_one は待機者がいなければ許可を1つ保持するため、作業中の起床要求も失われない
        self.wake.notify_one();
    }
}

struct ActiveLoop {
    signal: Arc<LoopSignal>,
    handle: JoinHandle<()>,
}

/// 周期実行ランナー
///
/// 状態遷移 `Idle → Running → Stopping → Idle` は制御ロックで直列化されるため、
/// `run()` / `stop()` が並行に呼ばれてもループが2本同時に存在することはない。
pub struct PeriodicRunner {
    name: String,
    period: Duration,
    task: Arc<dyn PeriodicTask>,
    active: Mutex<Option<ActiveLoop>>,
    // trigger() をロック待ちなしで呼べるよう、現在のシグナルを別途保持する
    signal: SafeValue<Option<Arc<LoopSignal>>>,
}

impl std::fmt::Debug for PeriodicRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicRunner")
            .field("name", &self.name)
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish()
    }
}

impl PeriodicRunner {
    /// 新しいランナーを作成（まだ起動しない）
    pub fn new(name: impl Into<String>, period: Duration, task: Arc<dyn PeriodicTask>) -> Self {
        Self {
            name: name.into(),
            period,
            task,
            active: Mutex::new(None),
            signal: SafeValue::new(None),
        }
    }

    /// ループが動作中か
    pub fn is_running(&self) -> bool {
        self.signal
            .get()
            .map(|signal| signal.is_running())
            .unwrap_or(false)
    }

    /// バックグラウンドループを起動する（起動中なら再起動）
    ///
    /// ループの登録は spawn より前にこの呼び出しの中で完了するため、
    /// 直後に `stop()` を呼んでも確実に待ち合わせられる。
    pub async fn run(&self) {
        let mut active = self.active.lock().await;
        self.shutdown_locked(&mut active).await;

        let signal = Arc::new(LoopSignal {
            running: AtomicBool::new(true),
            wake: Notify::new(),
        });
        self.signal.set(Some(signal.clone()));

        info!(runner = %self.name, period = ?self.period, "Periodic runner started");

        let handle = tokio::spawn(run_loop(
            self.name.clone(),
            self.period,
            self.task.clone(),
            signal.clone(),
        ));
        *active = Some(ActiveLoop { signal, handle });
    }

    /// ループを停止し、終了を待つ（停止済みなら何もしない）
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        self.shutdown_locked(&mut active).await;
    }

    /// 待機中のループを即座に起こす（ブロックしない）
    pub fn trigger(&self) {
        if let Some(signal) = self.signal.get() {
            signal.wake();
        }
    }

    async fn shutdown_locked(&self, active: &mut Option<ActiveLoop>) {
        let Some(current) = active.take() else {
            return;
        };

        debug!(runner = %self.name, "Stopping periodic runner");
        current.signal.running.store(false, Ordering::SeqCst);
        current.signal.wake();
        self.signal.set(None);

        if let Err(e) = current.handle.await {
            warn!(runner = %self.name, error = %e, "Periodic runner task join failed");
        }
        info!(runner = %self.name, "Periodic runner stopped");
    }
}

impl Drop for PeriodicRunner {
    fn drop(&mut self) {
        // Dropでは待ち合わせできないので、終了要求だけ出しておく
        if let Some(signal) = self.signal.get() {
            signal.running.store(false, Ordering::SeqCst);
            signal.wake();
        }
    }
}

async fn run_loop(
    name: String,
    period: Duration,
    task: Arc<dyn PeriodicTask>,
    signal: Arc<LoopSignal>,
) {
    while signal.is_running() {
        let started = Instant::now();
        task.run_once().await;

        if !signal.is_running() {
            break;
        }

        match period.checked_sub(started.elapsed()) {
            Some(remaining) => {
                tokio::select! {
                    _ = signal.wake.notified() => {
                        debug!(runner = %name, "Periodic runner woken early");
                    }
                    _ = tokio::time::sleep(remaining) => {}
                }
            }
            // 作業が周期を超えた場合も他のタスクに実行機会を渡す
            None => tokio::task::yield_now().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingTask {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl PeriodicTask for CountingTask {
        async fn run_once(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn runner(period: Duration) -> (PeriodicRunner, Arc<CountingTask>) {
        let task = Arc::new(CountingTask::default());
        (PeriodicRunner::new("test", period, task.clone()), task)
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_executes_immediately_then_periodically() {
        let (runner, task) = runner(Duration::from_secs(10));
        runner.run().await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(task.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(task.calls.load(Ordering::SeqCst), 2);

        runner.stop().await;
    }

    #[test]
    fn test_debug_shows_name_period_and_state() {
        let (runner, _task) = runner(Duration::from_secs(3));
        let text = format!("{runner:?}");
        assert!(text.contains("\"test\""));
        assert!(text.contains("3s"));
        assert!(text.contains("running: false"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_on_idle_runner_is_noop() {
        let (runner, task) = runner(Duration::from_secs(1));
        runner.stop().await;
        runner.stop().await;

        assert!(!runner.is_running());
        assert_eq!(task.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_joins_loop_and_no_work_after_return() {
        let (runner, task) = runner(Duration::from_secs(60));
        runner.run().await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        runner.stop().await;
        assert!(!runner.is_running());
        let calls = task.calls.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(task.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_immediately_after_run() {
        let (runner, task) = runner(Duration::from_secs(60));
        runner.run().await;
        runner.stop().await;

        assert!(!runner.is_running());
        let calls = task.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(task.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_twice_leaves_single_loop() {
        let (runner, task) = runner(Duration::from_millis(50));
        runner.run().await;
        runner.run().await;
        assert!(runner.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;
        runner.stop().await;

        assert_eq!(task.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_wakes_pending_sleep() {
        let (runner, task) = runner(Duration::from_secs(3600));
        runner.run().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(task.calls.load(Ordering::SeqCst), 1);

        runner.trigger();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(task.calls.load(Ordering::SeqCst), 2);

        runner.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let (runner, task) = runner(Duration::from_secs(3600));
        runner.run().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        runner.stop().await;

        runner.run().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(runner.is_running());
        assert_eq!(task.calls.load(Ordering::SeqCst), 2);

        runner.stop().await;
    }
}
