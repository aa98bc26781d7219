use crate::backend::models::PunchSession;
use crate::utils::aggregator::aggregate_seconds;
use crate::utils::format::format_seconds;
use crate::utils::time::ClockSource;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 勤務中だけ動く 1 秒周期の再計算タスク
///
/// 毎ティック、セッション一覧と現在時刻から合計をゼロから再計算する。
/// ホストのスロットリングでティックが飛んでも積み上げ誤差は生じない
pub struct DurationTicker {
    handle: Option<JoinHandle<()>>,
}

impl DurationTicker {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// 計時を開始する。既に動いていれば古いタスクを止めてから起動する
    pub fn start<C: ClockSource>(
        &mut self,
        sessions: Vec<PunchSession>,
        clock: C,
        interval: Duration,
        duration_tx: watch::Sender<String>,
    ) {
        self.stop();

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let now = clock.now();
                let formatted = format_seconds(aggregate_seconds(&sessions, now));
                // 購読者がいなくても最新値は保持する（表示層は後から読む）
                duration_tx.send_replace(formatted);
            }
        }));
    }

    /// タイマーを確実に解放する。状態遷移・破棄のどの経路からも呼ばれる
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for DurationTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DurationTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
