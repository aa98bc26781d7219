use crate::backend::PunchBackend;
use crate::backend::models::{LeaveStatus, PunchRequest, PunchSession, PunchStatusResponse};
use crate::punch::ticker::DurationTicker;
use crate::punch::{Notice, Notifier, PunchStatus, SessionInfo};
use crate::utils::aggregator::aggregate_seconds;
use crate::utils::format::{accuracy_label, format_seconds, leave_label};
use crate::utils::time::ClockSource;
use crate::verify::fingerprint::{EnvironmentSnapshot, compute_fingerprint};
use crate::verify::location::{LocationProvider, LocationVerifier};
use anyhow::{Context, Result, anyhow};
use std::time::Duration;
use tokio::sync::watch;

/// Controller の動作設定
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// true なら位置取得に成功しない限り打刻を送信しない
    pub require_location: bool,
    pub tick_interval: Duration,
    pub user_agent: String,
    pub wifi_ssid: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            require_location: true,
            tick_interval: Duration::from_secs(1),
            user_agent: concat!("kintai-engine/", env!("CARGO_PKG_VERSION")).to_string(),
            wifi_ssid: None,
        }
    }
}

struct PunchOutcome {
    message: String,
    info: SessionInfo,
}

/// 打刻セッションの状態機械
///
/// セッション一覧・打刻状態・休暇状態はこのインスタンスが専有する。
/// バックエンドが正で、ミューテーション後は必ず再取得して状態を合わせる
pub struct PunchController<B, P, N, C> {
    backend: B,
    verifier: LocationVerifier<P>,
    notifier: N,
    clock: C,
    config: EngineConfig,
    env: EnvironmentSnapshot,
    sessions: Vec<PunchSession>,
    leave: Option<LeaveStatus>,
    /// None = まだ取得できていない（表示層は中立状態を出す）
    status: Option<PunchStatus>,
    loading: bool,
    session_info: Option<SessionInfo>,
    duration_tx: watch::Sender<String>,
    ticker: DurationTicker,
}

impl<B, P, N, C> PunchController<B, P, N, C>
where
    B: PunchBackend,
    P: LocationProvider,
    N: Notifier,
    C: ClockSource,
{
    pub fn new(
        backend: B,
        verifier: LocationVerifier<P>,
        notifier: N,
        clock: C,
        config: EngineConfig,
    ) -> Self {
        let env = EnvironmentSnapshot::capture(&config.user_agent);
        let (duration_tx, _) = watch::channel("00:00:00".to_string());
        Self {
            backend,
            verifier,
            notifier,
            clock,
            config,
            env,
            sessions: Vec::new(),
            leave: None,
            status: None,
            loading: false,
            session_info: None,
            duration_tx,
            ticker: DurationTicker::new(),
        }
    }

    /// マウント時の初期化。打刻状況と休暇状態を取得して状態を導出する
    ///
    /// 取得失敗時は状態を不明のままにして通知だけ出す（落とさない）
    pub async fn mount(&mut self) {
        match self.backend.fetch_punch_status().await {
            Ok(response) => self.apply_status(response),
            Err(error) => {
                tracing::error!(%error, "failed to fetch punch status");
                self.notifier.notify(Notice::error(
                    "勤怠状況の取得に失敗しました。時間をおいて再読み込みしてください",
                ));
            }
        }
    }

    /// 打刻アクション。検証ゲートを順に通ってからミューテーションを送る
    ///
    /// 送信中の再呼び出しは無視する（キューイングしない）
    pub async fn punch(&mut self) {
        if self.loading {
            tracing::debug!("punch ignored while another submission is in flight");
            return;
        }

        // 休暇ゲート。ネットワークを一切使わずに即座に弾く
        if let Some(leave) = &self.leave {
            self.notifier.notify(Notice::warning(format!(
                "休暇中のため打刻できません: {}",
                leave_label(leave)
            )));
            return;
        }

        self.loading = true;
        match self.submit().await {
            Ok(outcome) => {
                self.session_info = Some(outcome.info);
                let message = if outcome.message.is_empty() {
                    "打刻を受け付けました".to_string()
                } else {
                    outcome.message
                };
                self.notifier.notify(Notice::success(message));

                // 楽観更新はしない。正となるバックエンドの状態を取り直す
                match self.backend.fetch_punch_status().await {
                    Ok(response) => self.apply_status(response),
                    Err(error) => {
                        tracing::error!(%error, "failed to refresh after punch");
                        self.notifier.notify(Notice::error(
                            "打刻後の状態更新に失敗しました。再読み込みしてください",
                        ));
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, "punch submission failed");
                self.notifier
                    .notify(Notice::error(format!("打刻に失敗しました: {}", error)));
            }
        }
        self.loading = false;
    }

    async fn submit(&mut self) -> Result<PunchOutcome> {
        let location = if self.config.require_location {
            let descriptor = self
                .verifier
                .request_location()
                .await
                .map_err(|error| anyhow!("{error}"))?;
            Some(descriptor)
        } else {
            // 必須でなくても取得済みの座標があれば監査用に添付する
            self.verifier.cached().cloned()
        };

        // IP はあくまで監査メタデータ。解決できなくても打刻は続行する
        let ip = match self.backend.resolve_ip().await {
            Ok(ip) => ip,
            Err(error) => {
                tracing::warn!(%error, "ip resolution failed, continuing with Unknown");
                "Unknown".to_string()
            }
        };

        let now = self.clock.now();
        let fingerprint = compute_fingerprint(&self.env, now);
        let request = PunchRequest {
            lat: location.as_ref().map(|l| l.latitude),
            lng: location.as_ref().map(|l| l.longitude),
            accuracy: location.as_ref().map(|l| l.accuracy_meters),
            ip: ip.clone(),
            wifi_ssid: self
                .config
                .wifi_ssid
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            device_fingerprint: serde_json::to_string(&fingerprint)
                .context("failed to serialize device fingerprint")?,
            user_agent: self.config.user_agent.clone(),
            timestamp: now.to_rfc3339(),
        };

        let response = self.backend.submit_punch(&request).await?;
        if !response.is_success() {
            if response.message.is_empty() {
                anyhow::bail!("サーバが打刻を拒否しました");
            }
            anyhow::bail!(response.message);
        }

        Ok(PunchOutcome {
            message: response.message,
            info: SessionInfo {
                resolved_ip_address: ip,
                location_accuracy_label: accuracy_label(location.as_ref()),
                captured_at_local_string: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            },
        })
    }

    /// 取得したレスポンスを状態へ反映し、必要に応じて計時を開始・停止する
    fn apply_status(&mut self, response: PunchStatusResponse) {
        self.sessions = response.punches;
        self.leave = response.is_user_on_leave;
        let status = PunchStatus::derive(&self.sessions);
        self.status = Some(status);

        // 最初の tick を待たずに基準値を即時反映する
        let now = self.clock.now();
        self.duration_tx
            .send_replace(format_seconds(aggregate_seconds(&self.sessions, now)));

        if status == PunchStatus::PunchedIn {
            self.ticker.start(
                self.sessions.clone(),
                self.clock.clone(),
                self.config.tick_interval,
                self.duration_tx.clone(),
            );
        } else {
            self.ticker.stop();
        }

        tracing::info!(?status, sessions = self.sessions.len(), "punch state applied");
    }

    // --- 表示層向けの読み取り口 ---

    pub fn status(&self) -> Option<PunchStatus> {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn on_leave(&self) -> Option<&LeaveStatus> {
        self.leave.as_ref()
    }

    pub fn session_info(&self) -> Option<&SessionInfo> {
        self.session_info.as_ref()
    }

    /// 監査ダイアログを閉じたら破棄する
    pub fn dismiss_session_info(&mut self) {
        self.session_info = None;
    }

    pub fn current_duration(&self) -> String {
        self.duration_tx.borrow().clone()
    }

    pub fn duration_watch(&self) -> watch::Receiver<String> {
        self.duration_tx.subscribe()
    }

    /// Connectivity Monitor へつなぐ位置取得済みシグナル
    pub fn location_fix_signal(&self) -> watch::Receiver<bool> {
        self.verifier.subscribe_fix()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }
}
