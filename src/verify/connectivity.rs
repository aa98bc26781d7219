use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// ホストのネットワーク到達性。online/offline 遷移を watch で配信する
pub trait NetworkObserver {
    /// 現在の到達性（navigator.onLine 相当の即値）
    fn is_online(&self) -> bool;

    /// 遷移の購読口
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// 表示層が読む 3 つの独立したフラグ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// このセッション中に一度でも位置を取得できたか
    pub location: bool,
    pub network: bool,
    /// 現状は常に true。将来の端末信頼シグナル用に予約
    pub device: bool,
}

/// Connectivity Monitor。遷移イベント駆動で network フラグを更新する
pub struct ConnectivityMonitor<N> {
    observer: N,
    network_rx: watch::Receiver<bool>,
    location_rx: Option<watch::Receiver<bool>>,
    network: bool,
}

impl<N: NetworkObserver> ConnectivityMonitor<N> {
    pub fn new(observer: N) -> Self {
        let network_rx = observer.subscribe();
        let network = observer.is_online();
        Self {
            observer,
            network_rx,
            location_rx: None,
            network,
        }
    }

    /// LocationVerifier の取得済みシグナルを接続する
    pub fn attach_location_signal(&mut self, location_rx: watch::Receiver<bool>) {
        self.location_rx = Some(location_rx);
    }

    /// 次の online/offline 遷移を待つ。観測元が消えたら None
    pub async fn network_changed(&mut self) -> Option<bool> {
        if self.network_rx.changed().await.is_err() {
            return None;
        }
        self.network = *self.network_rx.borrow();
        Some(self.network)
    }

    /// 手動リフレッシュ。現在値を読み直すだけで副作用はない
    pub fn check_connections(&mut self) {
        self.network = self.observer.is_online();
    }

    pub fn snapshot(&self) -> ConnectionStatus {
        ConnectionStatus {
            location: self
                .location_rx
                .as_ref()
                .map(|rx| *rx.borrow())
                .unwrap_or(false),
            network: self.network,
            device: true,
        }
    }
}

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// 軽量 HTTP プローブで到達性を観測する実装
///
/// ブラウザの online/offline イベントに相当するものがホストに無いため、
/// 観測側でプローブして遷移だけを配信する
#[derive(Clone)]
pub struct HttpNetworkObserver {
    online: Arc<AtomicBool>,
    tx: Arc<watch::Sender<bool>>,
}

impl HttpNetworkObserver {
    /// バックグラウンドの観測タスクを起動する
    pub fn spawn(probe_interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(true);
        let observer = Self {
            online: Arc::new(AtomicBool::new(true)),
            tx: Arc::new(tx),
        };

        let online = observer.online.clone();
        let tx = observer.tx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(probe_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reachable = Self::probe().await;
                let previous = online.swap(reachable, Ordering::SeqCst);
                if previous != reachable {
                    tracing::info!(online = reachable, "network reachability changed");
                    tx.send_replace(reachable);
                }
            }
        });

        observer
    }

    async fn probe() -> bool {
        let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
            Ok(client) => client,
            Err(_) => return false,
        };

        match client
            .get("https://www.cloudflare.com/cdn-cgi/trace")
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => match client
                .get("https://www.google.com/generate_204")
                .send()
                .await
            {
                Ok(response) => {
                    response.status().is_success() || response.status().as_u16() == 204
                }
                Err(_) => false,
            },
        }
    }
}

impl NetworkObserver for HttpNetworkObserver {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeObserver {
        online: Arc<AtomicBool>,
        tx: Arc<watch::Sender<bool>>,
    }

    impl FakeObserver {
        fn new(initial: bool) -> Self {
            let (tx, _rx) = watch::channel(initial);
            Self {
                online: Arc::new(AtomicBool::new(initial)),
                tx: Arc::new(tx),
            }
        }

        fn handle(&self) -> (Arc<AtomicBool>, Arc<watch::Sender<bool>>) {
            (self.online.clone(), self.tx.clone())
        }
    }

    impl NetworkObserver for FakeObserver {
        fn is_online(&self) -> bool {
            self.online.load(Ordering::SeqCst)
        }

        fn subscribe(&self) -> watch::Receiver<bool> {
            self.tx.subscribe()
        }
    }

    #[tokio::test]
    async fn tracks_offline_transition() {
        let observer = FakeObserver::new(true);
        let (online, tx) = observer.handle();
        let mut monitor = ConnectivityMonitor::new(observer);
        assert!(monitor.snapshot().network);

        online.store(false, Ordering::SeqCst);
        let _ = tx.send(false);

        assert_eq!(monitor.network_changed().await, Some(false));
        assert!(!monitor.snapshot().network);
    }

    #[tokio::test]
    async fn check_connections_is_idempotent() {
        let observer = FakeObserver::new(true);
        let (online, _tx) = observer.handle();
        let mut monitor = ConnectivityMonitor::new(observer);

        // イベントを介さず現在値だけ変えても手動リフレッシュで追従する
        online.store(false, Ordering::SeqCst);
        monitor.check_connections();
        assert!(!monitor.snapshot().network);
        monitor.check_connections();
        assert!(!monitor.snapshot().network);
    }

    #[tokio::test]
    async fn device_flag_is_always_true() {
        let monitor = ConnectivityMonitor::new(FakeObserver::new(false));
        assert!(monitor.snapshot().device);
    }

    #[tokio::test]
    async fn location_flag_follows_attached_signal() {
        let observer = FakeObserver::new(true);
        let mut monitor = ConnectivityMonitor::new(observer);
        assert!(!monitor.snapshot().location);

        let (fix_tx, fix_rx) = watch::channel(false);
        monitor.attach_location_signal(fix_rx);
        assert!(!monitor.snapshot().location);

        let _ = fix_tx.send(true);
        assert!(monitor.snapshot().location);
    }
}
