use anyhow::Result;
use kintai_engine::backend::ApiClient;
use kintai_engine::config::Config;
use kintai_engine::punch::TracingNotifier;
use kintai_engine::punch::controller::PunchController;
use kintai_engine::utils::format;
use kintai_engine::utils::time::SystemClock;
use kintai_engine::verify::connectivity::{ConnectivityMonitor, HttpNetworkObserver};
use kintai_engine::verify::location::{LocationVerifier, StaticLocationProvider};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "kintai_engine=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let backend = ApiClient::new(&config.api_base_url, config.auth_token.clone())?;
    let verifier = LocationVerifier::new(StaticLocationProvider::new(config.fixed_location()));

    let observer = HttpNetworkObserver::spawn(Duration::from_secs(30));
    let mut monitor = ConnectivityMonitor::new(observer);
    monitor.attach_location_signal(verifier.subscribe_fix());

    let mut controller =
        PunchController::new(backend, verifier, TracingNotifier, SystemClock, config.engine());

    controller.mount().await;

    tracing::info!(
        status = format::status_label(controller.status()),
        duration = %controller.current_duration(),
        sessions = controller.session_count(),
        "punch card mounted"
    );
    if let Some(leave) = controller.on_leave() {
        tracing::info!(leave = %format::leave_label(leave), "user is on leave");
    }

    // 稼働時間の更新とネットワーク遷移を流し続ける
    let mut duration_rx = controller.duration_watch();
    loop {
        tokio::select! {
            changed = duration_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let duration = duration_rx.borrow_and_update().clone();
                tracing::info!(duration = %duration, "elapsed working time");
            }
            transition = monitor.network_changed() => {
                match transition {
                    Some(online) => tracing::info!(online, "connectivity changed"),
                    None => break,
                }
            }
        }
    }

    Ok(())
}
