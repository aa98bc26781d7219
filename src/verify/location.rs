use crate::backend::models::LocationDescriptor;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;

/// 位置取得失敗の分類。メッセージはそのまま利用者向けに表示する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("位置情報の利用が許可されていません")]
    PermissionDenied,
    #[error("現在地を特定できませんでした")]
    PositionUnavailable,
    #[error("位置情報の取得がタイムアウトしました")]
    Timeout,
    #[error("この環境では位置情報を利用できません")]
    Unsupported,
    #[error("位置情報の取得中に不明なエラーが発生しました")]
    Unknown,
}

/// 位置取得の要求条件。ブラウザの getCurrentPosition 相当
#[derive(Debug, Clone)]
pub struct FixOptions {
    pub enable_high_accuracy: bool,
    /// 1 回の取得に許す上限
    pub timeout: Duration,
    /// この時間以内の取得済み座標はそのまま再利用する
    pub maximum_age: Duration,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }
    }
}

/// ホスト環境の位置情報能力
#[allow(async_fn_in_trait)]
pub trait LocationProvider {
    async fn current_position(
        &self,
        options: &FixOptions,
    ) -> Result<LocationDescriptor, LocationError>;
}

/// 運用側が設定した固定座標を返すプロバイダ
///
/// ヘッドレス環境にはブラウザのような位置情報 API が無いので、
/// 座標未設定は「位置情報を利用できない環境」として扱う
#[derive(Debug, Clone)]
pub struct StaticLocationProvider {
    descriptor: Option<LocationDescriptor>,
}

impl StaticLocationProvider {
    pub fn new(descriptor: Option<LocationDescriptor>) -> Self {
        Self { descriptor }
    }
}

impl LocationProvider for StaticLocationProvider {
    async fn current_position(
        &self,
        _options: &FixOptions,
    ) -> Result<LocationDescriptor, LocationError> {
        self.descriptor.clone().ok_or(LocationError::Unsupported)
    }
}

/// 位置検証。取得結果・エラー文言・取得中フラグを保持する
pub struct LocationVerifier<P> {
    provider: P,
    options: FixOptions,
    location_data: Option<LocationDescriptor>,
    location_error: Option<String>,
    is_requesting: bool,
    fix_acquired_at: Option<Instant>,
    fix_tx: watch::Sender<bool>,
}

impl<P: LocationProvider> LocationVerifier<P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, FixOptions::default())
    }

    pub fn with_options(provider: P, options: FixOptions) -> Self {
        let (fix_tx, _) = watch::channel(false);
        Self {
            provider,
            options,
            location_data: None,
            location_error: None,
            is_requesting: false,
            fix_acquired_at: None,
            fix_tx,
        }
    }

    /// 「一度でも位置を取得できたか」の購読口（Connectivity Monitor 用）
    pub fn subscribe_fix(&self) -> watch::Receiver<bool> {
        self.fix_tx.subscribe()
    }

    /// maximum_age 以内に取得済みの座標
    pub fn cached(&self) -> Option<&LocationDescriptor> {
        match self.fix_acquired_at {
            Some(acquired) if acquired.elapsed() <= self.options.maximum_age => {
                self.location_data.as_ref()
            }
            _ => None,
        }
    }

    pub fn last_known(&self) -> Option<&LocationDescriptor> {
        self.location_data.as_ref()
    }

    pub fn location_error(&self) -> Option<&str> {
        self.location_error.as_deref()
    }

    pub fn is_requesting(&self) -> bool {
        self.is_requesting
    }

    /// 位置を 1 回取得する。新しい座標が不要なら取得済みの値を返す
    ///
    /// 呼び出しの重複排除はしない。Controller 側の loading ガードが
    /// 同時要求を発生させない前提
    pub async fn request_location(&mut self) -> Result<LocationDescriptor, LocationError> {
        if let Some(descriptor) = self.cached() {
            return Ok(descriptor.clone());
        }

        self.is_requesting = true;
        let attempt = tokio::time::timeout(
            self.options.timeout,
            self.provider.current_position(&self.options),
        )
        .await;
        self.is_requesting = false;

        let result = match attempt {
            Ok(inner) => inner,
            Err(_) => Err(LocationError::Timeout),
        };

        match result {
            Ok(descriptor) => {
                tracing::debug!(
                    accuracy_m = descriptor.accuracy_meters,
                    "location fix acquired"
                );
                self.location_data = Some(descriptor.clone());
                self.location_error = None;
                self.fix_acquired_at = Some(Instant::now());
                self.fix_tx.send_replace(true);
                Ok(descriptor)
            }
            Err(error) => {
                tracing::warn!(%error, "location fix failed");
                self.location_error = Some(error.to_string());
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        result: Result<LocationDescriptor, LocationError>,
    }

    impl LocationProvider for CountingProvider {
        async fn current_position(
            &self,
            _options: &FixOptions,
        ) -> Result<LocationDescriptor, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct NeverResolves;

    impl LocationProvider for NeverResolves {
        async fn current_position(
            &self,
            _options: &FixOptions,
        ) -> Result<LocationDescriptor, LocationError> {
            std::future::pending().await
        }
    }

    fn tokyo() -> LocationDescriptor {
        LocationDescriptor {
            latitude: 35.6812,
            longitude: 139.7671,
            accuracy_meters: 10.0,
        }
    }

    #[tokio::test]
    async fn fresh_fix_is_reused_within_maximum_age() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
            result: Ok(tokyo()),
        };
        let mut verifier = LocationVerifier::new(provider);

        verifier.request_location().await.unwrap();
        verifier.request_location().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(verifier.cached().is_some());
        assert!(verifier.location_error().is_none());
    }

    #[tokio::test]
    async fn failure_is_classified_and_message_stored() {
        let provider = CountingProvider {
            calls: Arc::new(AtomicUsize::new(0)),
            result: Err(LocationError::PermissionDenied),
        };
        let mut verifier = LocationVerifier::new(provider);

        let error = verifier.request_location().await.unwrap_err();
        assert_eq!(error, LocationError::PermissionDenied);
        assert_eq!(
            verifier.location_error(),
            Some("位置情報の利用が許可されていません")
        );
        assert!(verifier.cached().is_none());
        assert!(!verifier.is_requesting());
    }

    #[tokio::test]
    async fn hung_provider_maps_to_timeout() {
        let options = FixOptions {
            timeout: Duration::from_millis(10),
            ..FixOptions::default()
        };
        let mut verifier = LocationVerifier::with_options(NeverResolves, options);

        let error = verifier.request_location().await.unwrap_err();
        assert_eq!(error, LocationError::Timeout);
    }

    #[tokio::test]
    async fn missing_capability_rejects_immediately() {
        let mut verifier = LocationVerifier::new(StaticLocationProvider::new(None));
        let error = verifier.request_location().await.unwrap_err();
        assert_eq!(error, LocationError::Unsupported);
    }

    #[tokio::test]
    async fn fix_subscription_flips_once_acquired() {
        let mut verifier =
            LocationVerifier::new(StaticLocationProvider::new(Some(tokyo())));
        let fix_rx = verifier.subscribe_fix();
        assert!(!*fix_rx.borrow());

        verifier.request_location().await.unwrap();
        assert!(*fix_rx.borrow());
    }
}
