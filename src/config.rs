use crate::backend::models::LocationDescriptor;
use crate::punch::controller::EngineConfig;
use anyhow::Result;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub require_location: bool,
    pub tick_interval_ms: u64,
    pub user_agent: String,
    pub wifi_ssid: Option<String>,
    /// ヘッドレス環境用の固定座標（位置情報 API の代替）
    pub fixed_latitude: Option<f64>,
    pub fixed_longitude: Option<f64>,
    pub fixed_accuracy_meters: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_base_url = env::var("KINTAI_API_BASE_URL")
            .map_err(|_| anyhow::anyhow!("KINTAI_API_BASE_URL environment variable is required"))?;

        let auth_token = env::var("KINTAI_AUTH_TOKEN").ok();

        let require_location = env::var("KINTAI_REQUIRE_LOCATION")
            .map(|value| value != "0" && !value.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        let tick_interval_ms = env::var("KINTAI_TICK_INTERVAL_MS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(1000);

        let user_agent = env::var("KINTAI_USER_AGENT")
            .unwrap_or_else(|_| format!("kintai-engine/{}", env!("CARGO_PKG_VERSION")));

        let wifi_ssid = env::var("KINTAI_WIFI_SSID").ok();

        let fixed_latitude = env::var("KINTAI_FIXED_LAT")
            .ok()
            .and_then(|value| value.parse().ok());
        let fixed_longitude = env::var("KINTAI_FIXED_LNG")
            .ok()
            .and_then(|value| value.parse().ok());
        let fixed_accuracy_meters = env::var("KINTAI_FIXED_ACCURACY_M")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(50.0);

        Ok(Config {
            api_base_url,
            auth_token,
            require_location,
            tick_interval_ms,
            user_agent,
            wifi_ssid,
            fixed_latitude,
            fixed_longitude,
            fixed_accuracy_meters,
        })
    }

    /// 固定座標が両方そろっていれば位置記述子として返す
    pub fn fixed_location(&self) -> Option<LocationDescriptor> {
        match (self.fixed_latitude, self.fixed_longitude) {
            (Some(latitude), Some(longitude)) => Some(LocationDescriptor {
                latitude,
                longitude,
                accuracy_meters: self.fixed_accuracy_meters,
            }),
            _ => None,
        }
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            require_location: self.require_location,
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            user_agent: self.user_agent.clone(),
            wifi_ssid: self.wifi_ssid.clone(),
        }
    }
}
