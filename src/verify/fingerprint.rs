use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// 指紋計算の入力となるホスト環境のスナップショット
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentSnapshot {
    pub user_agent: String,
    pub screen_dimensions: String,
    pub time_zone: String,
    pub locale: String,
    pub renderer: String,
}

impl EnvironmentSnapshot {
    /// 実行環境から観測できる値を集める。取れない値は "unknown"
    pub fn capture(user_agent: &str) -> Self {
        let locale = std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_else(|_| "unknown".to_string());

        let time_zone = std::env::var("TZ")
            .unwrap_or_else(|_| Local::now().offset().to_string());

        Self {
            user_agent: user_agent.to_string(),
            screen_dimensions: "unknown".to_string(),
            time_zone,
            locale,
            renderer: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

/// 打刻リクエストに添付する監査用の端末記述子
///
/// 一意性の保証には使わない。アクセス制御の入力にもしない
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFingerprint {
    pub user_agent: String,
    pub screen_dimensions: String,
    pub time_zone: String,
    pub locale: String,
    pub rendering_signature: String,
    pub captured_at: String,
}

/// 環境スナップショットから指紋を計算する
///
/// 同じスナップショットに対しては常に同じ署名になる（決定的）
pub fn compute_fingerprint(
    env: &EnvironmentSnapshot,
    captured_at: DateTime<Local>,
) -> DeviceFingerprint {
    let mut hasher = DefaultHasher::new();
    env.hash(&mut hasher);
    let rendering_signature = format!("{:016x}", hasher.finish());

    DeviceFingerprint {
        user_agent: env.user_agent.clone(),
        screen_dimensions: env.screen_dimensions.clone(),
        time_zone: env.time_zone.clone(),
        locale: env.locale.clone(),
        rendering_signature,
        captured_at: captured_at.to_rfc3339(),
    }
}
