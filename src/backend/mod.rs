pub mod models;

use anyhow::{Context, Result};
use models::{PunchRequest, PunchResponse, PunchStatusResponse};
use serde::Deserialize;
use std::time::Duration;

/// IP 解決に使う外部サービス（ベストエフォート）
const IP_RESOLVER_URL: &str = "https://api.ipify.org?format=json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const IP_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// 勤怠バックエンドへの窓口。テストではフェイク実装に差し替える
#[allow(async_fn_in_trait)]
pub trait PunchBackend {
    /// 当日の打刻状況と休暇状態を取得する
    async fn fetch_punch_status(&self) -> Result<PunchStatusResponse>;

    /// 打刻ミューテーションを送信する
    async fn submit_punch(&self, request: &PunchRequest) -> Result<PunchResponse>;

    /// グローバル IP をベストエフォートで解決する
    async fn resolve_ip(&self) -> Result<String>;
}

/// 本番実装。認証トークンは任意（開発環境では未設定で動かす）
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, auth_token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

impl PunchBackend for ApiClient {
    async fn fetch_punch_status(&self) -> Result<PunchStatusResponse> {
        let url = self.endpoint("attendance/current-punch-status");
        let response = self
            .with_auth(self.http.get(&url))
            .send()
            .await
            .context("punch status request failed")?
            .error_for_status()
            .context("punch status request rejected")?;

        let status: PunchStatusResponse = response
            .json()
            .await
            .context("punch status response was not valid JSON")?;

        tracing::debug!(
            sessions = status.punches.len(),
            on_leave = status.is_user_on_leave.is_some(),
            "fetched punch status"
        );

        Ok(status)
    }

    async fn submit_punch(&self, request: &PunchRequest) -> Result<PunchResponse> {
        let url = self.endpoint("attendance/punch");
        let response = self
            .with_auth(self.http.post(&url))
            .json(request)
            .send()
            .await
            .context("punch request failed")?
            .error_for_status()
            .context("punch request rejected")?;

        response
            .json()
            .await
            .context("punch response was not valid JSON")
    }

    async fn resolve_ip(&self) -> Result<String> {
        let response = self
            .http
            .get(IP_RESOLVER_URL)
            .timeout(IP_RESOLVE_TIMEOUT)
            .send()
            .await
            .context("ip resolution request failed")?
            .error_for_status()
            .context("ip resolution request rejected")?;

        let body: IpResponse = response
            .json()
            .await
            .context("ip resolution response was not valid JSON")?;

        Ok(body.ip)
    }
}
