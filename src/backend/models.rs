use serde::{Deserialize, Deserializer, Serialize};

/// 出勤〜退勤の 1 ペア。時刻はバックエンドの生文字列のまま保持する
///
/// サーバ側の実装差で "HH:MM:SS" と完全な日時が混在するため、
/// 解釈は集計時（utils::aggregator）に行う
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunchSession {
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(
        rename = "startLocation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub start_location: Option<LocationDescriptor>,
    #[serde(
        rename = "endLocation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub end_location: Option<LocationDescriptor>,
}

impl PunchSession {
    /// endTime が無い = 進行中セッション
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDescriptor {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
}

/// 休暇状態。存在する場合は PunchStatus に関わらず打刻を抑止する
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveStatus {
    pub leave_type: String,
    pub from_date: String,
    pub to_date: String,
}

/// GET current-punch-status のレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct PunchStatusResponse {
    #[serde(default)]
    pub punches: Vec<PunchSession>,
    /// サーバ側が計算した参考値。クライアントは自前で再集計する
    #[serde(default)]
    pub total_production_time: String,
    #[serde(
        rename = "isUserOnLeave",
        default,
        deserialize_with = "deserialize_leave"
    )]
    pub is_user_on_leave: Option<LeaveStatus>,
}

/// isUserOnLeave は「休暇中でない」を JSON の false で表現してくる
fn deserialize_leave<'de, D>(deserializer: D) -> Result<Option<LeaveStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawLeave {
        Flag(bool),
        Status(LeaveStatus),
    }

    match Option::<RawLeave>::deserialize(deserializer)? {
        Some(RawLeave::Status(status)) => Ok(Some(status)),
        Some(RawLeave::Flag(_)) | None => Ok(None),
    }
}

/// POST punch のリクエストボディ。位置・IP・指紋は監査用メタデータ
#[derive(Debug, Clone, Serialize)]
pub struct PunchRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub accuracy: Option<f64>,
    pub ip: String,
    pub wifi_ssid: String,
    /// DeviceFingerprint を JSON 文字列化したもの
    pub device_fingerprint: String,
    pub user_agent: String,
    /// ISO-8601
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PunchResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl PunchResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_leave_false_as_none() {
        let json = r#"{
            "punches": [],
            "total_production_time": "00:00:00",
            "isUserOnLeave": false
        }"#;
        let response: PunchStatusResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_user_on_leave.is_none());
        assert!(response.punches.is_empty());
    }

    #[test]
    fn deserializes_leave_object() {
        let json = r#"{
            "punches": [{"startTime": "09:00:00"}],
            "total_production_time": "00:30:00",
            "isUserOnLeave": {
                "leaveType": "Sick Leave",
                "fromDate": "2024-01-01",
                "toDate": "2024-01-01"
            }
        }"#;
        let response: PunchStatusResponse = serde_json::from_str(json).unwrap();
        let leave = response.is_user_on_leave.unwrap();
        assert_eq!(leave.leave_type, "Sick Leave");
        assert_eq!(leave.from_date, "2024-01-01");
    }

    #[test]
    fn missing_optional_fields_default() {
        let response: PunchStatusResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(response.punches.is_empty());
        assert!(response.is_user_on_leave.is_none());
        assert_eq!(response.total_production_time, "");
    }

    #[test]
    fn session_open_when_end_time_absent() {
        let json = r#"{"startTime": "09:00:00"}"#;
        let session: PunchSession = serde_json::from_str(json).unwrap();
        assert!(session.is_open());

        let json = r#"{"startTime": "09:00:00", "endTime": "17:30:00"}"#;
        let session: PunchSession = serde_json::from_str(json).unwrap();
        assert!(!session.is_open());
    }

    #[test]
    fn location_descriptor_uses_camel_case() {
        let json = r#"{"latitude": 35.68, "longitude": 139.76, "accuracyMeters": 8.5}"#;
        let descriptor: LocationDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.accuracy_meters, 8.5);
    }
}
