pub mod controller;
pub mod ticker;

use crate::backend::models::PunchSession;
use serde::Serialize;

/// 打刻状態。保存はせず、常にセッション一覧から導出する
///
/// NotPunched と PunchedOut はどちらも「勤務していない」だが、
/// 前者は本日まだ一度も打刻が無いことを表すため表示上は区別する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchStatus {
    NotPunched,
    PunchedIn,
    PunchedOut,
}

impl PunchStatus {
    /// 末尾のセッションだけ見れば十分（進行中セッションは高々 1 件で必ず末尾）
    pub fn derive(sessions: &[PunchSession]) -> Self {
        match sessions.last() {
            None => PunchStatus::NotPunched,
            Some(last) if last.is_open() => PunchStatus::PunchedIn,
            Some(_) => PunchStatus::PunchedOut,
        }
    }
}

/// 打刻直後に表示する監査スナップショット。クライアント側には永続化しない
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub resolved_ip_address: String,
    pub location_accuracy_label: String,
    pub captured_at_local_string: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// 周辺 UI（トースト等）へ渡す通知
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// 通知の届け先。本体はトースト表示、ヘッドレス運用ではログに流す
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!("{}", notice.message),
            NoticeLevel::Warning => tracing::warn!("{}", notice.message),
            NoticeLevel::Error => tracing::error!("{}", notice.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(start: &str, end: Option<&str>) -> PunchSession {
        PunchSession {
            start_time: start.to_string(),
            end_time: end.map(|e| e.to_string()),
            start_location: None,
            end_location: None,
        }
    }

    #[test]
    fn empty_list_means_not_punched() {
        assert_eq!(PunchStatus::derive(&[]), PunchStatus::NotPunched);
    }

    #[test]
    fn trailing_open_session_means_punched_in() {
        let sessions = vec![
            session("09:00:00", Some("12:00:00")),
            session("13:00:00", None),
        ];
        assert_eq!(PunchStatus::derive(&sessions), PunchStatus::PunchedIn);
    }

    #[test]
    fn trailing_closed_session_means_punched_out() {
        let sessions = vec![session("09:00:00", Some("17:30:00"))];
        assert_eq!(PunchStatus::derive(&sessions), PunchStatus::PunchedOut);
    }
}
