use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// 現在時刻の供給源。テストでは固定クロックに差し替える
pub trait ClockSource: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// バックエンドから届く打刻時刻文字列を絶対時刻に変換する
///
/// 時刻のみ（HH:MM:SS / HH:MM）は `today` のその時刻として解釈する。
/// 解釈できない値は None（集計から除外するだけで、エラーにはしない）
pub fn parse_timestamp(raw: &str, today: NaiveDate) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M:%S") {
        return local_datetime(today.and_time(time));
    }

    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return local_datetime(today.and_time(time));
    }

    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return local_datetime(datetime);
    }

    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return local_datetime(datetime);
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.with_timezone(&Local));
    }

    None
}

fn local_datetime(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    // DST 切り替えで曖昧な時刻は早い方を採用
    Local.from_local_datetime(&naive).earliest()
}
