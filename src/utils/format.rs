use crate::backend::models::{LeaveStatus, LocationDescriptor};
use crate::punch::PunchStatus;

/// 経過秒数を HH:MM:SS 形式に整形する
///
/// 負数は "00:00:00" に丸める。時間の桁に上限はない（24h 超もそのまま表示）
pub fn format_seconds(total_seconds: i64) -> String {
    if total_seconds <= 0 {
        return "00:00:00".to_string();
    }

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// 打刻状態の表示ラベル（状態未取得は None）
pub fn status_label(status: Option<PunchStatus>) -> &'static str {
    match status {
        None => "状態不明",
        Some(PunchStatus::NotPunched) => "未出勤",
        Some(PunchStatus::PunchedIn) => "勤務中",
        Some(PunchStatus::PunchedOut) => "退勤済み",
    }
}

/// 休暇情報の表示ラベル（種別と期間）
pub fn leave_label(leave: &LeaveStatus) -> String {
    format!(
        "{}（{} 〜 {}）",
        leave.leave_type, leave.from_date, leave.to_date
    )
}

/// 位置精度の表示ラベル。位置情報なしでも打刻自体は通るため専用文言を返す
pub fn accuracy_label(location: Option<&LocationDescriptor>) -> String {
    match location {
        Some(descriptor) => format!("±{:.0}m", descriptor.accuracy_meters),
        None => "位置情報なし".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero_padded() {
        assert_eq!(format_seconds(0), "00:00:00");
        assert_eq!(format_seconds(59), "00:00:59");
        assert_eq!(format_seconds(60), "00:01:00");
        assert_eq!(format_seconds(3600), "01:00:00");
        assert_eq!(format_seconds(3661), "01:01:01");
    }

    #[test]
    fn clamps_negative_to_zero() {
        assert_eq!(format_seconds(-1), "00:00:00");
        assert_eq!(format_seconds(i64::MIN), "00:00:00");
    }

    #[test]
    fn hours_field_has_no_upper_bound() {
        // 24時間超のセッションもそのまま表示する
        assert_eq!(format_seconds(25 * 3600), "25:00:00");
        assert_eq!(format_seconds(100 * 3600 + 59), "100:00:59");
    }

    #[test]
    fn round_trips_through_split() {
        // HH:MM:SS を分解して秒に戻すと元の値になる
        let mut n: i64 = 0;
        while n < 10_000_000 {
            let formatted = format_seconds(n);
            let parts: Vec<i64> = formatted
                .split(':')
                .map(|p| p.parse().unwrap())
                .collect();
            assert_eq!(parts.len(), 3);
            assert_eq!(parts[0] * 3600 + parts[1] * 60 + parts[2], n);
            n += 7919; // 全件は冗長なので素数刻みでサンプリング
        }
        let formatted = format_seconds(9_999_999);
        let parts: Vec<i64> = formatted.split(':').map(|p| p.parse().unwrap()).collect();
        assert_eq!(parts[0] * 3600 + parts[1] * 60 + parts[2], 9_999_999);
    }

    #[test]
    fn accuracy_label_covers_missing_location() {
        let descriptor = LocationDescriptor {
            latitude: 35.0,
            longitude: 139.0,
            accuracy_meters: 12.4,
        };
        assert_eq!(accuracy_label(Some(&descriptor)), "±12m");
        assert_eq!(accuracy_label(None), "位置情報なし");
    }

    #[test]
    fn status_labels_are_distinct() {
        let labels = [
            status_label(None),
            status_label(Some(PunchStatus::NotPunched)),
            status_label(Some(PunchStatus::PunchedIn)),
            status_label(Some(PunchStatus::PunchedOut)),
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in labels.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
