use crate::backend::models::PunchSession;
use crate::utils::time::parse_timestamp;
use chrono::{DateTime, Local};

/// セッション一覧と基準時刻 `now` から総稼働秒数を算出する
///
/// - 開始・終了が両方解釈でき、終了 > 開始 の場合のみ閉区間として加算
/// - 終了が無い進行中セッションは max(0, now - 開始) を加算
/// - 解釈できない記録は警告ログを残してスキップ（合計を壊さない）
///
/// 進行中セッションが高々 1 件なら、`now` の前進に対して結果は単調非減少
pub fn aggregate_seconds(sessions: &[PunchSession], now: DateTime<Local>) -> i64 {
    let today = now.date_naive();
    let mut total: i64 = 0;

    for session in sessions {
        let Some(start) = parse_timestamp(&session.start_time, today) else {
            tracing::warn!(
                start_time = %session.start_time,
                "skipping punch session with unparseable start time"
            );
            continue;
        };

        match &session.end_time {
            Some(raw_end) => {
                let Some(end) = parse_timestamp(raw_end, today) else {
                    tracing::warn!(
                        end_time = %raw_end,
                        "skipping punch session with unparseable end time"
                    );
                    continue;
                };
                let seconds = end.signed_duration_since(start).num_seconds();
                if seconds > 0 {
                    total += seconds;
                } else {
                    tracing::warn!(
                        start_time = %session.start_time,
                        end_time = %raw_end,
                        "skipping punch session with non-positive duration"
                    );
                }
            }
            None => {
                // 進行中セッション。now が開始前なら 0 扱い
                let seconds = now.signed_duration_since(start).num_seconds();
                total += seconds.max(0);
            }
        }
    }

    total
}
