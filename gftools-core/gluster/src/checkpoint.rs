//! 异地复制检查点
//!
//! 比较 stime 扩展属性记录的最后同步时间与检查点时间：
//! stime 严格晚于检查点时间才算完成

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone};

use crate::error::{GlusterError, Result};
use crate::models::{CheckpointStatus, Stime};

/// 检查点时间格式（本地时间）
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 解析检查点时间
///
/// 接受 `now`（忽略大小写）或 `%Y-%m-%d %H:%M:%S` 格式的本地时间
pub fn parse_target_time(value: &str) -> Result<DateTime<Local>> {
    let value = value.trim();

    if value.eq_ignore_ascii_case("now") {
        return Ok(Local::now());
    }

    let naive = NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| GlusterError::InvalidTime(value.to_string()))?;

    match Local.from_local_datetime(&naive) {
        LocalResult::Single(time) => Ok(time),
        // 夏令时回拨时取较早的时间
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(GlusterError::InvalidTime(value.to_string())),
    }
}

/// 将 stime 转换为本地时间
pub fn stime_to_local(stime: Stime) -> Result<DateTime<Local>> {
    Local
        .timestamp_opt(i64::from(stime.secs), stime.nsecs)
        .single()
        .ok_or_else(|| GlusterError::StimeUnavailable(format!("无效的 stime: {:?}", stime)))
}

/// 以 `%Y-%m-%d %H:%M:%S` 格式输出本地时间
pub fn human_time(time: &DateTime<Local>) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// 计算检查点状态
pub fn evaluate(stime: Stime, target: &DateTime<Local>) -> Result<CheckpointStatus> {
    let synced = stime_to_local(stime)?;

    Ok(CheckpointStatus {
        last_synced_time: human_time(&synced),
        target_time: human_time(target),
        completed: synced > *target,
    })
}

impl CheckpointStatus {
    /// 面向用户的一行描述
    pub fn message(&self) -> String {
        let state = if self.completed {
            "completed"
        } else {
            "not completed"
        };
        format!(
            "Checkpoint {} as on {}, last synced time is {}",
            state, self.target_time, self.last_synced_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(value: &str) -> DateTime<Local> {
        parse_target_time(value).unwrap()
    }

    #[test]
    fn test_parse_target_time() {
        let time = local("2014-07-22 15:30:45");
        assert_eq!(human_time(&time), "2014-07-22 15:30:45");

        assert!(parse_target_time("NOW").is_ok());
        assert!(parse_target_time(" now ").is_ok());
    }

    #[test]
    fn test_parse_target_time_invalid() {
        for value in ["", "yesterday", "2014-07-22", "2014/07/22 15:30:45", "2014-13-01 00:00:00"] {
            assert!(
                matches!(parse_target_time(value), Err(GlusterError::InvalidTime(_))),
                "{:?} 应解析失败",
                value
            );
        }
    }

    #[test]
    fn test_evaluate_completed() {
        let target = local("2014-07-22 15:30:45");
        let stime = Stime::new(target.timestamp() as u32 + 60, 0);

        let status = evaluate(stime, &target).unwrap();
        assert!(status.completed);
        assert_eq!(status.target_time, "2014-07-22 15:30:45");
        assert_eq!(status.last_synced_time, "2014-07-22 15:31:45");
        assert_eq!(
            status.message(),
            "Checkpoint completed as on 2014-07-22 15:30:45, last synced time is 2014-07-22 15:31:45"
        );
    }

    #[test]
    fn test_evaluate_strictly_later() {
        let target = local("2014-07-22 15:30:45");
        let secs = target.timestamp() as u32;

        // 相等不算完成
        assert!(!evaluate(Stime::new(secs, 0), &target).unwrap().completed);
        // 纳秒部分晚于目标即完成
        assert!(evaluate(Stime::new(secs, 1), &target).unwrap().completed);
        assert!(!evaluate(Stime::new(secs - 1, 999_999_999), &target).unwrap().completed);
    }

    #[test]
    fn test_evaluate_invalid_nsecs() {
        let target = local("2014-07-22 15:30:45");
        let err = evaluate(Stime::new(0x53ce39e5, u32::MAX), &target).unwrap_err();
        assert!(matches!(err, GlusterError::StimeUnavailable(_)));
    }

    #[test]
    fn test_not_completed_message() {
        let target = local("2014-07-22 15:30:45");
        let status = evaluate(Stime::new(target.timestamp() as u32 - 3600, 0), &target).unwrap();

        assert!(!status.completed);
        assert!(status.message().starts_with("Checkpoint not completed as on 2014-07-22 15:30:45"));
    }

    #[test]
    fn test_status_json() {
        let status = CheckpointStatus {
            last_synced_time: "2014-07-22 15:31:45".to_string(),
            target_time: "2014-07-22 15:30:45".to_string(),
            completed: true,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["completed"], true);
        assert_eq!(json["last_synced_time"], "2014-07-22 15:31:45");
    }
}
