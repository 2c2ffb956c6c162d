// crates/si_foundation/src/time.rs

//! 时间工具
//!
//! - [`Timestamp`]: 观测时刻（UTC）
//! - [`TimeRange`]: 半开时间区间 `[start, end)`
//! - [`parse_duration`]: 解析 `"6h"`、`"30m"`、`"2d"` 形式的时长

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SiError, SiResult};

/// 观测时刻
pub type Timestamp = DateTime<Utc>;

/// 半开时间区间 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// 起始时刻（包含）
    pub start: Timestamp,
    /// 结束时刻（不包含）
    pub end: Timestamp,
}

impl TimeRange {
    /// 创建区间，要求 `start < end`
    pub fn new(start: Timestamp, end: Timestamp) -> SiResult<Self> {
        if start >= end {
            return Err(SiError::invalid_input(format!(
                "time range start {} must precede end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// 是否包含时刻 t
    #[inline]
    pub fn contains(&self, t: Timestamp) -> bool {
        t >= self.start && t < self.end
    }

    /// 区间时长
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// 解析时长字符串
///
/// 支持的后缀：`s`（秒）、`m`/`min`（分）、`h`（时）、`d`（天）、`w`（周）。
/// 不带后缀的整数按秒解释，`"0"` 表示零时长。
pub fn parse_duration(input: &str) -> SiResult<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return Err(SiError::parse(input, "empty duration"));
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    if number.is_empty() {
        return Err(SiError::parse(input, "missing numeric value"));
    }
    let value: i64 = number
        .parse()
        .map_err(|e: std::num::ParseIntError| SiError::parse(input, e.to_string()))?;

    let duration = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "sec" => Duration::try_seconds(value),
        "m" | "min" => Duration::try_minutes(value),
        "h" | "hr" => Duration::try_hours(value),
        "d" | "day" | "days" => Duration::try_days(value),
        "w" => Duration::try_weeks(value),
        other => {
            return Err(SiError::parse(
                input,
                format!("unknown duration unit '{}'", other),
            ))
        }
    };
    duration.ok_or_else(|| SiError::parse(input, "duration out of range"))
}
