use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, Timelike};

use crate::error::{RainError, Result};

const FORMAT: &str = "%Y%m%d%H%M";

/// タイルの世代を表す 5 分刻みの時刻 (`YYYYMMDDHHMM`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBucket(NaiveDateTime);

impl TimeBucket {
    pub const INTERVAL_MINUTES: u32 = 5;

    /// 壁時計の時刻から `offset` を引き、5 分単位に切り捨てる
    ///
    /// 既定の 9 時間 2 分は JST から UTC への変換と配信遅延の見込み分。
    pub fn from_wall_clock(now: NaiveDateTime, offset: Duration) -> Self {
        Self::floor(now - offset)
    }

    pub fn floor(time: NaiveDateTime) -> Self {
        let minute = time.minute() - time.minute() % Self::INTERVAL_MINUTES;
        let floored = time
            .with_minute(minute)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(time);
        Self(floored)
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// 正時 (分が 00) かどうか
    pub fn is_on_the_hour(&self) -> bool {
        self.0.minute() == 0
    }

    pub fn since(&self, earlier: &TimeBucket) -> Duration {
        self.0 - earlier.0
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl FromStr for TimeBucket {
    type Err = RainError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.len() != 12 {
            return Err(RainError::InvalidTimeBucket(s.to_string()));
        }
        let time = NaiveDateTime::parse_from_str(trimmed, FORMAT)
            .map_err(|_| RainError::InvalidTimeBucket(s.to_string()))?;
        // 5 分刻みでない値は丸めずに拒否する
        if time.minute() % Self::INTERVAL_MINUTES != 0 {
            return Err(RainError::InvalidTimeBucket(s.to_string()));
        }
        Ok(Self(time))
    }
}
