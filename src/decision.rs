//! 雨の降り始め・継続・降り止みの判定
//!
//! 判定は純粋関数で、永続化された状態への反映は呼び出し側が
//! [`StateTransition`] に従って行う。

use std::fmt;

use chrono::Duration;

use crate::time_bucket::TimeBucket;

/// 通知の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    RainApproaching,
    RainContinues,
    RainStopped,
    NoRain,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::RainApproaching => "rain approaching",
            Outcome::RainContinues => "rain continues",
            Outcome::RainStopped => "rain stopped",
            Outcome::NoRain => "no rain",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 永続化された状態に対する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransition {
    Keep,
    Write(TimeBucket),
    Delete,
}

/// 判定のしきい値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// 内側の降水割合がこれ以上なら降雨中
    pub onset_ratio: f64,
    /// 外側の降水割合がこれ未満なら降り止み
    pub clear_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            onset_ratio: 0.10,
            clear_ratio: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub outcome: Option<Outcome>,
    pub transition: StateTransition,
    /// 前回降雨を記録してからの経過時間
    pub since_last_rain: Option<Duration>,
}

/// 降水割合と前回の状態から通知と状態遷移を決める
///
/// | 内側 | 外側 | 状態 | 正時 | 通知 | 状態 |
/// |---|---|---|---|---|---|
/// | ≥ onset | - | なし | - | rain approaching | 書き込み |
/// | ≥ onset | - | あり | ○ | rain continues | 書き込み |
/// | ≥ onset | - | あり | × | なし | 書き込み |
/// | < onset | < clear | あり | - | rain stopped | 削除 |
/// | その他 | | | ○ | no rain | そのまま |
/// | その他 | | | × | なし | そのまま |
pub fn decide(
    inner_ratio: f64,
    outer_ratio: f64,
    last_rain: Option<&TimeBucket>,
    now: &TimeBucket,
    thresholds: &Thresholds,
) -> Decision {
    let since_last_rain = last_rain.map(|last| now.since(last));

    let (outcome, transition) = if inner_ratio >= thresholds.onset_ratio {
        let outcome = match last_rain {
            None => Some(Outcome::RainApproaching),
            Some(_) if now.is_on_the_hour() => Some(Outcome::RainContinues),
            Some(_) => None,
        };
        (outcome, StateTransition::Write(*now))
    } else if outer_ratio < thresholds.clear_ratio && last_rain.is_some() {
        (Some(Outcome::RainStopped), StateTransition::Delete)
    } else if now.is_on_the_hour() {
        (Some(Outcome::NoRain), StateTransition::Keep)
    } else {
        (None, StateTransition::Keep)
    };

    Decision {
        outcome,
        transition,
        since_last_rain,
    }
}
