use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;

use crate::decision::Thresholds;
use crate::error::{RainError, Result};

pub const JMA_TILE_URL_TEMPLATE: &str = "https://www.jma.go.jp/bosai/jmatile/data/nowc/{bucket}00/none/{bucket}00/surf/hrpns/{z}/{x}/{y}.png";

/// 時計のずれとして受け付ける最大値 (1 日)
pub const MAX_CLOCK_OFFSET_MINUTES: i64 = 24 * 60;

/// 検知処理の設定
///
/// TOML ファイルで一部だけ指定した場合、残りは既定値になる。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub inner_radius_km: f64,
    pub outer_radius_km: f64,
    pub zoom: u8,
    pub tile_size: u32,
    /// 1 km² あたりに必要な分類済みピクセル数
    pub density_floor: f64,
    pub onset_ratio: f64,
    pub clear_ratio: f64,
    /// 壁時計から引く分数 (JST→UTC の 9 時間 + 配信遅延 2 分)
    pub clock_offset_minutes: i64,
    pub tile_url_template: String,
    pub state_dir: PathBuf,
    /// 指定すると取得したタイル画像を保存する
    pub archive_dir: Option<PathBuf>,
    pub mail: MailConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            inner_radius_km: 5.0,
            outer_radius_km: 20.0,
            zoom: 8,
            tile_size: 256,
            density_floor: 10.0,
            onset_ratio: 0.10,
            clear_ratio: 0.01,
            clock_offset_minutes: 9 * 60 + 2,
            tile_url_template: JMA_TILE_URL_TEMPLATE.to_string(),
            state_dir: PathBuf::from("."),
            archive_dir: None,
            mail: MailConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from: String,
    pub to: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "example.com".to_string(),
            smtp_port: 25,
            from: "from@example.com".to_string(),
            to: "to@example.com".to_string(),
        }
    }
}

impl DetectorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: DetectorConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.inner_radius_km > 0.0
            && self.inner_radius_km < self.outer_radius_km
            && self.outer_radius_km.is_finite())
        {
            return Err(RainError::Config(format!(
                "radii must satisfy 0 < inner ({}) < outer ({})",
                self.inner_radius_km, self.outer_radius_km
            )));
        }
        if !(1..=20).contains(&self.zoom) {
            return Err(RainError::Config(format!("zoom out of range: {}", self.zoom)));
        }
        if self.tile_size == 0 {
            return Err(RainError::Config("tile_size must be positive".to_string()));
        }
        for (name, ratio) in [("onset_ratio", self.onset_ratio), ("clear_ratio", self.clear_ratio)] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(RainError::Config(format!("{} must be within [0, 1]: {}", name, ratio)));
            }
        }
        // NaN を通すと密度チェックが常に成立してしまう
        if !(self.density_floor.is_finite() && self.density_floor >= 0.0) {
            return Err(RainError::Config(format!(
                "density_floor must be a finite non-negative number: {}",
                self.density_floor
            )));
        }
        if self.clock_offset_minutes.unsigned_abs() > MAX_CLOCK_OFFSET_MINUTES.unsigned_abs() {
            return Err(RainError::Config(format!(
                "clock_offset_minutes must be within ±{}: {}",
                MAX_CLOCK_OFFSET_MINUTES, self.clock_offset_minutes
            )));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            onset_ratio: self.onset_ratio,
            clear_ratio: self.clear_ratio,
        }
    }

    pub fn clock_offset(&self) -> Duration {
        Duration::minutes(self.clock_offset_minutes)
    }
}
