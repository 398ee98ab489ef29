//! 距離で絞り込んだピクセルの色カテゴリ集計
//!
//! タイルごとに内側 (既定 5 km) と外側 (既定 20 km) の 2 つの
//! ヒストグラムを作り、加算で統合する。加算は可換かつ結合的なので
//! タイルを処理する順番は結果に影響しない。

use crate::distance::distance;
use crate::error::{RainError, Result};
use crate::mercator::tile_to_geo;
use crate::model::{GeoPoint, PixelGrid, TileIndex};
use crate::palette::{Palette, FIRST_RAIN_CATEGORY};

/// カテゴリごとのピクセル数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn new(categories: usize) -> Self {
        Self {
            counts: vec![0; categories],
        }
    }

    pub fn increment(&mut self, category: usize) {
        self.counts[category] += 1;
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn rain(&self) -> u64 {
        self.counts.iter().skip(FIRST_RAIN_CATEGORY).sum()
    }

    /// 分類済みピクセルのうち降水カテゴリの割合。空なら 0
    pub fn rain_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.rain() as f64 / total as f64
    }

    pub fn merge(&mut self, other: &Histogram) {
        if self.counts.len() < other.counts.len() {
            self.counts.resize(other.counts.len(), 0);
        }
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
    }
}

/// 集計対象の中心と 2 つの半径 (m)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleBands {
    pub target: GeoPoint,
    pub inner_m: f64,
    pub outer_m: f64,
}

/// 内側・外側のヒストグラムの組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandHistograms {
    pub inner: Histogram,
    pub outer: Histogram,
}

impl BandHistograms {
    pub fn new(categories: usize) -> Self {
        Self {
            inner: Histogram::new(categories),
            outer: Histogram::new(categories),
        }
    }

    pub fn merge(mut self, other: &BandHistograms) -> Self {
        self.inner.merge(&other.inner);
        self.outer.merge(&other.outer);
        self
    }

    /// 1 km² あたり `floor` ピクセル以上が分類できたか確認する
    pub fn check_density(&self, inner_km: f64, outer_km: f64, floor: f64) -> Result<()> {
        for (histogram, radius_km) in [(&self.inner, inner_km), (&self.outer, outer_km)] {
            let count = histogram.total();
            let required = floor * radius_km * radius_km;
            if (count as f64) < required {
                return Err(RainError::InsufficientSamples {
                    radius_km,
                    count,
                    required: required.ceil() as u64,
                });
            }
        }
        Ok(())
    }
}

/// 1 枚のタイルの全ピクセルを走査して集計する
///
/// 各ピクセルの左上隅の緯度経度から中心までの距離を測り、
/// 内側・外側それぞれの半径未満であれば独立に数える。
pub fn scan_tile(
    grid: &PixelGrid,
    tile: TileIndex,
    bands: &SampleBands,
    palette: &Palette,
) -> BandHistograms {
    let mut result = BandHistograms::new(palette.len());
    let size = f64::from(grid.width);

    for yp in 0..grid.height {
        for xp in 0..grid.width {
            let geo = tile_to_geo(
                tile.x as f64 + f64::from(xp) / size,
                tile.y as f64 + f64::from(yp) / size,
                tile.zoom,
            );
            let d = distance(bands.target, geo);
            let in_inner = d < bands.inner_m;
            let in_outer = d < bands.outer_m;
            if !in_inner && !in_outer {
                continue;
            }

            let Some(category) = palette.classify(grid.get(xp, yp)) else {
                continue;
            };
            if in_inner {
                result.inner.increment(category);
            }
            if in_outer {
                result.outer.increment(category);
            }
        }
    }

    result
}
