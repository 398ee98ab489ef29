use std::fmt;

use crate::error::{RainError, Result};

/// 地球半径 (m)
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// 地球の半周 (m)。Web メルカトル平面の原点からの最大距離
pub const HALF_EARTH: f64 = std::f64::consts::PI * EARTH_RADIUS;

/// 対象地点として受け付ける緯度の範囲
pub const OPERATIONAL_LAT: (f64, f64) = (30.0, 50.0);

/// 対象地点として受け付ける経度の範囲
pub const OPERATIONAL_LON: (f64, f64) = (130.0, 150.0);

/// 緯度経度 (度)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// 監視対象として有効な地点か検証する
    ///
    /// 範囲外の座標ではタイルの取得も状態ファイルの読み書きも行わない。
    pub fn operational(lat: f64, lon: f64) -> Result<Self> {
        if !(OPERATIONAL_LAT.0..=OPERATIONAL_LAT.1).contains(&lat) {
            return Err(RainError::InvalidCoordinate(format!("invalid lat: {}", lat)));
        }
        if !(OPERATIONAL_LON.0..=OPERATIONAL_LON.1).contains(&lon) {
            return Err(RainError::InvalidCoordinate(format!("invalid lon: {}", lon)));
        }
        Ok(Self { lat, lon })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?}]", self.lat, self.lon)
    }
}

/// Web メルカトル平面上の座標 (m)。y は南向きが正
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

/// タイル番号とタイル内ピクセル位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAddress {
    pub zoom: u8,
    pub xt: i64,
    pub yt: i64,
    pub xf: u32,
    pub yf: u32,
}

impl TileAddress {
    pub fn index(&self) -> TileIndex {
        TileIndex {
            zoom: self.zoom,
            x: self.xt,
            y: self.yt,
        }
    }
}

/// 取得単位となるタイル (z/x/y)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub zoom: u8,
    pub x: i64,
    pub y: i64,
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// 両端を含むタイルの矩形範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub x_min: i64,
    pub x_max: i64,
    pub y_min: i64,
    pub y_max: i64,
}

impl TileRange {
    pub fn contains(&self, tile: &TileIndex) -> bool {
        tile.zoom == self.zoom
            && (self.x_min..=self.x_max).contains(&tile.x)
            && (self.y_min..=self.y_max).contains(&tile.y)
    }

    pub fn len(&self) -> usize {
        let cols = (self.x_max - self.x_min + 1).max(0) as usize;
        let rows = (self.y_max - self.y_min + 1).max(0) as usize;
        cols * rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// x 優先で範囲内の全タイルを列挙する
    pub fn tiles(&self) -> Vec<TileIndex> {
        let mut tiles = Vec::with_capacity(self.len());
        for x in self.x_min..=self.x_max {
            for y in self.y_min..=self.y_max {
                tiles.push(TileIndex {
                    zoom: self.zoom,
                    x,
                    y,
                });
            }
        }
        tiles
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// デコード済みのタイル画像 (行優先)
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgb>,
}

impl PixelGrid {
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Rgb {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Rgb) {
        self.pixels[(y * self.width + x) as usize] = color;
    }
}
