//! 緯度経度・球面 Web メルカトル・タイル座標の相互変換
//!
//! 気象庁ナウキャストのタイルは球面メルカトル (半径 6378137 m) の
//! 標準的なタイルピラミッドで配信されている。

use std::f64::consts::PI;

use crate::model::{GeoPoint, ProjectedPoint, TileAddress, EARTH_RADIUS, HALF_EARTH};

/// ズームレベルにおけるタイル 1 枚の一辺 (m)
pub fn tile_span(zoom: u8) -> f64 {
    HALF_EARTH / 2f64.powi(i32::from(zoom) - 1)
}

/// 緯度経度を投影座標に変換する
///
/// 緯度が ±90° に近づくと発散する。
pub fn geo_to_projected(p: GeoPoint) -> ProjectedPoint {
    let x = p.lon * HALF_EARTH / 180.0;
    let y = -((p.lat + 90.0) * PI / 360.0).tan().ln() * EARTH_RADIUS;
    ProjectedPoint { x, y }
}

/// 投影座標を緯度経度に戻す (`geo_to_projected` の逆変換)
pub fn projected_to_geo(p: ProjectedPoint) -> GeoPoint {
    let lon = p.x * 180.0 / HALF_EARTH;
    let lat = 90.0 - (p.y * PI / HALF_EARTH).exp().atan() * 360.0 / PI;
    GeoPoint { lat, lon }
}

/// 投影座標を含むタイルとタイル内のピクセル位置を求める
pub fn projected_to_tile(p: ProjectedPoint, zoom: u8, tile_size: u32) -> TileAddress {
    let span = tile_span(zoom);
    let xt = (p.x + HALF_EARTH) / span;
    let yt = (p.y + HALF_EARTH) / span;
    let xi = xt.floor();
    let yi = yt.floor();
    let size = f64::from(tile_size);

    TileAddress {
        zoom,
        xt: xi as i64,
        yt: yi as i64,
        xf: ((size * (xt - xi)) as u32).min(tile_size - 1),
        yf: ((size * (yt - yi)) as u32).min(tile_size - 1),
    }
}

/// タイル座標 (小数可) の左上隅の投影座標
pub fn tile_to_projected(xt: f64, yt: f64, zoom: u8) -> ProjectedPoint {
    let span = tile_span(zoom);
    ProjectedPoint {
        x: xt * span - HALF_EARTH,
        y: yt * span - HALF_EARTH,
    }
}

/// タイル座標 (小数可) を緯度経度に変換する
///
/// `xt + xp / tile_size` のように渡せばピクセル単位の位置が得られる。
pub fn tile_to_geo(xt: f64, yt: f64, zoom: u8) -> GeoPoint {
    projected_to_geo(tile_to_projected(xt, yt, zoom))
}

pub fn geo_to_tile(p: GeoPoint, zoom: u8, tile_size: u32) -> TileAddress {
    projected_to_tile(geo_to_projected(p), zoom, tile_size)
}
