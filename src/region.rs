use crate::mercator::geo_to_tile;
use crate::model::{GeoPoint, TileRange, EARTH_RADIUS};

/// 対象地点から半径 `radius_km` の円を覆うタイル範囲を求める
///
/// 半径を緯度方向の角度に換算し、経度方向は `cos(lat)` で補正した
/// 矩形の北西端と南東端をタイル番号に変換する。
pub fn select_tiles(target: GeoPoint, radius_km: f64, zoom: u8, tile_size: u32) -> TileRange {
    let lat_half = radius_km * 1000.0 / (EARTH_RADIUS * std::f64::consts::PI / 2.0) * 90.0;
    let lon_half = lat_half / target.lat.to_radians().cos();

    let north_west = geo_to_tile(
        GeoPoint::new(target.lat + lat_half, target.lon - lon_half),
        zoom,
        tile_size,
    );
    let south_east = geo_to_tile(
        GeoPoint::new(target.lat - lat_half, target.lon + lon_half),
        zoom,
        tile_size,
    );

    TileRange {
        zoom,
        x_min: north_west.xt,
        x_max: south_east.xt,
        y_min: north_west.yt,
        y_max: south_east.yt,
    }
}
