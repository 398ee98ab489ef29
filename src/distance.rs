use crate::model::{GeoPoint, EARTH_RADIUS};

/// 2 地点間の大圏距離 (m)。球面余弦定理による
pub fn distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let (lat1, lat2) = (p1.lat.to_radians(), p2.lat.to_radians());
    let dlon = (p1.lon - p2.lon).to_radians();

    // sin·sin + cos·cos·cos(Δλ) と同値。同一地点でちょうど 1 になる形に変形している
    let cos_angle = (lat1 - lat2).cos() - lat1.cos() * lat2.cos() * (1.0 - dlon.cos());
    EARTH_RADIUS * cos_angle.clamp(-1.0, 1.0).acos()
}
