use thiserror::Error;

pub type Result<T> = std::result::Result<T, RainError>;

/// 雨検知処理で発生するエラー
#[derive(Debug, Error)]
pub enum RainError {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Tile {url} returned {status}")]
    TileUnavailable { url: String, status: u16 },

    #[error("Tile request failed: {0}")]
    TileRequest(#[from] reqwest::Error),

    #[error("Failed to decode tile image: {0}")]
    TileDecode(#[from] image::ImageError),

    #[error("Unexpected tile size: expected {expected}x{expected}, got {width}x{height}")]
    TileSize {
        expected: u32,
        width: u32,
        height: u32,
    },

    #[error("Insufficient pixel number within {radius_km} km: {count} < {required}")]
    InsufficientSamples {
        radius_km: f64,
        count: u64,
        required: u64,
    },

    #[error("Corrupt state file {path}: {content:?}")]
    CorruptState { path: String, content: String },

    #[error("Invalid time bucket: {0}")]
    InvalidTimeBucket(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to send notification: {0}")]
    Notify(String),
}

impl From<toml::de::Error> for RainError {
    fn from(err: toml::de::Error) -> Self {
        RainError::Config(err.to_string())
    }
}
