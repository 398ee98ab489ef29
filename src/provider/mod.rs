use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::ImageFormat;
use tracing::{debug, warn};

use crate::error::{RainError, Result};
use crate::model::{PixelGrid, Rgb, TileIndex};
use crate::time_bucket::TimeBucket;

/// タイル画像の取得元
///
/// 並列に呼ばれるので `Sync` が必要。
pub trait TileProvider: Sync {
    fn fetch(&self, bucket: &TimeBucket, tile: TileIndex) -> Result<PixelGrid>;
}

/// 気象庁のタイルサーバから HTTP で取得する
pub struct JmaTileProvider {
    client: reqwest::blocking::Client,
    url_template: String,
    tile_size: u32,
    archive_dir: Option<PathBuf>,
}

impl JmaTileProvider {
    pub fn new(url_template: &str, tile_size: u32) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("rain-detector/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url_template: url_template.to_string(),
            tile_size,
            archive_dir: None,
        })
    }

    /// 取得したタイルを `{bucket}_{z}_{x}_{y}.png` として保存する
    pub fn with_archive_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.archive_dir = dir;
        self
    }

    pub fn tile_url(&self, bucket: &TimeBucket, tile: TileIndex) -> String {
        render_url(&self.url_template, bucket, tile)
    }

    fn archive(&self, dir: &Path, bucket: &TimeBucket, tile: TileIndex, bytes: &[u8]) {
        let path = dir.join(format!("{}_{}_{}_{}.png", bucket, tile.zoom, tile.x, tile.y));
        let written = fs::create_dir_all(dir).and_then(|_| fs::write(&path, bytes));
        if let Err(e) = written {
            warn!("Failed to archive tile {:?}: {}", path, e);
        }
    }
}

impl TileProvider for JmaTileProvider {
    fn fetch(&self, bucket: &TimeBucket, tile: TileIndex) -> Result<PixelGrid> {
        let url = self.tile_url(bucket, tile);
        debug!("Fetching tile: {}", url);

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RainError::TileUnavailable {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes()?;
        if let Some(dir) = &self.archive_dir {
            self.archive(dir, bucket, tile, &bytes);
        }

        decode_png(&bytes, self.tile_size)
    }
}

pub fn render_url(template: &str, bucket: &TimeBucket, tile: TileIndex) -> String {
    template
        .replace("{bucket}", &bucket.to_string())
        .replace("{z}", &tile.zoom.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}

/// PNG をデコードして RGB のピクセル配列にする
///
/// アルファは捨てるので、透明ピクセルは下地の RGB 値 (通常は黒) になる。
pub fn decode_png(bytes: &[u8], tile_size: u32) -> Result<PixelGrid> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgb8();
    let (width, height) = img.dimensions();
    if width != tile_size || height != tile_size {
        return Err(RainError::TileSize {
            expected: tile_size,
            width,
            height,
        });
    }

    let pixels = img.pixels().map(|p| Rgb(p[0], p[1], p[2])).collect();
    Ok(PixelGrid {
        width,
        height,
        pixels,
    })
}
