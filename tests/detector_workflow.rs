// tests/detector_workflow.rs

use rain_detector::notify::{Notification, Notifier};
use rain_detector::palette::JMA_NOWCAST_COLORS;
use rain_detector::{
    DetectorConfig, FileStateStore, GeoPoint, Outcome, PixelGrid, RainDetector, RainError, Result,
    Rgb, StateStore, TileIndex, TileProvider, TimeBucket,
};

use std::cell::RefCell;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

const SAPPORO: GeoPoint = GeoPoint {
    lat: 43.0621,
    lon: 141.3544,
};

/// 呼び出し側で色を切り替えられるタイル
struct WeatherProvider {
    color: Mutex<Rgb>,
}

impl WeatherProvider {
    fn new(color: Rgb) -> Self {
        Self {
            color: Mutex::new(color),
        }
    }

    fn set(&self, color: Rgb) {
        *self.color.lock().unwrap() = color;
    }
}

impl TileProvider for WeatherProvider {
    fn fetch(&self, _bucket: &TimeBucket, _tile: TileIndex) -> Result<PixelGrid> {
        Ok(PixelGrid::filled(256, 256, *self.color.lock().unwrap()))
    }
}

#[derive(Default)]
struct Outbox {
    sent: RefCell<Vec<Notification>>,
}

impl Notifier for Outbox {
    fn send(&self, notification: &Notification) -> Result<()> {
        self.sent.borrow_mut().push(notification.clone());
        Ok(())
    }
}

impl Outbox {
    fn last_outcome(&self) -> Option<Outcome> {
        self.sent.borrow().last().map(|n| n.outcome)
    }
}

fn bucket(s: &str) -> TimeBucket {
    s.parse().unwrap()
}

#[test]
fn test_full_rain_episode() {
    let temp_dir = TempDir::new().unwrap();
    let detector = RainDetector::new(DetectorConfig {
        state_dir: temp_dir.path().to_path_buf(),
        ..DetectorConfig::default()
    })
    .unwrap();
    let store = FileStateStore::new(&detector.config().state_dir, SAPPORO);
    let provider = WeatherProvider::new(JMA_NOWCAST_COLORS[1]);
    let outbox = Outbox::default();

    // 1. 晴れ、正時ではない -> 通知なし
    let summary = detector
        .run(SAPPORO, &bucket("202407011150"), &provider, &store, &outbox)
        .unwrap();
    assert_eq!(summary.notification, None);
    assert!(!store.path().exists());

    // 2. 雨が来た -> rain approaching、状態ファイル作成
    provider.set(JMA_NOWCAST_COLORS[5]);
    detector
        .run(SAPPORO, &bucket("202407011155"), &provider, &store, &outbox)
        .unwrap();
    assert_eq!(outbox.last_outcome(), Some(Outcome::RainApproaching));
    assert_eq!(fs::read_to_string(store.path()).unwrap(), "202407011155");

    // 3. 正時に降り続いている -> rain continues、状態更新
    detector
        .run(SAPPORO, &bucket("202407011200"), &provider, &store, &outbox)
        .unwrap();
    assert_eq!(outbox.last_outcome(), Some(Outcome::RainContinues));
    assert_eq!(store.read().unwrap(), Some(bucket("202407011200")));

    // 4. 正時以外の継続は黙って状態だけ更新
    detector
        .run(SAPPORO, &bucket("202407011205"), &provider, &store, &outbox)
        .unwrap();
    assert_eq!(outbox.sent.borrow().len(), 2);
    assert_eq!(store.read().unwrap(), Some(bucket("202407011205")));

    // 5. 止んだ -> rain stopped、状態ファイル削除
    provider.set(JMA_NOWCAST_COLORS[1]);
    detector
        .run(SAPPORO, &bucket("202407011210"), &provider, &store, &outbox)
        .unwrap();
    assert_eq!(outbox.last_outcome(), Some(Outcome::RainStopped));
    assert!(!store.path().exists());

    // 6. 次の正時 -> no rain
    detector
        .run(SAPPORO, &bucket("202407011300"), &provider, &store, &outbox)
        .unwrap();
    assert_eq!(outbox.last_outcome(), Some(Outcome::NoRain));
    assert_eq!(outbox.sent.borrow().len(), 4);
}

#[test]
fn test_insufficient_samples_leave_state_file_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let detector = RainDetector::new(DetectorConfig::default()).unwrap();
    let store = FileStateStore::new(temp_dir.path(), SAPPORO);
    store.write(&bucket("202407011150")).unwrap();

    // 凡例に無い色 (アンチエイリアス等) だけのタイル
    let provider = WeatherProvider::new(Rgb(250, 250, 250));
    let outbox = Outbox::default();

    let result = detector.run(SAPPORO, &bucket("202407011200"), &provider, &store, &outbox);

    assert!(matches!(result, Err(RainError::InsufficientSamples { .. })));
    assert_eq!(fs::read_to_string(store.path()).unwrap(), "202407011150");
    assert!(outbox.sent.borrow().is_empty());
}

#[test]
fn test_every_corner_of_the_region_can_be_sampled() {
    let detector = RainDetector::new(DetectorConfig::default()).unwrap();
    let provider = WeatherProvider::new(JMA_NOWCAST_COLORS[2]);

    for &(lat, lon) in &[(30.0, 130.0), (30.0, 150.0), (50.0, 130.0), (50.0, 150.0)] {
        let target = GeoPoint::operational(lat, lon).unwrap();
        let histograms = detector
            .sample(target, &bucket("202407011200"), &provider)
            .unwrap_or_else(|e| panic!("sampling ({}, {}) failed: {}", lat, lon, e));
        assert_eq!(histograms.inner.rain_ratio(), 1.0);
        assert_eq!(histograms.outer.rain_ratio(), 1.0);
    }
}
