//! 1 回分の検知処理
//!
//! タイル範囲の決定 → 取得と集計 (並列) → 密度チェック → 状態読み込み →
//! 判定 → 状態更新 → 通知、の順に進む。途中で失敗した場合は状態を
//! 変更せずにエラーを返す。

use chrono::Local;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::decision::{decide, Decision};
use crate::error::{RainError, Result};
use crate::histogram::{scan_tile, BandHistograms, SampleBands};
use crate::model::GeoPoint;
use crate::notify::{Notification, Notifier, RainReport};
use crate::palette::Palette;
use crate::provider::TileProvider;
use crate::region::select_tiles;
use crate::state::StateStore;
use crate::time_bucket::TimeBucket;

/// 判定まで到達した実行の結果
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub report: RainReport,
    pub decision: Decision,
    pub notification: Option<Notification>,
}

pub struct RainDetector {
    config: DetectorConfig,
    palette: Palette,
}

impl RainDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            palette: Palette::default(),
        })
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// 現在時刻に対応するタイルの世代
    pub fn current_bucket(&self) -> TimeBucket {
        TimeBucket::from_wall_clock(Local::now().naive_local(), self.config.clock_offset())
    }

    /// 対象地点周辺のタイルを取得して 2 つの半径で集計する
    pub fn sample<P>(&self, target: GeoPoint, bucket: &TimeBucket, provider: &P) -> Result<BandHistograms>
    where
        P: TileProvider + ?Sized,
    {
        let config = &self.config;
        let range = select_tiles(target, config.outer_radius_km, config.zoom, config.tile_size);
        info!(
            "Sampling {} tiles at z{}: x {}..={}, y {}..={}",
            range.len(),
            range.zoom,
            range.x_min,
            range.x_max,
            range.y_min,
            range.y_max
        );

        let bands = SampleBands {
            target,
            inner_m: config.inner_radius_km * 1000.0,
            outer_m: config.outer_radius_km * 1000.0,
        };
        let categories = self.palette.len();

        // 1 枚でも取得できなければその時点で打ち切る
        let histograms = range
            .tiles()
            .par_iter()
            .map(|&tile| -> Result<BandHistograms> {
                let grid = provider.fetch(bucket, tile)?;
                if grid.width != config.tile_size || grid.height != config.tile_size {
                    return Err(RainError::TileSize {
                        expected: config.tile_size,
                        width: grid.width,
                        height: grid.height,
                    });
                }
                let partial = scan_tile(&grid, tile, &bands, &self.palette);
                debug!(
                    "Scanned tile {}: inner {} px, outer {} px",
                    tile,
                    partial.inner.total(),
                    partial.outer.total()
                );
                Ok(partial)
            })
            .try_reduce(|| BandHistograms::new(categories), |a, b| Ok(a.merge(&b)))?;

        histograms.check_density(config.inner_radius_km, config.outer_radius_km, config.density_floor)?;
        Ok(histograms)
    }

    /// 検知から通知までを 1 回実行する
    pub fn run<P, S, N>(
        &self,
        target: GeoPoint,
        bucket: &TimeBucket,
        provider: &P,
        store: &S,
        notifier: &N,
    ) -> Result<RunSummary>
    where
        P: TileProvider + ?Sized,
        S: StateStore + ?Sized,
        N: Notifier + ?Sized,
    {
        let target = GeoPoint::operational(target.lat, target.lon)?;
        info!("Rain detector started for {}, {}", target, bucket);

        let histograms = self.sample(target, bucket, provider)?;
        let report = RainReport {
            target,
            bucket: *bucket,
            inner_radius_km: self.config.inner_radius_km,
            outer_radius_km: self.config.outer_radius_km,
            inner: histograms.inner,
            outer: histograms.outer,
        };
        info!("{}", report.body());

        let last_rain = store.read()?;
        if let Some(last) = &last_rain {
            info!("Latest rain recorded at {}", last);
        }

        let decision = decide(
            report.inner.rain_ratio(),
            report.outer.rain_ratio(),
            last_rain.as_ref(),
            bucket,
            &self.config.thresholds(),
        );
        if let Some(elapsed) = decision.since_last_rain {
            debug!("{} minutes since latest rain", elapsed.num_minutes());
        }

        store.apply(&decision.transition)?;
        debug!("State transition applied: {:?}", decision.transition);

        let notification = decision.outcome.map(|outcome| Notification::new(outcome, &report));
        match &notification {
            Some(n) => notifier.send(n)?,
            None => info!("No notification for {}", bucket),
        }

        Ok(RunSummary {
            report,
            decision,
            notification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{Outcome, StateTransition};
    use crate::model::{PixelGrid, Rgb, TileIndex};
    use crate::palette::JMA_NOWCAST_COLORS;
    use crate::state::MemoryStateStore;
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TOKYO: GeoPoint = GeoPoint {
        lat: 35.6812,
        lon: 139.7671,
    };

    /// 全タイルを同じ色で返す
    struct UniformProvider {
        color: Rgb,
        calls: AtomicUsize,
    }

    impl UniformProvider {
        fn new(color: Rgb) -> Self {
            Self {
                color,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TileProvider for UniformProvider {
        fn fetch(&self, _bucket: &TimeBucket, _tile: TileIndex) -> Result<PixelGrid> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PixelGrid::filled(256, 256, self.color))
        }
    }

    struct UnavailableProvider;

    impl TileProvider for UnavailableProvider {
        fn fetch(&self, _bucket: &TimeBucket, tile: TileIndex) -> Result<PixelGrid> {
            Err(RainError::TileUnavailable {
                url: format!("https://tiles.invalid/{}.png", tile),
                status: 404,
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: RefCell<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, notification: &Notification) -> Result<()> {
            self.sent.borrow_mut().push(notification.clone());
            Ok(())
        }
    }

    fn bucket(s: &str) -> TimeBucket {
        s.parse().unwrap()
    }

    fn detector() -> RainDetector {
        RainDetector::new(DetectorConfig::default()).unwrap()
    }

    #[test]
    fn test_rain_everywhere_starts_episode() {
        let provider = UniformProvider::new(JMA_NOWCAST_COLORS[6]);
        let store = MemoryStateStore::default();
        let notifier = RecordingNotifier::default();
        let now = bucket("202407011235");

        let summary = detector().run(TOKYO, &now, &provider, &store, &notifier).unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(summary.decision.outcome, Some(Outcome::RainApproaching));
        assert_eq!(store.current(), Some(now));
        let sent = notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "rain approaching at 202407011235");
    }

    #[test]
    fn test_clear_sky_ends_episode() {
        let provider = UniformProvider::new(JMA_NOWCAST_COLORS[1]);
        let store = MemoryStateStore::new(Some(bucket("202407011220")));
        let notifier = RecordingNotifier::default();

        let summary = detector()
            .run(TOKYO, &bucket("202407011235"), &provider, &store, &notifier)
            .unwrap();

        assert_eq!(summary.decision.transition, StateTransition::Delete);
        assert_eq!(store.current(), None);
        assert_eq!(notifier.sent.borrow()[0].outcome, Outcome::RainStopped);
    }

    #[test]
    fn test_quiet_run_sends_nothing() {
        let provider = UniformProvider::new(JMA_NOWCAST_COLORS[0]);
        let store = MemoryStateStore::default();
        let notifier = RecordingNotifier::default();

        let summary = detector()
            .run(TOKYO, &bucket("202407011235"), &provider, &store, &notifier)
            .unwrap();

        assert_eq!(summary.notification, None);
        assert!(notifier.sent.borrow().is_empty());
        assert_eq!(store.mutations(), 0);
    }

    #[test]
    fn test_unavailable_tile_aborts_without_state_change() {
        let store = MemoryStateStore::new(Some(bucket("202407011220")));
        let notifier = RecordingNotifier::default();

        let result = detector().run(TOKYO, &bucket("202407011235"), &UnavailableProvider, &store, &notifier);

        assert!(matches!(result, Err(RainError::TileUnavailable { status: 404, .. })));
        assert_eq!(store.mutations(), 0);
        assert!(notifier.sent.borrow().is_empty());
    }

    #[test]
    fn test_insufficient_samples_aborts_without_state_change() {
        // 凡例に無い色だけのタイル
        let provider = UniformProvider::new(Rgb(10, 20, 30));
        let store = MemoryStateStore::new(Some(bucket("202407011220")));
        let notifier = RecordingNotifier::default();

        let result = detector().run(TOKYO, &bucket("202407011300"), &provider, &store, &notifier);

        assert!(matches!(result, Err(RainError::InsufficientSamples { count: 0, .. })));
        assert_eq!(store.mutations(), 0);
        assert_eq!(store.current(), Some(bucket("202407011220")));
        assert!(notifier.sent.borrow().is_empty());
    }

    #[test]
    fn test_invalid_target_does_no_work() {
        let provider = UniformProvider::new(JMA_NOWCAST_COLORS[6]);
        let store = MemoryStateStore::default();
        let notifier = RecordingNotifier::default();

        let result = detector().run(
            GeoPoint::new(51.5, -0.12),
            &bucket("202407011235"),
            &provider,
            &store,
            &notifier,
        );

        assert!(matches!(result, Err(RainError::InvalidCoordinate(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.mutations(), 0);
    }

    #[test]
    fn test_sample_spans_multiple_tiles_at_higher_zoom() {
        let config = DetectorConfig {
            zoom: 10,
            ..DetectorConfig::default()
        };
        let detector = RainDetector::new(config).unwrap();
        let provider = UniformProvider::new(JMA_NOWCAST_COLORS[1]);

        let histograms = detector.sample(TOKYO, &bucket("202407011235"), &provider).unwrap();

        assert!(provider.calls.load(Ordering::SeqCst) > 1);
        assert_eq!(histograms.outer.rain(), 0);
        assert!(histograms.inner.total() < histograms.outer.total());
    }
}
