use anyhow::Result;
use clap::Parser;
use rain_detector::notify::{LogNotifier, SmtpNotifier};
use rain_detector::{
    DetectorConfig, FileStateStore, GeoPoint, JmaTileProvider, MemoryStateStore, RainDetector,
    StateStore,
};
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 対象地点の緯度 (30〜50)
    #[arg(value_name = "LAT")]
    lat: f64,

    /// 対象地点の経度 (130〜150)
    #[arg(value_name = "LON")]
    lon: f64,

    /// 設定ファイル (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 状態ファイルを置くディレクトリ
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// 取得したタイル画像の保存先
    #[arg(long, value_name = "DIR")]
    archive_dir: Option<PathBuf>,

    /// 並列処理スレッド数（デフォルト: CPUコア数）
    #[arg(short, long)]
    threads: Option<usize>,

    /// 状態を更新せず、メールも送らない
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    // ログの初期化
    tracing_subscriber::fmt::init();

    // CLI引数の解析
    let args = Args::parse();

    // 座標の検証（範囲外なら何もせず終了）
    let target = GeoPoint::operational(args.lat, args.lon)?;

    let start_time = std::time::Instant::now();

    // スレッドプールの設定
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new().num_threads(threads).build_global()?;
    }

    // 設定の読み込み（引数で上書き）
    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_file(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(dir) = args.state_dir {
        config.state_dir = dir;
    }
    if args.archive_dir.is_some() {
        config.archive_dir = args.archive_dir;
    }

    let detector = RainDetector::new(config)?;
    let config = detector.config();
    let bucket = detector.current_bucket();

    let provider = JmaTileProvider::new(&config.tile_url_template, config.tile_size)?
        .with_archive_dir(config.archive_dir.clone());
    let file_store = FileStateStore::new(&config.state_dir, target);

    let summary = if args.dry_run {
        info!("Dry run: state file {:?} will not be modified", file_store.path());
        let store = MemoryStateStore::new(file_store.read()?);
        detector.run(target, &bucket, &provider, &store, &LogNotifier)?
    } else {
        let notifier = SmtpNotifier::new(&config.mail)?;
        detector.run(target, &bucket, &provider, &file_store, &notifier)?
    };

    match &summary.notification {
        Some(n) => info!("Notified: {}", n.subject),
        None => info!("Mail has not been sent"),
    }

    // 処理時間を表示
    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    Ok(())
}
