use roadsim_cli::config::{AppConfig, LogFormat};
use roadsim_pipeline::{DemoRun, FfmpegVideoSink};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "roadsim_cli=info,roadsim_pipeline=info,roadsim_db=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }

    tracing::info!(
        days = config.demo.days,
        duration_secs = config.demo.duration_secs,
        fps = config.demo.fps,
        width = config.demo.width,
        height = config.demo.height,
        output = %config.demo.run_path().display(),
        "Generating demo data"
    );

    let pool = roadsim_db::create_pool(&config.database_url).await?;
    roadsim_db::health_check(&pool).await?;
    roadsim_db::run_migrations(&pool).await?;
    tracing::info!(database_url = %config.database_url, "Database ready");

    let mut sink = FfmpegVideoSink::new(&config.ffmpeg_bin);
    let summary = DemoRun::new(config.demo).execute(&pool, &mut sink).await?;

    tracing::info!(
        seed = summary.seed,
        batches = summary.records.batches,
        tracks_per_batch = summary.tracks,
        ground_truth_frames = summary.records.ground_truth_frames,
        stills = summary.stills_written,
        video = %summary.video_path.display(),
        "Demo video, stills and ground-truth labels generated"
    );
    Ok(())
}
