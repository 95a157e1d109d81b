//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use orgnet::adapters::import::CsvImporter;
use orgnet::adapters::persistence::SqliteRepo;
use orgnet::adapters::ui::tui::{TuiInputPort, TuiSettings};
use orgnet::ports::{CommunicationStore, InputPort, MetricsRepo, TeamRegistry};
use orgnet::shared::config::AppConfig;
use orgnet::usecases::{NetworkAnalyzer, ReportService, ThreeEsCalculator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    orgnet::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "using default configuration");
        AppConfig::default()
    });

    let data_path = cfg.data_dir_or_default();
    let data_dir_abs = data_path
        .canonicalize()
        .unwrap_or_else(|_| data_path.clone());
    info!(path = %data_dir_abs.display(), "data directory");

    let sqlite_repo = Arc::new(
        SqliteRepo::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    let store: Arc<dyn CommunicationStore> = Arc::clone(&sqlite_repo) as Arc<dyn CommunicationStore>;
    let metrics: Arc<dyn MetricsRepo> = Arc::clone(&sqlite_repo) as Arc<dyn MetricsRepo>;
    let registry: Arc<dyn TeamRegistry> = Arc::clone(&sqlite_repo) as Arc<dyn TeamRegistry>;

    // --- Services ---
    let window_days = cfg.window_days_or_default();
    info!(window_days, "default calculation window");
    let calculator = Arc::new(
        ThreeEsCalculator::new(Arc::clone(&store), Arc::clone(&metrics))
            .with_window_days(window_days),
    );
    let analyzer = Arc::new(NetworkAnalyzer::new(Arc::clone(&store)));
    let reports_dir = cfg.reports_dir_or_default();
    info!(path = %reports_dir.display(), "reports directory");
    let reports = Arc::new(ReportService::new(reports_dir));
    let importer = Arc::new(CsvImporter::new(Arc::clone(&registry)));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        registry,
        store,
        metrics,
        calculator,
        analyzer,
        reports,
        importer,
        TuiSettings {
            window_days,
            history_limit: cfg.history_limit_or_default(),
            persist_metrics: cfg.persist_metrics_or_default(),
        },
    ));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
