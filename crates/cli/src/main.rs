use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imgmirror_core::{
    load_config, load_env_file, scan_all, validate_config, DedupRegistry, DestinationLayout,
    Fetcher, HttpOrigin, MirrorPipeline, Origin, RecordSource, ShutdownController,
    SqliteRecordSource,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_CONFIG_PATH: &str = "etc/config.toml";
const DEFAULT_ENV_FILE: &str = "etc/.env";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Env file first: it may set RUST_LOG or IMGMIRROR_LOG_FORMAT
    let env_file = path_from_env("IMGMIRROR_ENV_FILE", DEFAULT_ENV_FILE);
    let env_loaded = load_env_file(&env_file);

    init_logging();
    info!("imgmirror {}", VERSION);

    env_loaded.with_context(|| format!("Failed to load env file {:?}", env_file))?;

    let config_path = path_from_env("IMGMIRROR_CONFIG", DEFAULT_CONFIG_PATH);
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Origin host: {}", config.origin_host);
    info!("Database path: {:?}", config.database.path);
    info!(
        "Mirroring into {:?} with {} workers",
        config.mirror.local_dest, config.mirror.pool_size
    );

    let source: Arc<dyn RecordSource> = Arc::new(
        SqliteRecordSource::open(&config.database.path)
            .context("Failed to open record database")?,
    );
    let origin: Arc<dyn Origin> =
        Arc::new(HttpOrigin::new(&config.mirror).context("Failed to create HTTP origin")?);
    info!("Using origin: {}", origin.name());

    let controller = ShutdownController::new();
    let signals = controller.listen_for_signals();

    let fetcher = Arc::new(Fetcher::new(origin, Arc::new(DedupRegistry::new())));
    let pipeline = MirrorPipeline::start(&config.mirror, fetcher, controller.token());

    // Scanners are synchronous (rusqlite) and feed the queue from a blocking thread
    let layout = DestinationLayout::from_config(&config);
    let submitter = pipeline.submitter();
    let cancel = controller.token();
    let scan = tokio::task::spawn_blocking(move || {
        scan_all(source.as_ref(), submitter, &layout, &cancel)
    });

    let scan_stats = match scan.await {
        Ok(stats) => stats,
        Err(e) => {
            error!("Record scan terminated abnormally: {}", e);
            controller.shutdown("record scan failed");
            Default::default()
        }
    };
    info!(
        records = scan_stats.records,
        skipped = scan_stats.skipped,
        submitted = scan_stats.submitted,
        rejected = scan_stats.rejected,
        "Record scan finished"
    );

    let report = pipeline.wait().await;
    signals.abort();

    let outcomes = report.outcomes;
    info!(
        success = outcomes.success,
        bytes = outcomes.bytes,
        already_exists = outcomes.skipped_exists,
        duplicate = outcomes.skipped_duplicate,
        not_found = outcomes.skipped_not_found,
        failed = outcomes.failed,
        discarded = report.forward.discarded,
        interrupted = controller.is_shutdown(),
        "Done"
    );

    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    if json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn json_logs() -> bool {
    std::env::var("IMGMIRROR_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn path_from_env(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_format_read_from_env_file() {
        // dotenvy never overrides a variable the shell already set
        if std::env::var_os("IMGMIRROR_LOG_FORMAT").is_some() {
            return;
        }
        let mut env_file = NamedTempFile::new().unwrap();
        writeln!(env_file, "IMGMIRROR_LOG_FORMAT=json").unwrap();

        assert!(!json_logs());
        load_env_file(env_file.path()).unwrap();
        assert!(json_logs());
    }

    #[test]
    fn test_path_from_env_default() {
        assert_eq!(
            path_from_env("IMGMIRROR_TEST_UNSET_PATH", DEFAULT_CONFIG_PATH),
            PathBuf::from("etc/config.toml")
        );
    }
}
