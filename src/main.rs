use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use review_analyzer::{
    analysis::AnalysisOrchestrator,
    analyzers::{GeminiExtractor, HeuristicExtractor, HuggingFaceSentiment, KeyPointExtractor},
    config::Config,
    server::{self, AppState},
    storage::SqliteStore,
};

/// Product review analysis service
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Host to bind, overriding the HOST environment variable
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding the PORT environment variable
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database path, overriding DATABASE_PATH
    #[arg(long)]
    database: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(database) = args.database {
        config.database.path = database;
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Review Analyzer starting..."
    );

    // Initialize storage
    let store = match SqliteStore::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            Arc::new(s)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    // Initialize analyzers
    let sentiment = match HuggingFaceSentiment::new(&config.sentiment) {
        Ok(c) => {
            info!(
                base_url = %config.sentiment.base_url,
                model = %config.sentiment.model,
                "Sentiment analyzer initialized"
            );
            Arc::new(c)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize sentiment analyzer");
            return Err(e.into());
        }
    };

    let keypoints: Arc<dyn KeyPointExtractor> = if config.keypoints.api_key.is_some() {
        match GeminiExtractor::new(&config.keypoints) {
            Ok(c) => {
                info!(
                    base_url = %config.keypoints.base_url,
                    model = %config.keypoints.model,
                    "Key point extractor initialized"
                );
                Arc::new(c)
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize key point extractor");
                return Err(e.into());
            }
        }
    } else {
        info!("No key point API key configured; using heuristic extraction");
        Arc::new(HeuristicExtractor::new())
    };

    let orchestrator = AnalysisOrchestrator::new(
        sentiment,
        keypoints,
        Duration::from_millis(config.sentiment.timeout_ms),
        Duration::from_millis(config.keypoints.timeout_ms),
    );

    // Create application state and serve
    let state = Arc::new(AppState::new(config, store, orchestrator));

    if let Err(e) = server::serve(state).await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        review_analyzer::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        review_analyzer::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
