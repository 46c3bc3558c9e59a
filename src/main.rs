use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use ledger_audit::app::AuditService;
use ledger_audit::config::{Config, DEFAULT_CONFIG_PATH};
use ledger_audit::infra::GeminiRecommender;
use ledger_audit::invocation;
use ledger_audit::logging;
use ledger_audit::pipeline::detector::AnomalyDetector;
use ledger_audit::pipeline::worker::FitPool;
use ledger_audit::server::{self, AppState};

#[derive(Parser)]
#[command(name = "ledger_audit")]
#[command(about = "Ledger CSV audit service: balance check, anomaly detection and recommendations")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on, overriding config and PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Audit a local CSV file and print the response
    Analyze {
        /// Ledger file with items, debit and credit columns
        file: PathBuf,
    },
    /// Handle one serverless invocation event read from stdin
    Invoke,
}

fn build_service(config: &Config) -> anyhow::Result<Arc<AuditService>> {
    let recommender = GeminiRecommender::new(&config.recommendations)
        .context("Failed to build recommendation client")?;
    let pool = match config.server.fit_workers {
        Some(workers) => FitPool::new(workers),
        None => FitPool::with_available_parallelism(),
    };
    info!(fit_workers = pool.capacity(), "Audit service ready");

    Ok(Arc::new(AuditService::new(
        AnomalyDetector::new(config.detector.clone()),
        pool,
        Arc::new(recommender),
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load_from(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let _log_guard = logging::init_logging(&config.logging);

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let state = AppState {
                service: build_service(&config)?,
            };
            server::start_server(state, &config.server).await?;
        }
        Commands::Analyze { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let service = build_service(&config)?;
            let report = service.audit(&file_name, &bytes).await?;

            println!("{}", serde_json::to_string_pretty(&report.response)?);
            println!("\n{} ({} rows)", report.summary, report.rows);
        }
        Commands::Invoke => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read invocation event from stdin")?;

            let state = AppState {
                service: build_service(&config)?,
            };
            let router = server::create_router(state, &config.server);
            let result = invocation::handle_raw(router, &raw).await?;
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}
