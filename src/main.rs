//! scholarguard - Journal & Conference Legitimacy Checker
//!
//! Aggregates evidence from cached predatory lists, vetted lists, ranked
//! lists, and retraction data into one risk verdict per venue.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! scholarguard assess "Nature" --issn 0028-0836 --data-dir ./data
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! scholarguard serve --port 3000 --data-dir ./data
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use clap::{Parser, Subcommand};
use scholarguard::assess::Assessor;
use scholarguard::assessment::AssessmentResult;
use scholarguard::backend::RegisteredBackend;
use scholarguard::backends::{BinaryListBackend, RankedListBackend, RetractionBackend};
use scholarguard::enrich::{NullVolume, PublicationLookup};
use scholarguard::evidence::EvidenceKind;
use scholarguard::openalex::OpenAlexVolumeClient;
use scholarguard::store::{ListEntry, RankEntry, RetractionRecord, Snapshot};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Journal & Conference Legitimacy Checker
#[derive(Parser)]
#[command(name = "scholarguard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess one journal or conference
    Assess {
        /// Venue name as it appears on the publication
        name: String,

        /// ISSN, if known (e.g. 0028-0836)
        #[arg(long)]
        issn: Option<String>,

        /// Directory holding the list snapshots written by the ETL jobs
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Skip the OpenAlex volume lookup (count thresholds only)
        #[arg(long)]
        offline: bool,

        /// Whole-assessment deadline in seconds
        #[arg(long, default_value = "15")]
        timeout: u64,

        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory holding the list snapshots written by the ETL jobs
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Skip the OpenAlex volume lookup
        #[arg(long)]
        offline: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Assess {
            name,
            issn,
            data_dir,
            offline,
            timeout,
            json,
        } => run_assess(name, issn, data_dir, offline, timeout, json).await,
        Commands::Serve {
            port,
            host,
            data_dir,
            offline,
        } => run_server(host, port, data_dir, offline).await,
    }
}

// ============================================================================
// Registry Construction
// ============================================================================

/// Snapshot files the ETL jobs leave behind, with the backend each feeds.
/// Missing files just skip their backend; at least one must load.
fn build_registry(data_dir: &Path) -> Result<Vec<RegisteredBackend>> {
    let mut backends: Vec<RegisteredBackend> = Vec::new();

    let predatory_path = data_dir.join("predatory.json");
    if predatory_path.exists() {
        let snapshot: Snapshot<ListEntry> =
            Snapshot::load_json(&predatory_path).context("Failed to load predatory.json")?;
        backends.push(RegisteredBackend::new(Arc::new(
            BinaryListBackend::new(
                "predatory-list",
                EvidenceKind::Predatory,
                1.0,
                Arc::new(snapshot),
            )
            .context("Invalid predatory-list backend")?,
        )));
    } else {
        warn!(path = %predatory_path.display(), "Snapshot missing, backend skipped");
    }

    let vetted_path = data_dir.join("vetted.json");
    if vetted_path.exists() {
        let snapshot: Snapshot<ListEntry> =
            Snapshot::load_json(&vetted_path).context("Failed to load vetted.json")?;
        backends.push(RegisteredBackend::new(Arc::new(
            BinaryListBackend::new(
                "vetted-list",
                EvidenceKind::Legitimate,
                0.9,
                Arc::new(snapshot),
            )
            .context("Invalid vetted-list backend")?,
        )));
    } else {
        warn!(path = %vetted_path.display(), "Snapshot missing, backend skipped");
    }

    let rankings_path = data_dir.join("rankings.json");
    if rankings_path.exists() {
        let snapshot: Snapshot<RankEntry> =
            Snapshot::load_json(&rankings_path).context("Failed to load rankings.json")?;
        backends.push(RegisteredBackend::new(Arc::new(
            RankedListBackend::new("core-rankings", 0.8, Arc::new(snapshot))
                .context("Invalid core-rankings backend")?,
        )));
    } else {
        warn!(path = %rankings_path.display(), "Snapshot missing, backend skipped");
    }

    let retractions_path = data_dir.join("retractions.json");
    if retractions_path.exists() {
        let snapshot: Snapshot<RetractionRecord> =
            Snapshot::load_json(&retractions_path).context("Failed to load retractions.json")?;
        backends.push(RegisteredBackend::new(Arc::new(
            RetractionBackend::new("retraction-watch", 0.7, Arc::new(snapshot))
                .context("Invalid retraction-watch backend")?,
        )));
    } else {
        warn!(path = %retractions_path.display(), "Snapshot missing, backend skipped");
    }

    if backends.is_empty() {
        anyhow::bail!(
            "No snapshot files found in {:?}; run the data-download jobs first",
            data_dir
        );
    }

    info!(backends = backends.len(), "Backend registry ready");
    Ok(backends)
}

fn build_volume_lookup(offline: bool) -> Result<Arc<dyn PublicationLookup>> {
    if offline {
        info!("Offline mode: publication-volume lookup disabled");
        Ok(Arc::new(NullVolume))
    } else {
        Ok(Arc::new(
            OpenAlexVolumeClient::new().context("Failed to build OpenAlex client")?,
        ))
    }
}

// ============================================================================
// Assess Command
// ============================================================================

async fn run_assess(
    name: String,
    issn: Option<String>,
    data_dir: PathBuf,
    offline: bool,
    timeout: u64,
    json: bool,
) -> Result<()> {
    let backends = build_registry(&data_dir)?;
    let volume = build_volume_lookup(offline)?;
    let assessor =
        Assessor::new(backends, volume).with_global_timeout(Duration::from_secs(timeout));

    let result = assessor
        .assess(&name, issn.as_deref())
        .await
        .context("Assessment failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    Ok(())
}

fn print_summary(result: &AssessmentResult) {
    println!();
    println!(
        "Assessed:   {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("Venue:      {}", result.identity.raw_name.trim());
    if let Some(issn) = &result.identity.issn {
        println!("ISSN:       {}", issn);
    }
    println!(
        "Verdict:    {} (confidence {:.2})",
        result.verdict.as_str(),
        result.confidence
    );

    if !result.reasons.is_empty() {
        println!("\nReasons:");
        for reason in &result.reasons {
            println!("  - {}", reason);
        }
    }
    if !result.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &result.warnings {
            println!("  ! {}", warning);
        }
    }
    if !result.failed_backends.is_empty() {
        println!(
            "\nNot checked (backend failures): {}",
            result.failed_backends.join(", ")
        );
    }
    println!("\nElapsed: {} ms", result.elapsed.as_millis());
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(host: String, port: u16, data_dir: PathBuf, offline: bool) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let backends = build_registry(&data_dir)?;
    let volume = build_volume_lookup(offline)?;
    let app_state = Arc::new(AppState {
        assessor: Assessor::new(backends, volume),
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/assess", post(assess_handler))
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

struct AppState {
    assessor: Assessor,
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Assess request body
#[derive(Debug, Deserialize)]
struct AssessRequest {
    name: String,
    issn: Option<String>,
}

/// Assess response
#[derive(Debug, Serialize)]
struct AssessResponse {
    status: String,
    result: Option<AssessmentResult>,
}

/// Assess endpoint handler
async fn assess_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AssessRequest>,
) -> Json<AssessResponse> {
    info!(name = %req.name, issn = req.issn.as_deref().unwrap_or("-"), "Assess request");

    match state.assessor.assess(&req.name, req.issn.as_deref()).await {
        Ok(result) => Json(AssessResponse {
            status: "success".to_string(),
            result: Some(result),
        }),
        Err(e) => {
            error!(error = %e, "Assessment failed");
            Json(AssessResponse {
                status: format!("error: {}", e),
                result: None,
            })
        }
    }
}
