use anyhow::Result;
use clap::Parser;
use facesort_vision::OnnxFaceSource;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod recorder;
mod report;
mod runner;
mod scan;

use config::{PolicyOverrides, RunConfig};

#[derive(Parser)]
#[command(name = "facesort", about = "Match event photos to guest selfies", version)]
struct Cli {
    /// Event directory containing selfies/ and photos/
    event_path: PathBuf,
    /// Base match tolerance (maximum distance)
    #[arg(long)]
    tolerance: Option<f32>,
    /// Required gap between best and second-best guest distance
    #[arg(long)]
    margin: Option<f32>,
    /// TOML policy file (defaults overridden per key)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Directory holding the ONNX models (or set FACESORT_MODEL_DIR)
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,
    /// Disable the precise recheck of borderline accepts
    #[arg(long)]
    no_recheck: bool,
    /// Disable the second-pass bootstrap refinement
    #[arg(long)]
    no_bootstrap: bool,
    /// Ranked guests to include in reject logs
    #[arg(long)]
    top_candidates: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let run_config = RunConfig::assemble(
        cli.event_path,
        cli.config.as_deref(),
        cli.model_dir,
        PolicyOverrides {
            tolerance: cli.tolerance,
            margin: cli.margin,
            top_candidates: cli.top_candidates,
            disable_recheck: cli.no_recheck,
            disable_bootstrap: cli.no_bootstrap,
        },
    )?;

    tracing::info!(
        event = %run_config.event_path.display(),
        model_dir = %run_config.model_dir.display(),
        "facesort starting"
    );

    let mut source = OnnxFaceSource::load(&run_config.model_dir)?;

    let abort = Arc::new(AtomicBool::new(false));
    let interrupt_flag = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after the current photo");
            interrupt_flag.store(true, Ordering::Relaxed);
        }
    });

    let stats =
        tokio::task::spawn_blocking(move || runner::run(&run_config, &mut source, &abort))
            .await??;

    tracing::info!(
        matches = stats.total_matches,
        candidates = stats.candidates_saved,
        seconds = format!("{:.1}", stats.processing_seconds),
        "facesort finished"
    );
    Ok(())
}
