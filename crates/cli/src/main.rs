//! PathTrack CLI - offline-first learning progress tracker.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use pathtrack_core::{Curriculum, UserId};
use pathtrack_engine::{Activation, EngineConfig, ProgressEngine};
use pathtrack_progress::Resolution;
use pathtrack_storage::{JsonFileStore, LocalProgressStore, MemoryStore, ProgressStore};

#[derive(Parser)]
#[command(name = "pathtrack")]
#[command(about = "Offline-first learning progress tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding local progress
    #[arg(long, default_value = ".pathtrack")]
    data_dir: PathBuf,

    /// Curriculum definition (JSON array of phases)
    #[arg(long, default_value = "curriculum.json")]
    curriculum: PathBuf,

    /// Signed-in user; without it nothing is synced
    #[arg(long)]
    user: Option<String>,

    /// Remote progress service URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Quiet period before a change is pushed
    #[arg(long, default_value = "1000")]
    debounce_ms: u64,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show overall and per-phase progress
    Status,
    /// Toggle a task's completion
    Toggle {
        /// Phase ID
        phase: String,
        /// Task ID
        task: String,
    },
    /// Pull from the remote service and push any pending change
    Sync,
    /// Show a phase's tasks
    Show {
        /// Phase ID
        phase: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let curriculum = load_curriculum(&cli.curriculum)?;

    let mut config = EngineConfig::new().with_debounce(Duration::from_millis(cli.debounce_ms));
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }

    let store = LocalProgressStore::new(open_store(&cli.data_dir, &config.storage_key));
    let user = cli.user.as_deref().map(UserId::from);
    let mut engine = ProgressEngine::with_config(&config, store, user);

    let activation = engine.activate(curriculum).await;

    match cli.command {
        Commands::Status => {
            let analytics = engine.analytics();
            println!("PathTrack Status");
            println!(
                "  Overall: {}% ({}/{} tasks, {} remaining)",
                analytics.completion_rate,
                analytics.completed_tasks,
                analytics.total_tasks,
                analytics.remaining_tasks,
            );
            println!("  Phases completed: {}/{}", analytics.phases_completed, analytics.total_phases);
            for summary in engine.phase_summaries() {
                println!("  {:>3}% | {} - {} ({}/{})",
                    summary.percentage,
                    summary.phase_id,
                    summary.title,
                    summary.completed_tasks,
                    summary.total_tasks,
                );
            }
        }
        Commands::Toggle { phase, task } => {
            match engine.toggle_task(&phase, &task) {
                Some(completed) => {
                    println!("{}/{}: {}", phase, task, if completed { "done" } else { "not done" });
                    println!("  Phase progress: {}%", engine.phase_progress(&phase));
                }
                None => println!("Unknown task: {}/{}", phase, task),
            }
        }
        Commands::Sync => {
            if !engine.scheduler().is_authenticated() {
                println!("Not signed in; pass --user to sync");
            } else {
                println!("{}", describe_activation(&activation));
            }
        }
        Commands::Show { phase } => {
            let Some(def) = engine.curriculum().phase(&phase).cloned() else {
                println!("Phase not found");
                return Ok(());
            };

            println!("Phase: {} - {}", def.id, def.title);
            if !def.year.is_empty() || !def.months.is_empty() {
                println!("  When: {} {}", def.year, def.months);
            }
            println!("  Progress: {}%", engine.phase_progress(&phase));
            for task in &def.tasks {
                let mark = if engine.is_task_completed(&phase, task.id.as_str()) { "x" } else { " " };
                match task.difficulty {
                    Some(difficulty) => println!("  [{}] {} - {} ({:?})", mark, task.id, task.title, difficulty),
                    None => println!("  [{}] {} - {}", mark, task.id, task.title),
                }
            }
        }
    }

    if engine.has_pending_push() {
        info!("Waiting for pending sync");
    }
    engine.flush().await;

    Ok(())
}

fn load_curriculum(path: &Path) -> Result<Curriculum> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read curriculum {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Invalid curriculum {}", path.display()))
}

fn open_store(data_dir: &Path, key: &str) -> Arc<dyn ProgressStore> {
    match JsonFileStore::with_key(data_dir, key) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Cannot open {}, progress will not be saved: {}", data_dir.display(), e);
            Arc::new(MemoryStore::new())
        }
    }
}

fn describe_activation(activation: &Activation) -> String {
    let remote = match activation.resolution {
        Some(Resolution::AdoptedRemote) => "Adopted newer remote progress",
        Some(Resolution::KeptLocal) => "Local progress is up to date",
        None => "No remote progress available",
    };
    if activation.structural.is_change() {
        format!("{}; curriculum changes merged", remote)
    } else {
        remote.to_string()
    }
}
