//! Smart Counter CLI
//!
//! Counts repetitions from pose keypoint frames and runs workout programs.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use smart_counter::{
    config::Config,
    pose::{self, FrameReader, ReplayStep, DEFAULT_FPS},
    program::{format_clock, DriverInput, ProgramCatalog, ProgramDriver, ProgramEngine, Ticker},
    stats::{create_shared_stats_with_persistence, SessionStats},
    ProgramEvent, Record, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[cfg(feature = "gateway")]
use smart_counter::{BlockingGatewayClient, GatewayConfig};

#[derive(Parser)]
#[command(name = "smart-counter")]
#[command(version = VERSION)]
#[command(about = "Pose-driven repetition counter for workout programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded frames through a program
    Run {
        /// JSON-lines file of pose frames
        frames: PathBuf,

        /// Program catalog (JSON array of backend rows)
        #[arg(long, short)]
        catalog: PathBuf,

        /// Frames per second when frames carry no timestamps
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: u32,

        /// Emit the unfinished set if the frames run out first
        #[arg(long)]
        flush: bool,

        /// Sync records to the gateway (requires gateway feature)
        #[arg(long)]
        gateway: bool,

        /// Gateway port (read from the environment if not specified)
        #[arg(long)]
        gateway_port: Option<u16>,

        /// Gateway token (read from the environment if not specified)
        #[arg(long)]
        gateway_token: Option<String>,
    },

    /// Count live frames read from stdin
    Listen {
        /// Program catalog (JSON array of backend rows)
        #[arg(long, short)]
        catalog: PathBuf,

        /// Emit the unfinished set when stopped with Ctrl+C
        #[arg(long)]
        flush: bool,
    },

    /// Show the steps of a program catalog
    Catalog {
        /// Program catalog file
        path: PathBuf,
    },

    /// Show cumulative counting statistics
    Stats {
        /// Zero the persisted counters
        #[arg(long)]
        reset: bool,
    },

    /// Merge exported run records
    Export {
        /// Output directory
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Export format (json or jsonl)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Show configuration
    Config,
}

/// Contents of one `run_<timestamp>.json` file.
#[derive(Debug, Serialize, Deserialize)]
struct RunExport {
    run_id: Uuid,
    exported_at: DateTime<Utc>,
    records: Vec<Record>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("smart_counter=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            frames,
            catalog,
            fps,
            flush,
            gateway,
            gateway_port,
            gateway_token,
        } => cmd_run(
            &frames,
            &catalog,
            fps,
            flush,
            gateway,
            gateway_port,
            gateway_token,
        ),
        Commands::Listen { catalog, flush } => cmd_listen(&catalog, flush),
        Commands::Catalog { path } => cmd_catalog(&path),
        Commands::Stats { reset } => cmd_stats(reset),
        Commands::Export { output, format } => cmd_export(output, &format),
        Commands::Config => {
            cmd_config();
            Ok(())
        }
    }
}

fn load_config() -> Config {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Using default configuration: {e}");
        Config::default()
    });
    if let Err(e) = config.ensure_directories() {
        tracing::warn!("Could not create directories: {e}");
    }
    config
}

fn load_catalog(path: &Path) -> anyhow::Result<ProgramCatalog> {
    let catalog = ProgramCatalog::load(path)
        .with_context(|| format!("Could not load catalog {}", path.display()))?;
    if catalog.is_empty() {
        bail!("Catalog {} has no steps", path.display());
    }
    Ok(catalog)
}

#[allow(unused_variables)]
fn cmd_run(
    frames_path: &Path,
    catalog_path: &Path,
    fps: u32,
    flush: bool,
    enable_gateway: bool,
    gateway_port: Option<u16>,
    gateway_token: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config();
    let catalog = load_catalog(catalog_path)?;
    let frames = pose::replay::load(frames_path)
        .with_context(|| format!("Could not read frames {}", frames_path.display()))?;

    println!("Smart Counter v{VERSION}");
    println!("Replaying {} frames from {:?}", frames.len(), frames_path);
    println!();

    let stats = create_shared_stats_with_persistence(config.stats_path());
    let mut engine =
        ProgramEngine::start(catalog, config.detection.clone())?.with_stats(stats.clone());

    let mut records = Vec::new();
    for step in pose::schedule(frames, fps) {
        match step {
            ReplayStep::Frame(frame) => engine.process_frame(&frame),
            ReplayStep::Tick => engine.tick(),
        }
        for event in engine.take_events() {
            report(&event, &mut records);
        }
        if engine.is_finished() {
            break;
        }
    }

    if !engine.is_finished() {
        println!("Frames ended before the program finished");
        engine.stop(flush || config.flush_on_stop);
        for event in engine.take_events() {
            report(&event, &mut records);
        }
    }

    export_records(&config, engine.run_id(), &records)?;

    #[cfg(feature = "gateway")]
    if enable_gateway {
        sync_to_gateway(gateway_port, gateway_token, engine.run_id(), &records);
    }
    #[cfg(not(feature = "gateway"))]
    if enable_gateway {
        eprintln!("Warning: --gateway flag ignored (gateway feature not enabled at compile time)");
    }

    if let Err(e) = stats.save() {
        tracing::warn!("Could not save session stats: {e}");
    }

    println!();
    println!("{}", stats.summary());
    Ok(())
}

fn cmd_listen(catalog_path: &Path, flush: bool) -> anyhow::Result<()> {
    let config = load_config();
    let catalog = load_catalog(catalog_path)?;
    let flush = flush || config.flush_on_stop;

    let stats = create_shared_stats_with_persistence(config.stats_path());
    let engine =
        ProgramEngine::start(catalog, config.detection.clone())?.with_stats(stats.clone());
    let run_id = engine.run_id();
    let driver = ProgramDriver::spawn(engine);

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    println!("Smart Counter v{VERSION}");
    println!("Reading frames from stdin. Press Ctrl+C to stop");
    println!();

    let mut ticker = Ticker::start(driver.sender(), config.tick_interval);

    let frame_tx = driver.sender();
    thread::spawn(move || {
        for frame in FrameReader::new(std::io::stdin().lock()) {
            if frame_tx.send(DriverInput::Frame(frame)).is_err() {
                break;
            }
        }
        tracing::debug!("frame input ended");
    });

    let mut records = Vec::new();
    let mut last_clock = String::new();
    while running.load(Ordering::SeqCst) && !driver.is_finished() {
        match driver.events().recv_timeout(Duration::from_millis(100)) {
            Ok(event) => report(&event, &mut records),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                let live = driver.live();
                let clock = live.clock();
                if clock != last_clock {
                    tracing::debug!(
                        phase = ?live.phase,
                        reps = live.rep_count,
                        score = live.current_score,
                        clock = %clock,
                        "live"
                    );
                    last_clock = clock;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    ticker.stop();
    if !driver.is_finished() {
        println!();
        println!("Stopping...");
        let _ = driver.sender().send(DriverInput::Stop { flush });
    }

    // The event channel closes once the worker exits
    for event in driver.events().iter() {
        report(&event, &mut records);
    }
    driver.join().context("Program driver thread panicked")?;

    export_records(&config, run_id, &records)?;
    if let Err(e) = stats.save() {
        tracing::warn!("Could not save session stats: {e}");
    }

    println!();
    println!("{}", stats.summary());
    Ok(())
}

/// Print an event and keep any record it carries.
fn report(event: &ProgramEvent, records: &mut Vec<Record>) {
    match event {
        ProgramEvent::StepStarted {
            order_num,
            exercise,
        } => println!("Step {order_num}: {exercise}"),
        ProgramEvent::SetStarted {
            order_num,
            set_number,
        } => println!("  [step {order_num}] set {set_number}"),
        ProgramEvent::RepCompleted { rep_count, score } => {
            println!("    rep {rep_count} (score {score})")
        }
        ProgramEvent::Record(record) => {
            println!(
                "  {:?} record: {} reps in {}, total {}, average {:.1}",
                record.kind(),
                record.rep_count(),
                format_clock(record.duration_seconds()),
                record.total_score(),
                record.average_score()
            );
            records.push(record.clone());
        }
        ProgramEvent::BreakStarted { duration } => {
            println!("  rest {}", format_clock(*duration))
        }
        ProgramEvent::Completed => println!("Program complete"),
        ProgramEvent::Stopped => println!("Program stopped"),
    }
}

fn export_records(config: &Config, run_id: Uuid, records: &[Record]) -> anyhow::Result<()> {
    if records.is_empty() {
        println!("No records to export");
        return Ok(());
    }

    let export_path = config.export_path.join(format!(
        "run_{}.json",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));
    if let Some(parent) = export_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let export = RunExport {
        run_id,
        exported_at: Utc::now(),
        records: records.to_vec(),
    };
    let json = serde_json::to_string_pretty(&export)?;
    std::fs::write(&export_path, json)
        .with_context(|| format!("Could not write {}", export_path.display()))?;

    println!("Exported {} records to {:?}", records.len(), export_path);
    Ok(())
}

fn cmd_catalog(path: &Path) -> anyhow::Result<()> {
    let catalog = load_catalog(path)?;

    println!("Program Catalog");
    println!("===============");
    println!();
    for step in catalog.steps() {
        let exercise = smart_counter::ExerciseKind::from_id(step.exercise_id)
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| format!("unknown exercise {}", step.exercise_id));
        let limit = match (step.rep_limit, step.duration_limit) {
            (Some(reps), _) if step.mode == smart_counter::program::StepMode::Counter => {
                format!("{reps} reps")
            }
            (_, Some(secs)) => format_clock(secs),
            _ => "unbounded".to_string(),
        };
        println!(
            "  {}. {exercise}: {} x {limit}, rest {}",
            step.order_num,
            step.sets(),
            format_clock(step.break_duration)
        );
    }
    Ok(())
}

fn cmd_stats(reset: bool) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    let stats_path = config.stats_path();

    if reset {
        if stats_path.exists() {
            let stats = SessionStats::with_persistence(stats_path);
            stats.reset();
            stats.save()?;
            tracing::info!("session statistics reset");
        }
        println!("Statistics reset.");
        return Ok(());
    }

    println!("Smart Counter Statistics");
    println!("========================");
    println!();

    if stats_path.exists() {
        println!("{}", SessionStats::with_persistence(stats_path).summary());
    } else {
        println!("No previous session data found.");
    }
    Ok(())
}

fn cmd_export(output: Option<PathBuf>, format: &str) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    let export_dir = output.unwrap_or(config.export_path.clone());

    let run_files: Vec<PathBuf> = std::fs::read_dir(&export_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.extension().map(|e| e == "json").unwrap_or(false)
                        && p.file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|n| n.starts_with("run_"))
                })
                .collect()
        })
        .unwrap_or_default();

    if run_files.is_empty() {
        println!("No run data found in {export_dir:?}");
        println!("Run 'smart-counter run' to produce records.");
        return Ok(());
    }

    println!("Found {} run file(s) in {:?}", run_files.len(), export_dir);

    let mut all_records: Vec<Record> = Vec::new();
    for file in &run_files {
        let parsed = std::fs::read_to_string(file)
            .map_err(anyhow::Error::from)
            .and_then(|content| Ok(serde_json::from_str::<RunExport>(&content)?));
        match parsed {
            Ok(run) => all_records.extend(run.records),
            Err(e) => tracing::warn!("Skipping {}: {e}", file.display()),
        }
    }

    println!("Total records: {}", all_records.len());

    let output_path = export_dir.join(format!(
        "export_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        if format == "jsonl" { "jsonl" } else { "json" }
    ));

    let content = if format == "jsonl" {
        all_records
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?
            .join("\n")
    } else {
        serde_json::to_string_pretty(&all_records)?
    };
    std::fs::write(&output_path, content)
        .with_context(|| format!("Could not write {}", output_path.display()))?;

    println!("Exported to {output_path:?}");
    Ok(())
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")
}

/// Post a run's records, from CLI args or the environment.
#[cfg(feature = "gateway")]
fn sync_to_gateway(port: Option<u16>, token: Option<String>, run_id: Uuid, records: &[Record]) {
    let client = match (port, token) {
        (Some(p), Some(t)) => BlockingGatewayClient::new(GatewayConfig::new("127.0.0.1", p, t)),
        _ => BlockingGatewayClient::from_env(),
    };

    let client = match client {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Warning: Gateway initialization failed: {e}");
            return;
        }
    };

    match client.test_connection() {
        Ok(true) => {}
        Ok(false) => eprintln!("Warning: Gateway health check failed"),
        Err(e) => eprintln!("Warning: Could not connect to gateway: {e}"),
    }

    match client.sync_records(run_id, records) {
        Ok(response) => println!("[Gateway] Synced {} records", response.accepted),
        Err(e) => eprintln!("[Gateway] Sync failed: {e}"),
    }
}
