//! VANET Collision Warning Simulator CLI
//!
//! Runs scenarios through the collision and dissemination engines, streams the
//! records to a live warning board, and optionally exports the logs.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use vanet_core::VanetConfig;
use vanet_env::{record_channel, SimRecord, TeeSink};
use vanet_sim::scenarios::ScenarioId;
use vanet_sim::{LogExporter, ScenarioResult, ScenarioRunner, SimConfig, SimError, WarningBoard};

/// VANET collision warning simulator
#[derive(Parser, Debug)]
#[command(name = "vanet-sim")]
#[command(about = "Run collision warning scenarios through the VANET engines", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (head_on, intersection, platoon, highway, lossy_highway, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to run
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Maximum number of simulation steps
    #[arg(long, default_value = "1000")]
    steps: u64,

    /// Vehicles in the random-traffic scenarios
    #[arg(long, default_value = "30")]
    vehicles: usize,

    /// Position noise standard deviation (m)
    #[arg(long, default_value = "0.0")]
    noise: f64,

    /// JSON engine configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override: collision horizon (s)
    #[arg(long)]
    time_threshold: Option<f64>,

    /// Override: prefilter distance (m)
    #[arg(long)]
    distance_threshold: Option<f64>,

    /// Override: radio range (m)
    #[arg(long)]
    range: Option<f64>,

    /// Override: packet loss probability
    #[arg(long)]
    loss: Option<f64>,

    /// Override: step length (s)
    #[arg(long)]
    step_length: Option<f64>,

    /// Records buffered for the live board before the oldest are dropped (1 to 1048576)
    #[arg(long, default_value = "1024")]
    channel_capacity: usize,

    /// Rows of the warning board printed after each run
    #[arg(long, default_value = "10")]
    board_rows: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Directory to export collision/communication logs and a summary into
    #[arg(long)]
    export: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<VanetConfig, SimError> {
    let mut config = match &args.config {
        Some(path) => VanetConfig::from_file(path)?,
        None => VanetConfig::default(),
    };

    if let Some(v) = args.time_threshold {
        config.time_threshold = v;
    }
    if let Some(v) = args.distance_threshold {
        config.distance_threshold = v;
    }
    if let Some(v) = args.range {
        config.transmission_range = v;
    }
    if let Some(v) = args.loss {
        config.packet_loss_rate = v;
    }
    if let Some(v) = args.step_length {
        config.step_length = v;
    }

    config.validate()?;
    Ok(config)
}

/// Runs one scenario with a live board consumer and an in-memory log collector.
async fn run_one(
    sim: SimConfig,
    scenario: ScenarioId,
    channel_capacity: usize,
) -> Result<(ScenarioResult, LogExporter, WarningBoard), SimError> {
    let (channel, mut rx) = record_channel(channel_capacity)?;

    let consumer = tokio::spawn(async move {
        let mut board = WarningBoard::new();
        while let Some(record) = rx.next().await {
            let end = record == SimRecord::End;
            board.push(&record);
            if end {
                break;
            }
        }
        (board, rx.dropped())
    });

    let sink = TeeSink::new(LogExporter::new(), channel);
    let run = tokio::task::spawn_blocking(move || {
        ScenarioRunner::new(sim.seed)
            .with_config(sim)
            .run_with_sink(scenario, sink)
    })
    .await;

    let (mut result, sink) = match run {
        Ok(outcome) => outcome?,
        Err(e) => {
            error!("Scenario task failed: {}", e);
            std::process::exit(2);
        }
    };

    // Closing the producer lets the consumer finish even if it missed End
    let (exporter, channel) = sink.into_parts();
    drop(channel);

    let (board, dropped) = match consumer.await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Board consumer failed: {}", e);
            (WarningBoard::new(), 0)
        }
    };
    if dropped > 0 {
        warn!("Live board lagged and missed {} records", dropped);
    }
    result.stats.records_dropped = dropped;

    Ok((result, exporter, board))
}

fn export_dir(base: &Path, scenario: ScenarioId, seed: u64, many: bool) -> PathBuf {
    if many {
        base.join(format!("{}_{}", scenario.name(), seed))
    } else {
        base.to_path_buf()
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("VANET Collision Warning Simulator v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let vanet = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available scenarios: head_on, intersection, platoon, highway, lossy_highway, all");
            std::process::exit(1);
        })]
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let many = scenarios.len() * args.seeds > 1;
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let sim = SimConfig {
            seed,
            vehicles: args.vehicles,
            max_steps: args.steps,
            position_noise_std: args.noise,
            vanet,
        };

        for scenario in &scenarios {
            let (result, exporter, board) = match run_one(sim, *scenario, args.channel_capacity).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("✗ {} (seed={}) could not run: {}", scenario.name(), seed, e);
                    failed_count += 1;
                    continue;
                }
            };

            if !args.json {
                for line in board.render(args.board_rows).lines() {
                    info!("  {}", line);
                }
                info!(
                    "Simulation completed. Detected {} potential collisions.",
                    result.stats.total_collisions()
                );
                info!("Total simulation time: {:.2} seconds", result.final_time_secs);

                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if let Some(base) = &args.export {
                let dir = export_dir(base, *scenario, seed, many);
                if let Err(e) = exporter.export(&dir, &result, result.stats.records_dropped) {
                    error!("Export to {} failed: {}", dir.display(), e);
                }
            }

            if !result.passed {
                failed_count += 1;
            }

            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let passed = all_results.iter().filter(|r| r.passed).count();

    if args.json {
        // JSON output for CI parsing
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total.max(failed_count));

            for result in &all_results {
                if !result.passed {
                    error!(
                        "  - {} seed={}: {}",
                        result.scenario.name(),
                        result.seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
