//! `ptrack` CLI: scenario runs, frame-directory tracking, replay evaluation.

use anyhow::Result;
use capture::{FrameProducer, FrameSequenceSource, ProducerConfig};
use clap::{Parser, Subcommand};
use sim::{save_replay, FrameRecord, ReplayLog, Scenario, ScenarioKind, SceneSource};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracker_core::metrics::{AccuracyStats, ReconcileStats};
use tracker_core::{Calibration, HoughParams, ReconcileOutput, Reconciler, ReconcilerConfig};
use vision_models::{HoughCircleDetector, TemplateTracker};

#[derive(Parser)]
#[command(name = "ptrack", about = "Circular-target tracking CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
struct CalibrationArgs {
    /// True target diameter (mm)
    #[arg(long, default_value_t = 65.0)]
    real_diameter_mm: f64,
    /// Lens focal length (mm)
    #[arg(long, default_value_t = 3.6)]
    focal_length_mm: f64,
    /// Physical sensor width (mm)
    #[arg(long, default_value_t = 3.68)]
    sensor_width_mm: f64,
    /// Physical sensor height (mm)
    #[arg(long, default_value_t = 2.76)]
    sensor_height_mm: f64,
}

impl From<CalibrationArgs> for Calibration {
    fn from(a: CalibrationArgs) -> Self {
        Self {
            real_diameter_mm: a.real_diameter_mm,
            focal_length_mm: a.focal_length_mm,
            sensor_width_mm: a.sensor_width_mm,
            sensor_height_mm: a.sensor_height_mm,
        }
    }
}

#[derive(clap::Args, Clone, Copy)]
struct HoughArgs {
    /// Inverse accumulator resolution
    #[arg(long, default_value_t = 1.2)]
    dp: f64,
    /// Minimum distance between circle centers (px)
    #[arg(long, default_value_t = 50.0)]
    min_dist: f64,
    /// Edge gradient threshold
    #[arg(long, default_value_t = 100.0)]
    param1: f64,
    /// Accumulator vote threshold
    #[arg(long, default_value_t = 70.0)]
    param2: f64,
    /// Smallest radius considered (px)
    #[arg(long, default_value_t = 20)]
    min_radius: u32,
    /// Largest radius considered (px)
    #[arg(long, default_value_t = 100)]
    max_radius: u32,
}

impl From<HoughArgs> for HoughParams {
    fn from(a: HoughArgs) -> Self {
        Self {
            dp: a.dp,
            min_dist: a.min_dist,
            param1: a.param1,
            param2: a.param2,
            min_radius: a.min_radius,
            max_radius: a.max_radius,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named synthetic scenario through the full pipeline.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Frames dropped between deliveries
        #[arg(long, default_value_t = 0)]
        skip_frames: u32,
        /// Assign stable ids to reported targets
        #[arg(long)]
        assign_ids: bool,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the full replay log
        #[arg(long)]
        save_replay: Option<PathBuf>,
        #[command(flatten)]
        calibration: CalibrationArgs,
    },
    /// Track a directory of image frames and print per-object reports.
    Track {
        /// Directory of ordered frame images
        frames: PathBuf,
        /// Frames dropped between deliveries
        #[arg(long, default_value_t = 0)]
        skip_frames: u32,
        /// Assign stable ids to reported targets
        #[arg(long)]
        assign_ids: bool,
        #[command(flatten)]
        hough: HoughArgs,
        #[command(flatten)]
        calibration: CalibrationArgs,
    },
    /// Recompute metrics from a saved replay log.
    EvalReplay {
        /// Path to replay JSON file
        input: PathBuf,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            skip_frames,
            assign_ids,
            output,
            save_replay: replay_path,
            calibration,
        } => run_scenario(
            &scenario,
            seed,
            skip_frames,
            assign_ids,
            calibration.into(),
            output.as_deref(),
            replay_path.as_deref(),
        ),
        Commands::Track {
            frames,
            skip_frames,
            assign_ids,
            hough,
            calibration,
        } => track_directory(
            &frames,
            skip_frames,
            assign_ids,
            hough.into(),
            calibration.into(),
        ),
        Commands::EvalReplay { input, output } => eval_replay(&input, output.as_deref()),
    }
}

fn run_scenario(
    kind: &ScenarioKind,
    seed: u64,
    skip_frames: u32,
    assign_ids: bool,
    calibration: Calibration,
    output_path: Option<&std::path::Path>,
    replay_path: Option<&std::path::Path>,
) -> Result<()> {
    let scenario = Scenario::build(kind);
    let source = SceneSource::new(scenario.clone(), seed);
    let read_log = source.read_log();

    let mut reconciler = Reconciler::new(
        ReconcilerConfig {
            calibration,
            assign_ids,
            ..Default::default()
        },
        HoughCircleDetector::new(scenario.hough),
        TemplateTracker::default(),
    );

    println!(
        "Running scenario '{}' (seed={}, {} frames, skip={})...",
        scenario.name, seed, scenario.n_frames, skip_frames
    );
    let start = std::time::Instant::now();

    let (tx, rx) = crossbeam_channel::unbounded::<(u64, ReconcileOutput)>();
    let mut producer = FrameProducer::new(ProducerConfig { skip_frames });
    producer.set_callback(Some(Box::new(move |frame| {
        let out = reconciler.process_frame(&frame);
        let _ = tx.send((frame.seq, out));
    })));
    producer.start(source);
    producer.wait();
    // Dropping the callback drops the sender, terminating the drain below.
    producer.set_callback(None);

    let results: Vec<(u64, ReconcileOutput)> = rx.iter().collect();
    let elapsed = start.elapsed();

    let mut stats = ReconcileStats::default();
    let mut accuracy = AccuracyStats::default();
    let mut frames: Vec<FrameRecord> = Vec::new();
    let reads = read_log
        .lock()
        .map_err(|_| anyhow::anyhow!("read log poisoned"))?;

    for (seq, out) in &results {
        // Delivery k is the ((k+1)·(skip+1))-th successful read.
        let read_idx = ((seq + 1) * (skip_frames as u64 + 1) - 1) as usize;
        let ground_truth = match reads.get(read_idx) {
            Some(&scenario_idx) => scenario.ground_truth(scenario_idx),
            None => Vec::new(),
        };
        stats.record(out);
        let centers: Vec<[f64; 2]> = ground_truth.iter().map(|g| g.center).collect();
        accuracy.evaluate_frame(&out.reports, &centers);
        frames.push(FrameRecord {
            seq: *seq,
            reports: out.reports.clone(),
            ground_truth,
        });
    }

    println!(
        "Done: {} delivered frames, elapsed={:.2}s",
        stats.n_frames,
        elapsed.as_secs_f64()
    );
    println!(
        "Frames: {} tracking, {} re-detect ({} quiescent); {} reports, {} seed rejections",
        stats.n_tracking, stats.n_redetect, stats.n_quiescent, stats.n_reports, stats.n_seed_rejections
    );
    println!(
        "Accuracy: rmse={:.2}px, recall={:.2}, fp={}, fn={}",
        accuracy.rmse_center(),
        accuracy.recall(),
        accuracy.false_positives,
        accuracy.false_negatives
    );

    if let Some(rpath) = replay_path {
        let log = ReplayLog {
            scenario_name: scenario.name.clone(),
            seed,
            skip_frames,
            frames,
        };
        save_replay(&log, rpath)?;
        println!("Replay saved to {}", rpath.display());
    }

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "scenario": scenario.name,
            "seed": seed,
            "elapsed_s": elapsed.as_secs_f64(),
            "stats": stats,
            "accuracy": accuracy,
            "rmse_center_px": accuracy.rmse_center(),
            "recall": accuracy.recall(),
        });
        std::fs::write(opath, serde_json::to_string_pretty(&json)?)?;
        println!("Metrics saved to {}", opath.display());
    }

    Ok(())
}

fn track_directory(
    dir: &std::path::Path,
    skip_frames: u32,
    assign_ids: bool,
    hough: HoughParams,
    calibration: Calibration,
) -> Result<()> {
    let source = FrameSequenceSource::open(dir)?;
    println!(
        "Tracking {} frames from {} (skip={})...",
        source.len(),
        dir.display(),
        skip_frames
    );

    let mut reconciler = Reconciler::new(
        ReconcilerConfig {
            calibration,
            assign_ids,
            ..Default::default()
        },
        HoughCircleDetector::new(hough),
        TemplateTracker::default(),
    );

    let stats = Arc::new(Mutex::new(ReconcileStats::default()));
    let stats_sink = Arc::clone(&stats);
    let mut producer = FrameProducer::new(ProducerConfig { skip_frames });
    producer.set_callback(Some(Box::new(move |frame| {
        let out = reconciler.process_frame(&frame);
        for (i, report) in out.reports.iter().enumerate() {
            let label = report
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| i.to_string());
            let r = report.region;
            match report.distance_mm {
                Some(d) => println!(
                    "frame {}: Object {}: Box=({}, {}, {}, {}), Distance={:.2} mm",
                    frame.seq, label, r.x, r.y, r.width, r.height, d
                ),
                None => println!(
                    "frame {}: Object {}: Box=({}, {}, {}, {}), Distance=N/A",
                    frame.seq, label, r.x, r.y, r.width, r.height
                ),
            }
        }
        if let Ok(mut stats) = stats_sink.lock() {
            stats.record(&out);
        }
    })));
    producer.start(source);
    producer.wait();
    producer.set_callback(None);

    let stats = stats
        .lock()
        .map_err(|_| anyhow::anyhow!("stats poisoned"))?;
    println!(
        "Done: {} frames ({} tracking, {} re-detect, {} quiescent), {} reports",
        stats.n_frames, stats.n_tracking, stats.n_redetect, stats.n_quiescent, stats.n_reports
    );
    Ok(())
}

fn eval_replay(input: &std::path::Path, output_path: Option<&std::path::Path>) -> Result<()> {
    let log = sim::load_replay(input)?;
    println!(
        "Evaluating '{}' ({} frames, seed={})...",
        log.scenario_name,
        log.frames.len(),
        log.seed
    );

    let mut accuracy = AccuracyStats::default();
    let mut n_reports = 0u64;
    for frame in &log.frames {
        let centers: Vec<[f64; 2]> = frame.ground_truth.iter().map(|g| g.center).collect();
        accuracy.evaluate_frame(&frame.reports, &centers);
        n_reports += frame.reports.len() as u64;
    }

    println!(
        "Accuracy: rmse={:.2}px, recall={:.2}, fp={}, fn={} ({} reports)",
        accuracy.rmse_center(),
        accuracy.recall(),
        accuracy.false_positives,
        accuracy.false_negatives,
        n_reports
    );

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "scenario": log.scenario_name,
            "seed": log.seed,
            "frames": log.frames.len(),
            "accuracy": accuracy,
            "rmse_center_px": accuracy.rmse_center(),
            "recall": accuracy.recall(),
        });
        std::fs::write(opath, serde_json::to_string_pretty(&json)?)?;
        println!("Metrics saved to {}", opath.display());
    }

    Ok(())
}
