//! foldpath: native contact formation analysis for folding trajectories.
//!
//! Each subcommand runs one stage and persists its output, so the stages can
//! be chained through files: `cluster` -> `analyze` -> `summarize` ->
//! `classify`, with `smooth` as a side branch for plotting.
#![allow(clippy::uninlined_format_args, clippy::too_many_lines)]

use clap::{Args, Parser, Subcommand};

use foldpath_algorithms::{
    classify_windows, smooth, ContactClusterer, FrameEvaluator, SummaryWindows,
};
use foldpath_core::{AnalysisConfig, FrameSource};
use foldpath_io::{FrameRecordWriter, PdbFrameReader};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    FoldpathIo(#[from] foldpath_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] foldpath_core::Error),

    #[error("Config file error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Native contact formation analysis for protein folding trajectories.
#[derive(Parser)]
#[command(name = "foldpath")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// JSON analysis configuration; explicit flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (info-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads for frame evaluation (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster a raw contact table into a native contact map
    Cluster {
        /// Raw contact table (`i j r6 r12 [r]` per line)
        input: PathBuf,

        /// Output CSV (default: <input>_clustered.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target number of clusters (K)
        #[arg(short = 'k', long)]
        clusters: Option<usize>,

        /// Minimum contacts per retained cluster (S)
        #[arg(short = 's', long)]
        min_size: Option<usize>,
    },

    /// Evaluate native contacts in every frame of a PDB trajectory
    Analyze {
        /// Multi-model PDB trajectory
        trajectory: PathBuf,

        /// Clustered contact map CSV
        #[arg(short, long)]
        contacts: PathBuf,

        /// Output CSV (default: <trajectory>_parsed.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Native distance multiplier
        #[arg(long)]
        cutoff: Option<f64>,

        /// Stop after this many frames
        #[arg(long)]
        max_frames: Option<usize>,
    },

    /// Aggregate per-frame records into fixed-size windows
    Summarize {
        /// Per-frame CSV written by `analyze`
        input: PathBuf,

        /// Output CSV (default: <input>_summary.csv, or _summary_binary.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frames per window (W)
        #[arg(short, long)]
        window: Option<usize>,

        /// Binarize window means at this cutoff (B)
        #[arg(short, long)]
        binarize: Option<f64>,
    },

    /// Running averages of Q and cluster filling
    Smooth {
        /// Per-frame CSV written by `analyze`
        input: PathBuf,

        /// Output CSV (default: <input>_<window>_smoothed.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Running window width in frames
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Infer cluster formation order from a binarized summary
    Classify {
        /// Binarized summary CSV written by `summarize --binarize`
        input: PathBuf,

        /// Output file (default: <input>_class.txt, or .json with --json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show statistics of a clustered contact map
    Info {
        /// Clustered contact map CSV
        input: PathBuf,
    },
}

/// Builds `<dir>/<stem><suffix>` next to `input`.
fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("trajectory");
    input.with_file_name(format!("{}{}", stem, suffix))
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let config: AnalysisConfig = serde_json::from_reader(foldpath_io::open(path)?)?;
    info!("loaded configuration from {}", path.display());
    Ok(config)
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Some(threads) = cli.global.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let mut config = load_config(cli.global.config.as_deref())?;

    match cli.command {
        Commands::Cluster {
            input,
            output,
            clusters,
            min_size,
        } => {
            if let Some(k) = clusters {
                config.clusterer.cluster_count = k;
            }
            if let Some(s) = min_size {
                config.clusterer.min_cluster_size = s;
            }
            let output = output.unwrap_or_else(|| derived_path(&input, "_clustered.csv"));

            let map = foldpath_io::read_raw_contacts(foldpath_io::open(&input)?)?;
            let clusterer = ContactClusterer::new(config.clusterer)?;
            let clustered = clusterer.cluster(&map)?;
            foldpath_io::write_contact_map(foldpath_io::create(&output)?, &clustered)?;

            println!(
                "Clustered {} contacts into {} clusters ({} unassigned)",
                clustered.len(),
                clustered.cluster_ids().len(),
                clustered.unassigned_count()
            );
            println!("Wrote {}", output.display());
        }

        Commands::Analyze {
            trajectory,
            contacts,
            output,
            cutoff,
            max_frames,
        } => {
            if let Some(cutoff) = cutoff {
                config.evaluator.cutoff_distance = cutoff;
            }
            if max_frames.is_some() {
                config.max_frames = max_frames;
            }
            config.validate()?;
            let output = output.unwrap_or_else(|| derived_path(&trajectory, "_parsed.csv"));

            let map = foldpath_io::read_contact_map(foldpath_io::open(&contacts)?)?;
            if map.cluster_ids().is_empty() {
                warn!("contact map has no clusters; only Q will be meaningful");
            }
            let evaluator = FrameEvaluator::new(map, config.evaluator)?;

            let mut reader = PdbFrameReader::open(&trajectory)?;
            if let Some(max) = config.max_frames {
                reader = reader.with_max_frames(max);
            }

            let start = Instant::now();
            let mut writer = FrameRecordWriter::new(foldpath_io::create(&output)?)?;
            for record in evaluator.evaluate_stream(reader) {
                writer.write(&record?)?;
            }
            writer.flush()?;

            println!(
                "Analyzed {} frames in {:.2}s",
                writer.written(),
                start.elapsed().as_secs_f64()
            );
            println!("Wrote {}", output.display());
        }

        Commands::Summarize {
            input,
            output,
            window,
            binarize,
        } => {
            if let Some(window) = window {
                config.summary.window_size = window;
            }
            if binarize.is_some() {
                config.summary.binarize_cutoff = binarize;
            }
            let suffix = if config.summary.binarize_cutoff.is_some() {
                "_summary_binary.csv"
            } else {
                "_summary.csv"
            };
            let output = output.unwrap_or_else(|| derived_path(&input, suffix));

            let records = foldpath_io::read_frame_records(foldpath_io::open(&input)?)?;
            let windows = SummaryWindows::new(records, config.summary)?
                .collect::<foldpath_core::Result<Vec<_>>>()?;
            foldpath_io::write_summary(foldpath_io::create(&output)?, &windows)?;

            println!("Summarized into {} windows", windows.len());
            println!("Wrote {}", output.display());
        }

        Commands::Smooth {
            input,
            output,
            window,
        } => {
            if let Some(window) = window {
                config.smoothing.window_size = window;
            }
            let output = output.unwrap_or_else(|| {
                derived_path(
                    &input,
                    &format!("_{}_smoothed.csv", config.smoothing.window_size),
                )
            });

            let records = foldpath_io::read_frame_records(foldpath_io::open(&input)?)?;
            let smoothed = smooth(&records, &config.smoothing)?;
            foldpath_io::write_smoothed(foldpath_io::create(&output)?, &smoothed)?;

            println!("Smoothed {} frames", smoothed.len());
            println!("Wrote {}", output.display());
        }

        Commands::Classify {
            input,
            output,
            json,
        } => {
            let suffix = if json { "_class.json" } else { "_class.txt" };
            let output = output.unwrap_or_else(|| derived_path(&input, suffix));

            let windows = foldpath_io::read_summary(foldpath_io::open(&input)?)?;
            if windows.iter().any(|w| !w.binarized) {
                warn!("summary contains non-binary values; run summarize with --binarize");
            }
            let result = classify_windows(&windows)?;

            let writer = foldpath_io::create(&output)?;
            if json {
                foldpath_io::write_classification_json(writer, &result)?;
            } else {
                foldpath_io::write_classification_text(writer, &result)?;
            }

            let order: Vec<String> = result.order.iter().map(ToString::to_string).collect();
            println!("Formation order: {}", order.join(", "));
            if !result.never_formed.is_empty() {
                println!("Never stably formed: {:?}", result.never_formed);
            }
            println!("Wrote {}", output.display());
        }

        Commands::Info { input } => {
            let map = foldpath_io::read_contact_map(foldpath_io::open(&input)?)?;

            println!("File: {}", input.display());
            println!("Contacts: {}", map.len());
            if let Some((first, last)) = map.residue_range() {
                println!("Residue range: {} - {}", first, last);
            }
            println!("Unassigned: {}", map.unassigned_count());
            println!("Clusters: {}", map.cluster_ids().len());
            for (cluster, size) in map.cluster_sizes() {
                println!("  cluster {:>3}: {} contacts", cluster, size);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_derived_path() {
        let path = derived_path(Path::new("runs/fold_01.pdb"), "_parsed.csv");
        assert_eq!(path, PathBuf::from("runs/fold_01_parsed.csv"));
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::parse_from([
            "foldpath",
            "summarize",
            "parsed.csv",
            "--window",
            "50",
            "--binarize",
            "0.5",
            "-v",
        ]);
        assert!(cli.global.verbose);
        match cli.command {
            Commands::Summarize {
                window, binarize, ..
            } => {
                assert_eq!(window, Some(50));
                assert_eq!(binarize, Some(0.5));
            }
            _ => panic!("expected summarize"),
        }
    }
}
