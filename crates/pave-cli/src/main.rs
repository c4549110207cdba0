use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use pave_pipeline::{calibrate_directory, run_pipeline, ErrorPolicy, PipelineConfig};
use std::{fs, path::Path, path::PathBuf};

/// Calibrate, rectify, slice and stack pavement images.
#[derive(Debug, Parser)]
#[command(author, version, about = "Pavement image rectification pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Process every image of a project directory.
    Run(RunArgs),
    /// Calibrate from a directory of chessboard images and print the result as JSON.
    Calibrate(CalibrateArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Project root holding the `res/` tree.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Optional path to a JSON PipelineConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Remove the results of a previous run first.
    #[arg(long)]
    clean: bool,

    /// Pass images through without undistortion.
    #[arg(long)]
    no_rectify: bool,

    /// Do not calibrate; rectify with the synthetic lens model.
    #[arg(long)]
    skip_calibration: bool,

    /// Skip images that fail to decode or encode instead of aborting.
    #[arg(long)]
    keep_going: bool,
}

#[derive(Debug, Args)]
struct CalibrateArgs {
    /// Directory of calibration images.
    #[arg(long)]
    images: PathBuf,

    /// Optional path to a JSON PipelineConfig; only its calibrator section is used.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write detected-corner overlays into this directory.
    #[arg(long)]
    corners: Option<PathBuf>,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(value)
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => load_json_file(p),
        None => Ok(PipelineConfig::default()),
    }
}

fn run_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if args.no_rectify {
        config.use_calibration = false;
    }
    if args.skip_calibration {
        config.calibrate = false;
    }
    if args.keep_going {
        config.error_policy = ErrorPolicy::Skip;
    }
    Ok(config)
}

fn run(args: &RunArgs) -> Result<()> {
    let config = run_config(args)?;
    if args.clean {
        let removed = config.layout.under(&args.root).clean()?;
        info!("removed {removed} files from previous runs");
    }
    let summary = run_pipeline(&args.root, &config)?;
    if !summary.skipped.is_empty() {
        eprintln!("skipped {} images:", summary.skipped.len());
        for path in &summary.skipped {
            eprintln!("  {}", path.display());
        }
    }
    Ok(())
}

fn calibrate_to_json(args: &CalibrateArgs) -> Result<String> {
    let config = load_config(args.config.as_deref())?;
    if let Some(dir) = &args.corners {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let result = calibrate_directory(
        &args.images,
        &config.calibrator,
        args.corners.as_deref(),
        config.error_policy,
    )?
    .with_context(|| format!("no chessboard found under {}", args.images.display()))?;
    Ok(serde_json::to_string_pretty(&result)?)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(&args),
        Command::Calibrate(args) => {
            let json = calibrate_to_json(&args)?;
            println!("{json}");
            Ok(())
        }
    }
}
