//! Command-line interface for the spectrum pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};

use crate::core::transforms::SpectrumAnalyzer;
use crate::processors::pipeline::{self, BatchWarning};
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "pcal-spectrum")]
#[command(about = "Power spectra and HTML report from pcal autocorrelation files", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every file in the data directory and write the report
    Run {
        /// Directory containing autocorrelation files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Directory for plots, data files and the report
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// File listing input names to skip
        #[arg(long)]
        exclude_file: Option<PathBuf>,
        /// Sampling frequency in Hz
        #[arg(long)]
        fs: Option<f64>,
        /// Only process files with this extension
        #[arg(long)]
        extension: Option<String>,
    },

    /// Analyze a single file (no exclusion list, no report)
    Process {
        /// Autocorrelation file to analyze
        file: PathBuf,
        /// Directory for plots and data files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Sampling frequency in Hz
        #[arg(long)]
        fs: Option<f64>,
    },

    /// Write the effective configuration as YAML
    InitConfig {
        /// Destination YAML file
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Log sink that writes every line to stderr and a file.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn init_logging(verbose: u8, log_file: Option<&Path>) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs();

    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder
                    .write_style(env_logger::WriteStyle::Never)
                    .target(env_logger::Target::Pipe(Box::new(TeeWriter { file })));
            }
            Err(e) => eprintln!("Cannot open log file {}: {}", path.display(), e),
        }
    }

    builder.init();
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Create a progress bar over input files
fn create_file_progress() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// One `key: value` row of the summary box, values truncated to fit.
fn summary_row(key: &str, value: &str) -> String {
    let display_value = if value.chars().count() > 38 {
        let head: String = value.chars().take(35).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    };
    format!("║ {:<20}: {:<38} ║", key, display_value)
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        println!("{}", summary_row(key, value));
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let config = PipelineConfig::from_yaml(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            info!("Loaded config from: {}", path.display());
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    init_logging(cli.verbose, cli.log_file.as_deref());

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // Dispatch to subcommands
    let result = match cli.command {
        Commands::Run {
            data_dir,
            output_dir,
            exclude_file,
            fs,
            extension,
        } => {
            let config =
                apply_run_overrides(config, data_dir, output_dir, exclude_file, fs, extension);
            cmd_run(&config)
        }
        Commands::Process { file, output_dir, fs } => {
            let mut config = config;
            if let Some(dir) = output_dir {
                config.output.output_dir = dir;
            }
            if let Some(fs) = fs {
                config.spectrum.sampling_rate_hz = fs;
            }
            cmd_process(&file, &config)
        }
        Commands::InitConfig { path, force } => cmd_init_config(&path, force, &config),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn apply_run_overrides(
    mut config: PipelineConfig,
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    exclude_file: Option<PathBuf>,
    fs: Option<f64>,
    extension: Option<String>,
) -> PipelineConfig {
    if let Some(dir) = data_dir {
        // An exclusion list inside the old data dir follows it to the new one
        if exclude_file.is_none() {
            if let Ok(relative) = config.input.exclude_file.strip_prefix(&config.input.data_dir) {
                config.input.exclude_file = dir.join(relative);
            }
        }
        config.input.data_dir = dir;
    }
    if let Some(path) = exclude_file {
        config.input.exclude_file = path;
    }
    if let Some(dir) = output_dir {
        config.output.output_dir = dir;
    }
    if let Some(fs) = fs {
        config.spectrum.sampling_rate_hz = fs;
    }
    if extension.is_some() {
        config.input.extension = extension;
    }
    config
}

fn cmd_run(config: &PipelineConfig) -> Result<()> {
    let start = Instant::now();

    info!("Data directory: {}", config.input.data_dir.display());
    info!("Exclusion file: {}", config.input.exclude_file.display());
    info!("Output directory: {}", config.output.output_dir.display());
    info!("Sampling frequency: {} Hz", config.spectrum.sampling_rate_hz);

    let progress = create_file_progress();
    let summary = pipeline::run_pipeline(config, &progress);
    progress.finish_and_clear();
    let summary = summary.context("Spectrum analysis failed")?;

    let outcome = &summary.outcome;
    for warning in &outcome.warnings {
        println!("warning: {}", warning);
    }

    print_summary(
        "Spectrum Analysis Complete",
        &[
            ("Data directory", config.input.data_dir.display().to_string()),
            ("Files found", summary.candidates.to_string()),
            ("Files processed", outcome.reports.len().to_string()),
            ("Files excluded", outcome.excluded.len().to_string()),
            ("Files skipped", outcome.skipped().to_string()),
            ("Warnings", outcome.warnings.len().to_string()),
            ("Report", summary.report_path.display().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

fn cmd_process(file: &Path, config: &PipelineConfig) -> Result<()> {
    let start = Instant::now();

    config.validate().context("Invalid configuration")?;
    pipeline::prepare_output_dir(config)?;

    let spinner = create_spinner("Computing spectra...");
    let mut analyzer = SpectrumAnalyzer::from_config(&config.spectrum);
    let mut warnings: Vec<BatchWarning> = Vec::new();
    let result = pipeline::process_file(file, config, &mut analyzer, &mut warnings);
    spinner.finish_and_clear();

    let report = result.with_context(|| format!("Failed to process {}", file.display()))?;

    for warning in &warnings {
        warn!("{}", warning);
    }
    for segment in &report.segments {
        println!("pcal{}: {}", segment.index, segment.written().join(", "));
    }

    print_summary(
        "File Analysis Complete",
        &[
            ("Input file", file.display().to_string()),
            ("Output directory", config.output.output_dir.display().to_string()),
            ("Segments", report.segments.len().to_string()),
            ("Warnings", warnings.len().to_string()),
            ("Sampling rate (Hz)", config.spectrum.sampling_rate_hz.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

fn cmd_init_config(path: &Path, force: bool, config: &PipelineConfig) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    config
        .to_yaml(path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    println!("Configuration written to {}", path.display());
    Ok(())
}
