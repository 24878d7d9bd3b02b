//! wavepirate - carves RIFF/WAVE audio out of arbitrary binary files.

mod engine;
mod report;

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

use engine::RunOptions;

#[derive(Parser, Debug)]
#[command(name = "wavepirate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files, disk images or devices to scan.
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Directory for extracted files.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Overwrite existing output files.
    #[arg(short, long, default_value_t = false)]
    force: bool,

    /// Report what would be extracted without writing anything.
    #[arg(short = 'n', long, default_value_t = false)]
    dry_run: bool,

    /// Number of sources scanned in parallel.
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Write a JSON report of every run to this file.
    #[arg(long)]
    manifest: Option<PathBuf>,

    #[arg(short, long, default_value_t = false, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let options = RunOptions {
        output_dir: args.output.clone(),
        overwrite: args.force,
        dry_run: args.dry_run,
        show_progress: !args.quiet,
    };

    let reports = engine::run_all(&args.sources, &options);

    if !args.quiet {
        report::print_summary(&reports, &options);
    }

    if let Some(manifest) = &args.manifest {
        report::write_manifest(manifest, &options, &reports)
            .with_context(|| format!("Failed to write manifest: {}", manifest.display()))?;
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        bail!("{} of {} sources failed", failed, reports.len());
    }

    Ok(())
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
