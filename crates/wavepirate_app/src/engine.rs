use anyhow::{Context, Result};
use humansize::{BINARY, format_size};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};
use wavepirate_core::{DiscardSinks, ExtractedRecord, ExtractionEvent, Extractor, SinkFactory};
use wavepirate_io::{DirectorySinks, SourceFile, base_name, output_file_name};

use crate::report::{RecordReport, SourceReport};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub overwrite: bool,
    pub dry_run: bool,
    pub show_progress: bool,
}

/// Scans every source independently, in parallel, and returns one report
/// per source in input order. Failures are recorded in the reports.
pub fn run_all(sources: &[PathBuf], options: &RunOptions) -> Vec<SourceReport> {
    let multi = MultiProgress::new();
    if !options.show_progress {
        multi.set_draw_target(ProgressDrawTarget::hidden());
    }

    let prefixes = output_prefixes(sources);

    sources
        .par_iter()
        .zip(prefixes.par_iter())
        .map(|(source, prefix)| {
            let mut report = SourceReport::new(source);
            let start = Instant::now();

            if let Err(e) = run_source(source, prefix, options, &multi, &mut report) {
                error!("{:#}", e);
                report.error = Some(format!("{:#}", e));
            }

            report.elapsed = start.elapsed();
            report
        })
        .collect()
}

/// Output name prefix for each source, in input order.
///
/// Sources are named after their file name. When several sources share a
/// file name, each gets its 1-based position among them appended, so
/// `x/disk.img` and `y/disk.img` write `disk.img_1_<n>.wav` and
/// `disk.img_2_<n>.wav` instead of the same files.
fn output_prefixes(sources: &[PathBuf]) -> Vec<String> {
    let names: Vec<String> = sources.iter().map(|p| base_name(p)).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in &names {
        *counts.entry(name.as_str()).or_default() += 1;
    }

    let mut taken: HashSet<String> = names
        .iter()
        .filter(|name| counts[name.as_str()] == 1)
        .cloned()
        .collect();
    let mut seen: HashMap<&str, usize> = HashMap::new();

    names
        .iter()
        .map(|name| {
            if counts[name.as_str()] == 1 {
                return name.clone();
            }
            let index = seen.entry(name.as_str()).or_default();
            loop {
                *index += 1;
                let candidate = format!("{}_{}", name, index);
                // A distinct source may already be called e.g. "disk.img_2".
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

fn run_source(
    path: &Path,
    prefix: &str,
    options: &RunOptions,
    multi: &MultiProgress,
    report: &mut SourceReport,
) -> Result<()> {
    let source = SourceFile::open(path)
        .with_context(|| format!("Failed to open source: {}", path.display()))?;

    info!(
        "Scanning {} ({})",
        path.display(),
        format_size(source.size(), BINARY)
    );

    let pb = multi.add(progress_bar(source.size(), prefix));
    let reader = pb.wrap_read(source);

    let result = if options.dry_run {
        carve(path, reader, &mut DiscardSinks::new(), None, &pb, report)
    } else {
        let mut sinks = DirectorySinks::new(&options.output_dir, prefix)
            .with_context(|| {
                format!(
                    "Failed to create output directory: {}",
                    options.output_dir.display()
                )
            })?
            .overwrite(options.overwrite);
        let result = carve(path, reader, &mut sinks, Some(prefix), &pb, report);
        report.attach_files(sinks.written());
        result
    };

    pb.finish_and_clear();
    result
}

/// `prefix` is the output name prefix, or `None` when nothing is written.
fn carve<R: Read, S: SinkFactory>(
    path: &Path,
    reader: R,
    sinks: &mut S,
    prefix: Option<&str>,
    pb: &ProgressBar,
    report: &mut SourceReport,
) -> Result<()> {
    let mut extractor = Extractor::new(reader);

    let outcome = extractor.run_with(sinks, |event| {
        if let ExtractionEvent::RecordExtracted(record) = event {
            pb.println(record_line(record, prefix));
            report.records.push(RecordReport::from(record));
        }
    });

    report.set_summary(extractor.summary());

    outcome.with_context(|| {
        format!(
            "Extraction from {} failed after {} file(s) at offset {}",
            path.display(),
            extractor.extracted(),
            extractor.position()
        )
    })?;

    info!(
        "{}: {} file(s) extracted, {} candidate(s) skipped",
        path.display(),
        extractor.extracted(),
        extractor.skipped()
    );

    Ok(())
}

fn record_line(record: &ExtractedRecord, prefix: Option<&str>) -> String {
    let target = match prefix {
        Some(prefix) => output_file_name(prefix, record.sequence),
        None => "(dry run)".to_string(),
    };
    format!("RIFF WAVE found ({} bytes) -> {}", record.record_size(), target)
}

fn progress_bar(size: u64, name: &str) -> ProgressBar {
    let pb = if size > 0 {
        let pb = ProgressBar::new(size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:>20} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .expect("invalid progress bar template - this is a bug")
                .progress_chars("##-"),
        );
        pb
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{prefix:>20} {spinner} {bytes} scanned")
                .expect("invalid spinner template - this is a bug"),
        );
        pb
    };
    pb.set_prefix(name.to_string());
    pb
}
