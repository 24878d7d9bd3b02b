use anyhow::Result;
use chrono::Utc;
use humansize::{BINARY, format_size};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wavepirate_core::{ExtractedRecord, RunSummary};
use wavepirate_io::WrittenFile;

use crate::engine::RunOptions;

#[derive(Debug, Clone, Serialize)]
pub struct RecordReport {
    pub sequence: u32,
    pub source_offset: u64,
    pub declared_size: u32,
    pub record_size: u64,
    pub file: Option<PathBuf>,
    pub sha256: Option<String>,
}

impl From<&ExtractedRecord> for RecordReport {
    fn from(record: &ExtractedRecord) -> Self {
        Self {
            sequence: record.sequence,
            source_offset: record.offset,
            declared_size: record.declared_size,
            record_size: record.record_size(),
            file: None,
            sha256: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: PathBuf,
    pub bytes_scanned: u64,
    pub extracted: u32,
    pub skipped: u32,
    pub error: Option<String>,
    pub records: Vec<RecordReport>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SourceReport {
    pub fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            bytes_scanned: 0,
            extracted: 0,
            skipped: 0,
            error: None,
            records: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn set_summary(&mut self, summary: RunSummary) {
        self.bytes_scanned = summary.bytes_scanned;
        self.extracted = summary.extracted;
        self.skipped = summary.skipped;
    }

    /// Fills in output paths and digests for records that reached disk.
    pub fn attach_files(&mut self, written: &[WrittenFile]) {
        for file in written {
            if let Some(record) = self
                .records
                .iter_mut()
                .find(|r| r.sequence == file.sequence)
            {
                record.file = Some(file.path.clone());
                record.sha256 = Some(file.sha256.clone());
            }
        }
    }

    pub fn bytes_extracted(&self) -> u64 {
        self.records.iter().map(|r| r.record_size).sum()
    }
}

#[derive(Serialize)]
struct Manifest<'a> {
    generated_at: String,
    output_dir: &'a Path,
    dry_run: bool,
    sources: &'a [SourceReport],
}

pub fn write_manifest(path: &Path, options: &RunOptions, reports: &[SourceReport]) -> Result<()> {
    let manifest = Manifest {
        generated_at: Utc::now().to_rfc3339(),
        output_dir: &options.output_dir,
        dry_run: options.dry_run,
        sources: reports,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &manifest)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn print_summary(reports: &[SourceReport], options: &RunOptions) {
    let extracted: u32 = reports.iter().map(|r| r.extracted).sum();
    let skipped: u32 = reports.iter().map(|r| r.skipped).sum();
    let scanned: u64 = reports.iter().map(|r| r.bytes_scanned).sum();
    let carved: u64 = reports.iter().map(SourceReport::bytes_extracted).sum();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    let elapsed = reports
        .iter()
        .map(|r| r.elapsed)
        .max()
        .unwrap_or_default();

    println!("\n╔════════════════════════════════════════╗");
    if failed > 0 {
        println!("║        === Scan Incomplete ===         ║");
    } else {
        println!("║         === Scan Finished ===          ║");
    }
    println!("╠════════════════════════════════════════╣");
    println!(
        "║ Elapsed Time:       {:>18} ║",
        format!("{:.1}s", elapsed.as_secs_f64())
    );
    println!("║ Sources:            {:>18} ║", reports.len());
    println!("║ Failed Sources:     {:>18} ║", failed);
    println!("║ Scanned Space:      {:>18} ║", format_size(scanned, BINARY));
    println!("║ WAVE Files Found:   {:>18} ║", extracted);
    println!("║ Skipped Headers:    {:>18} ║", skipped);
    println!("║ Carved Audio:       {:>18} ║", format_size(carved, BINARY));
    println!("╠════════════════════════════════════════╣");
    if options.dry_run {
        println!("║ Dry run: nothing was written           ║");
    } else {
        println!(
            "║ Files saved to:     {:<18} ║",
            options.output_dir.display()
        );
    }
    println!("╚════════════════════════════════════════╝");

    for report in reports {
        if let Some(error) = &report.error {
            eprintln!("[!] {}: {}", report.source.display(), error);
        }
    }
}
