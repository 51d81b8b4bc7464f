//! ImageSleuth: parallel corrupt-image finder.
//!
//! Thin command-line front end. All logic lives in `imagesleuth-core`; this
//! binary submits one start-scan request, polls the status snapshot until the
//! scan finishes, and prints the outcome.

use anyhow::Context;
use clap::Parser;
use imagesleuth_core::config::ScanConfig;
use imagesleuth_core::scanner::{ScanCoordinator, ScanRequest};
use std::path::PathBuf;
use std::time::Duration;

/// How often the status snapshot is polled while the scan runs.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Parser)]
#[command(name = "imagesleuth", version, about = "Find corrupt images in labelled folders")]
struct Cli {
    /// Directory containing the folders to scan.
    root: PathBuf,

    /// Folder name under ROOT to scan. Repeatable.
    #[arg(short, long = "folder", value_name = "NAME")]
    folders: Vec<String>,

    /// File with one folder name per line.
    #[arg(long, value_name = "FILE")]
    folder_list: Option<PathBuf>,

    /// Worker threads (default: 2 × cores, capped at 16).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed for the random pixel probes, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the report (default: ~/Desktop/Corrupt Image).
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Print the final status as JSON instead of the summary line.
    #[arg(long)]
    json: bool,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn folder_labels(&self) -> anyhow::Result<String> {
        let mut labels = self.folders.join("\n");
        if let Some(list) = &self.folder_list {
            let text = std::fs::read_to_string(list)
                .with_context(|| format!("reading folder list {}", list.display()))?;
            labels.push('\n');
            labels.push_str(&text);
        }
        Ok(labels)
    }

    fn config(&self) -> ScanConfig {
        ScanConfig {
            workers: self.workers,
            sample_seed: self.seed,
            report_dir: self.report_dir.clone(),
            ..ScanConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    tracing::info!("ImageSleuth starting");

    let request = ScanRequest::new(cli.root.to_string_lossy(), cli.folder_labels()?);
    let coordinator = ScanCoordinator::new(cli.config());
    coordinator.start_scan(&request)?;

    let mut last_reported = u64::MAX;
    while coordinator.is_running() {
        std::thread::sleep(POLL_INTERVAL);
        let status = coordinator.status();
        if status.processed_images != last_reported && status.total_images > 0 {
            last_reported = status.processed_images;
            tracing::info!(
                "{}/{} images ({:.0}%), {:.0} images/sec, {} corrupt",
                status.processed_images,
                status.total_images,
                status.fraction_done() * 100.0,
                status.throughput,
                status.corrupt_findings.len()
            );
        }
    }
    coordinator.wait();

    let status = coordinator.status();
    if cli.json {
        println!("{}", status.to_json()?);
    } else {
        for finding in &status.corrupt_findings {
            println!("{}\t{}", finding.folder, finding.image);
        }
        println!("{}", status.message);
    }

    Ok(())
}
