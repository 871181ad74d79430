use clap::{Parser, Subcommand};
use rust_omr::tools::load_gray;
use rust_omr::{
    BatchScanner, ImageAligner, OmrError, ScanConfig, ScanReport, ScanWarning, TemplateStore,
    align_directory, export, extract_row, progress_channel,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "omrtool", version, about = "RustOMR CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Align every front-side scan in a directory to a reference image
    Align {
        #[arg(long)]
        reference: PathBuf,
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        suffix: Option<String>,
    },
    /// Scan a directory into a CSV table
    Scan {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Align scans against this image before reading them
        #[arg(long)]
        reference: Option<PathBuf>,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        suffix: Option<String>,
    },
    /// Read a single image and print its row
    Inspect {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        image: PathBuf,
    },
    /// Validate a template against its reference image
    CheckTemplate {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        reference: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Align {
            reference,
            dir,
            workers,
            suffix,
        } => align_cmd(&reference, &dir, scan_config(workers, suffix)),
        Command::Scan {
            template,
            dir,
            output,
            reference,
            workers,
            suffix,
        } => scan_cmd(
            &template,
            &dir,
            &output,
            reference.as_deref(),
            scan_config(workers, suffix),
        ),
        Command::Inspect { template, image } => inspect_cmd(&template, &image),
        Command::CheckTemplate {
            template,
            reference,
        } => check_template_cmd(&template, &reference),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Environment defaults, overridden by command-line flags
fn scan_config(workers: Option<usize>, suffix: Option<String>) -> ScanConfig {
    let mut config = ScanConfig::from_env();
    if let Some(workers) = workers {
        config = config.with_workers(workers);
    }
    if let Some(suffix) = suffix {
        config = config.with_front_suffix(suffix);
    }
    config
}

fn align_cmd(reference: &Path, dir: &Path, config: ScanConfig) -> Result<(), OmrError> {
    let start = Instant::now();
    let report = align_directory(reference, dir, &config)?;
    println!(
        "Aligned {} of {} images in {:.2}s",
        report.aligned.len(),
        report.attempted,
        start.elapsed().as_secs_f64()
    );
    for failure in &report.failures {
        println!("  FAILED {} [{}]: {}", failure.path.display(), failure.kind, failure.message);
    }
    Ok(())
}

fn scan_cmd(
    template_path: &Path,
    dir: &Path,
    output: &Path,
    reference: Option<&Path>,
    config: ScanConfig,
) -> Result<(), OmrError> {
    let template = TemplateStore::load(template_path)?;
    let questions = template.question_count();

    let (tx, rx) = progress_channel(64);
    let mut scanner = BatchScanner::new(template, config.clone()).with_progress(tx);
    if let Some(reference) = reference {
        scanner = scanner.with_aligner(ImageAligner::from_path(reference, config.aligner)?);
    }

    let printer = thread::spawn(move || {
        for p in rx {
            eprint!("\r{:?}: {}/{}", p.stage, p.done, p.total);
        }
        eprintln!();
    });

    let start = Instant::now();
    let report = scanner.scan(dir);
    // Dropping the scanner closes the channel and ends the printer
    drop(scanner);
    let _ = printer.join();
    let report = report?;

    export::save_csv(&report, questions, output)?;
    print_summary(&report, output, start.elapsed().as_secs_f64());
    Ok(())
}

fn print_summary(report: &ScanReport, output: &Path, secs: f64) {
    println!(
        "Wrote {} rows to {} ({} failures) in {:.2}s",
        report.rows.len(),
        output.display(),
        report.failures.len(),
        secs
    );
    for warning in &report.warnings {
        match warning {
            ScanWarning::AlignmentMarkerMissing { marker } => {
                println!("  WARNING no alignment marker at {}", marker.display())
            }
            ScanWarning::NoiseSensitiveDetector { detector } => {
                println!("  WARNING {detector} detector accepts components of any size")
            }
        }
    }
    for failure in &report.failures {
        println!("  FAILED {} [{}]: {}", failure.path.display(), failure.kind, failure.message);
    }
    if report.cancelled {
        println!("  Run cancelled after {} images", report.attempted);
    }
}

fn inspect_cmd(template_path: &Path, image: &Path) -> Result<(), OmrError> {
    let template = TemplateStore::load(template_path)?;
    let gray = load_gray(image)?;
    println!("Image: {} ({}x{})", image.display(), gray.width(), gray.height());

    let row = extract_row(&gray, &template, &ScanConfig::from_env().detectors, image)?;
    for (name, value) in ScanReport::header(template.question_count())
        .iter()
        .zip(row.cells())
    {
        println!("  {name}: {value}");
    }
    Ok(())
}

fn check_template_cmd(template_path: &Path, reference: &Path) -> Result<(), OmrError> {
    let template = TemplateStore::load(template_path)?;
    let gray = load_gray(reference)?;
    template.ensure_scannable()?;
    template.check_bounds(gray.width(), gray.height())?;
    println!(
        "Template OK: series={} roll digits={} qbno digits={} questions={} (reference {}x{})",
        template.qpseries_region.is_some(),
        template.roll_number_regions.len(),
        template.qbno_regions.len(),
        template.question_count(),
        gray.width(),
        gray.height()
    );
    Ok(())
}
