//! Directory-level alignment and extraction.
//!
//! A run is split into two sequential passes so that no image is read while
//! the alignment pass is rewriting it:
//!
//! 1. optional alignment of every eligible scan against the reference image
//! 2. extraction of one [`ScanRow`] per (successfully aligned) scan
//!
//! Both passes fan out over a bounded rayon pool. Results are collected in
//! path order, so the table never depends on which worker finishes first.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::align::ImageAligner;
use crate::config::{ALIGNMENT_MARKER_CONTENT, ScanConfig};
use crate::error::{OmrError, Result};
use crate::models::{ScanFailure, ScanReport, ScanRow, ScanWarning, Template};
use crate::pipeline::SheetReader;
use crate::tools::{collect_front_images, load_gray};

/// Which pass a progress message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Registration against the reference image
    Align,
    /// Region reading
    Extract,
}

/// Incremental progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Current pass
    pub stage: Stage,
    /// Images finished in this pass
    pub done: usize,
    /// Images eligible in this pass
    pub total: usize,
}

/// Bounded channel for progress notifications
///
/// Messages are dropped instead of blocking when the receiver falls behind.
pub fn progress_channel(capacity: usize) -> (Sender<Progress>, Receiver<Progress>) {
    bounded(capacity.max(1))
}

/// Shared flag that stops a run from scheduling further images
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// New, not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; images already being processed still finish
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of an alignment pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignReport {
    /// Scans rewritten in reference geometry, in path order
    pub aligned: Vec<PathBuf>,
    /// Scans that could not be aligned, in path order
    pub failures: Vec<ScanFailure>,
    /// Number of scans a task was started for
    pub attempted: usize,
    /// The pass stopped early
    pub cancelled: bool,
}

/// Runs alignment and extraction over a directory of scans
pub struct BatchScanner {
    config: ScanConfig,
    template: Template,
    aligner: Option<ImageAligner>,
    progress: Option<Sender<Progress>>,
    cancel: CancelToken,
}

impl BatchScanner {
    /// Scanner for `template` without alignment
    pub fn new(template: Template, config: ScanConfig) -> Self {
        Self {
            config,
            template,
            aligner: None,
            progress: None,
            cancel: CancelToken::new(),
        }
    }

    /// Align every scan against this aligner's reference before extraction
    pub fn with_aligner(mut self, aligner: ImageAligner) -> Self {
        self.aligner = Some(aligner);
        self
    }

    /// Publish progress on `sender`
    pub fn with_progress(mut self, sender: Sender<Progress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that cancels this scanner's runs
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Configuration in use
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Align and/or extract every eligible scan in `dir`
    ///
    /// Returns `Err` only for run-level problems (incomplete template, region
    /// outside the reference image, unreadable directory). Per-image problems
    /// end up in [`ScanReport::failures`].
    pub fn scan(&self, dir: &Path) -> Result<ScanReport> {
        self.template.ensure_scannable()?;
        if let Some(aligner) = &self.aligner {
            let (width, height) = aligner.reference_dimensions();
            self.template.check_bounds(width, height)?;
        }

        let paths = collect_front_images(dir, &self.config.front_suffix)?;
        let pool = self.build_pool()?;
        info!(
            dir = %dir.display(),
            images = paths.len(),
            workers = self.config.workers,
            aligned = self.aligner.is_some(),
            "batch started"
        );

        let mut report = ScanReport::default();
        for detector in self.config.detectors.noise_sensitive() {
            warn!(detector, "detector accepts ink components of any size");
            report
                .warnings
                .push(ScanWarning::NoiseSensitiveDetector { detector });
        }

        let to_extract = match &self.aligner {
            Some(aligner) => {
                let aligned = self.align_pass(&pool, aligner, dir, &paths)?;
                report.attempted += aligned.failures.len();
                report.failures.extend(aligned.failures);
                if aligned.cancelled {
                    report.cancelled = true;
                    info!(attempted = report.attempted, "batch cancelled during alignment");
                    return Ok(report);
                }
                aligned.aligned
            }
            None => {
                let marker = dir.join(&self.config.alignment_marker);
                if !marker.exists() {
                    warn!(marker = %marker.display(), "alignment marker missing, scans may be unaligned");
                    report
                        .warnings
                        .push(ScanWarning::AlignmentMarkerMissing { marker });
                }
                paths
            }
        };

        let extracted = self.extract_pass(&pool, &to_extract);
        report.cancelled = self.cancel.is_cancelled();
        for slot in extracted.into_iter().flatten() {
            report.attempted += 1;
            match slot {
                Ok(row) => report.rows.push(row),
                Err(failure) => report.failures.push(failure),
            }
        }
        report.failures.sort_by(|a, b| a.path.cmp(&b.path));

        info!(
            rows = report.rows.len(),
            failures = report.failures.len(),
            cancelled = report.cancelled,
            "batch finished"
        );
        Ok(report)
    }

    /// Run only the alignment pass over `dir`
    pub fn align(&self, dir: &Path) -> Result<AlignReport> {
        let Some(aligner) = &self.aligner else {
            return Err(OmrError::alignment("no reference image configured"));
        };
        let paths = collect_front_images(dir, &self.config.front_suffix)?;
        let pool = self.build_pool()?;
        self.align_pass(&pool, aligner, dir, &paths)
    }

    fn build_pool(&self) -> Result<ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .build()
            .map_err(|e| OmrError::Io(std::io::Error::other(e)))
    }

    fn align_pass(
        &self,
        pool: &ThreadPool,
        aligner: &ImageAligner,
        dir: &Path,
        paths: &[PathBuf],
    ) -> Result<AlignReport> {
        let total = paths.len();
        let done = AtomicUsize::new(0);

        let slots: Vec<Option<std::result::Result<PathBuf, ScanFailure>>> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    let outcome = match aligner.align_file(path) {
                        Ok(_) => Ok(path.clone()),
                        Err(err) => {
                            warn!(path = %path.display(), error = %err, "alignment failed");
                            Err(ScanFailure::from_error(path, &err))
                        }
                    };
                    self.report_progress(Stage::Align, &done, total);
                    Some(outcome)
                })
                .collect()
        });

        let mut report = AlignReport {
            cancelled: self.cancel.is_cancelled(),
            ..AlignReport::default()
        };
        for slot in slots.into_iter().flatten() {
            report.attempted += 1;
            match slot {
                Ok(path) => report.aligned.push(path),
                Err(failure) => report.failures.push(failure),
            }
        }

        let marker = dir.join(&self.config.alignment_marker);
        if report.cancelled {
            info!("alignment cancelled, marker not written");
        } else if report.aligned.is_empty() && !report.failures.is_empty() {
            warn!(marker = %marker.display(), "no scan aligned, marker not written");
        } else {
            fs::write(&marker, ALIGNMENT_MARKER_CONTENT)?;
        }
        info!(
            aligned = report.aligned.len(),
            failures = report.failures.len(),
            cancelled = report.cancelled,
            "alignment pass finished"
        );
        Ok(report)
    }

    fn extract_pass(
        &self,
        pool: &ThreadPool,
        paths: &[PathBuf],
    ) -> Vec<Option<std::result::Result<ScanRow, ScanFailure>>> {
        let reader = SheetReader::new(&self.config.detectors);
        let total = paths.len();
        let done = AtomicUsize::new(0);

        pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    let outcome = load_gray(path)
                        .and_then(|image| reader.read(&image, &self.template, path))
                        .map_err(|err| {
                            warn!(path = %path.display(), error = %err, "extraction failed");
                            ScanFailure::from_error(path, &err)
                        });
                    self.report_progress(Stage::Extract, &done, total);
                    Some(outcome)
                })
                .collect()
        })
    }

    fn report_progress(&self, stage: Stage, done: &AtomicUsize, total: usize) {
        let done = done.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(sender) = &self.progress {
            // Full or disconnected: the observer misses this update
            let _ = sender.try_send(Progress { stage, done, total });
        }
    }
}

/// Align every eligible scan in `dir` against the image at `reference`
pub fn align_directory(reference: &Path, dir: &Path, config: &ScanConfig) -> Result<AlignReport> {
    let aligner = ImageAligner::from_path(reference, config.aligner)?;
    BatchScanner::new(Template::default(), config.clone())
        .with_aligner(aligner)
        .align(dir)
}
