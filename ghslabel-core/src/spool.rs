//! Print Spooler - render-surface lifecycle
//!
//! create -> populate -> await images -> print -> teardown. At most one
//! surface is alive; a new submit tears down the previous one. Teardown is
//! tied to a guard so no path leaves a surface behind.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::PrintDocument;

#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("Failed to create render surface: {0}")]
    Create(String),

    #[error("Failed to populate render surface: {0}")]
    Populate(String),

    #[error("Print invocation failed: {0}")]
    Print(String),

    #[error("I/O error for '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    Loaded,
    Failed,
    Pending,
}

/// A short-lived, isolated surface holding one document.
pub trait RenderSurface {
    fn id(&self) -> &str;
    fn populate(&mut self, document: &PrintDocument) -> Result<(), SpoolError>;
    /// `Loaded` and `Failed` are terminal.
    fn image_status(&mut self, src: &str) -> ImageStatus;
    fn print(&mut self) -> Result<(), SpoolError>;
    fn teardown(&mut self);
}

/// The host environment's print facility.
pub trait PrintHost {
    type Surface: RenderSurface;

    fn create_surface(&mut self, document: &PrintDocument) -> Result<Self::Surface, SpoolError>;
}

#[derive(Debug, Clone, Copy)]
pub struct SpoolTimings {
    /// Layout settle time when the document has no images.
    pub settle_delay: Duration,
    /// Upper bound on waiting for images; print proceeds afterwards.
    pub asset_timeout: Duration,
    pub poll_interval: Duration,
    /// How long a printed surface may linger before `reap` removes it.
    pub teardown_delay: Duration,
}

impl Default for SpoolTimings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(100),
            asset_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(25),
            teardown_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetReport {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintReceipt {
    pub surface_id: String,
    pub job_hash: String,
    pub unit_count: usize,
    pub page_count: usize,
    pub assets: AssetReport,
}

struct SurfaceGuard<S: RenderSurface> {
    surface: S,
    printed_at: Option<Instant>,
}

impl<S: RenderSurface> Drop for SurfaceGuard<S> {
    fn drop(&mut self) {
        tracing::debug!(surface = %self.surface.id(), "tearing down render surface");
        self.surface.teardown();
    }
}

pub struct PrintSpooler<H: PrintHost> {
    host: H,
    timings: SpoolTimings,
    active: Option<SurfaceGuard<H::Surface>>,
}

impl<H: PrintHost> PrintSpooler<H> {
    pub fn new(host: H, timings: SpoolTimings) -> Self {
        Self {
            host,
            timings,
            active: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn has_active_surface(&self) -> bool {
        self.active.is_some()
    }

    /// Print a document. `None` (nothing selected) is a no-op.
    pub fn submit(&mut self, document: Option<&PrintDocument>) -> Result<Option<PrintReceipt>, SpoolError> {
        let Some(document) = document else {
            tracing::debug!("nothing to print");
            return Ok(None);
        };

        // Last request wins.
        self.active = None;

        let mut guard = SurfaceGuard {
            surface: self.host.create_surface(document)?,
            printed_at: None,
        };
        let surface_id = guard.surface.id().to_string();
        tracing::info!(
            surface = %surface_id,
            job_hash = %document.job_hash,
            pages = document.page_count,
            "print job started"
        );

        guard.surface.populate(document)?;
        let assets = self.await_assets(&mut guard.surface, &document.image_sources);
        guard.surface.print()?;
        guard.printed_at = Some(Instant::now());

        tracing::info!(surface = %surface_id, loaded = assets.loaded, failed = assets.failed, "print invoked");

        if !self.timings.teardown_delay.is_zero() {
            self.active = Some(guard);
        }

        Ok(Some(PrintReceipt {
            surface_id,
            job_hash: document.job_hash.clone(),
            unit_count: document.unit_count,
            page_count: document.page_count,
            assets,
        }))
    }

    /// Drop a lingering surface once its teardown delay has elapsed.
    /// Returns whether a surface was removed.
    pub fn reap(&mut self) -> bool {
        let expired = self
            .active
            .as_ref()
            .and_then(|g| g.printed_at)
            .is_some_and(|at| at.elapsed() >= self.timings.teardown_delay);
        if expired {
            self.active = None;
        }
        expired
    }

    /// Failed images count as ready; a broken asset never blocks printing.
    fn await_assets(&self, surface: &mut H::Surface, sources: &[String]) -> AssetReport {
        if sources.is_empty() {
            if !self.timings.settle_delay.is_zero() {
                thread::sleep(self.timings.settle_delay);
            }
            return AssetReport::default();
        }

        let deadline = Instant::now() + self.timings.asset_timeout;
        let mut statuses = vec![ImageStatus::Pending; sources.len()];
        loop {
            for (status, src) in statuses.iter_mut().zip(sources) {
                if *status == ImageStatus::Pending {
                    *status = surface.image_status(src);
                }
            }
            let pending = statuses.iter().any(|s| *s == ImageStatus::Pending);
            if !pending || Instant::now() >= deadline {
                break;
            }
            thread::sleep(self.timings.poll_interval);
        }

        let count = |wanted: ImageStatus| statuses.iter().filter(|s| **s == wanted).count();
        let report = AssetReport {
            total: sources.len(),
            loaded: count(ImageStatus::Loaded),
            failed: count(ImageStatus::Failed),
            pending: count(ImageStatus::Pending),
        };
        if report.failed > 0 {
            tracing::warn!(failed = report.failed, "some label images failed to load, printing placeholders");
        }
        if report.pending > 0 {
            tracing::warn!(pending = report.pending, "image wait timed out, printing anyway");
        }
        report
    }
}

/// Host that stages documents in a spool directory and "prints" by
/// copying the staged document to an output path.
pub struct FileHost {
    spool_dir: PathBuf,
    output: PathBuf,
    asset_root: PathBuf,
}

impl FileHost {
    pub fn new(spool_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let output = output.into();
        let asset_root = output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            spool_dir: spool_dir.into(),
            output,
            asset_root,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }
}

impl PrintHost for FileHost {
    type Surface = FileSurface;

    fn create_surface(&mut self, document: &PrintDocument) -> Result<FileSurface, SpoolError> {
        fs::create_dir_all(&self.spool_dir).map_err(|e| SpoolError::Io(self.spool_dir.clone(), e))?;
        let prefix = document.job_hash.get(..12).unwrap_or(&document.job_hash);
        let id = format!("{prefix}-{}", Uuid::new_v4());
        let staging = self.spool_dir.join(format!("{id}.html"));
        Ok(FileSurface {
            id,
            staging,
            output: self.output.clone(),
            asset_root: self.asset_root.clone(),
        })
    }
}

pub struct FileSurface {
    id: String,
    staging: PathBuf,
    output: PathBuf,
    asset_root: PathBuf,
}

impl FileSurface {
    pub fn staging_path(&self) -> &Path {
        &self.staging
    }
}

impl RenderSurface for FileSurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn populate(&mut self, document: &PrintDocument) -> Result<(), SpoolError> {
        fs::write(&self.staging, &document.html).map_err(|e| SpoolError::Populate(e.to_string()))
    }

    /// Remote and inline images resolve in the viewer. Other sources are
    /// site-relative paths looked up next to the output file.
    fn image_status(&mut self, src: &str) -> ImageStatus {
        if src.starts_with("data:") || src.starts_with("http://") || src.starts_with("https://") {
            return ImageStatus::Loaded;
        }
        let path = match src.strip_prefix("file://") {
            Some(absolute) => PathBuf::from(absolute),
            None => self.asset_root.join(src.trim_start_matches('/')),
        };
        if path.exists() {
            ImageStatus::Loaded
        } else {
            ImageStatus::Failed
        }
    }

    fn print(&mut self) -> Result<(), SpoolError> {
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SpoolError::Io(parent.to_path_buf(), e))?;
        }
        fs::copy(&self.staging, &self.output)
            .map(|_| ())
            .map_err(|e| SpoolError::Print(format!("{}: {e}", self.output.display())))
    }

    fn teardown(&mut self) {
        match fs::remove_file(&self.staging) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.staging.display(), error = %e, "failed to remove staged document"),
        }
    }
}
