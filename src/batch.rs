use crate::compress::probe_image;
use crate::constants::PROGRESS_BAR_TEMPLATE;
use crate::error::{MirrorError, Result};
use crate::paths::{ensure_dir, prepare_target};
use crate::pipeline::{run_task, TaskContext, TaskReport};
use crate::task::{validate_quality, Task};
use crate::walker::{ExtensionSet, ImageWalker};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One file at a time in traversal order, with per-file logging.
    Sequential,
    /// Full traversal first, then a fixed-size worker pool.
    #[default]
    Parallel,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub source_root: PathBuf,
    pub target_root: PathBuf,
    pub quality: u8,
    pub extensions: ExtensionSet,
    pub mode: Mode,
    /// Worker count for [`Mode::Parallel`]; `None` means available parallelism.
    pub jobs: Option<usize>,
    pub follow_links: bool,
    pub context: TaskContext,
}

impl BatchConfig {
    pub fn new(source_root: impl Into<PathBuf>, target_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            target_root: target_root.into(),
            quality: crate::constants::DEFAULT_QUALITY,
            extensions: ExtensionSet::default(),
            mode: Mode::default(),
            jobs: None,
            follow_links: false,
            context: TaskContext::default(),
        }
    }

    fn walker(&self) -> ImageWalker {
        let walker = ImageWalker::new(&self.source_root, self.extensions.clone())
            .follow_links(self.follow_links);
        match self.nested_target() {
            Some(nested) => walker.exclude(nested),
            None => walker,
        }
    }

    /// The target root spelled relative to the source root, when the target
    /// lives inside the source tree. Outputs there must not be walked again.
    fn nested_target(&self) -> Option<PathBuf> {
        let source = self.source_root.canonicalize().ok()?;
        let target = self.target_root.canonicalize().ok()?;
        let relative = target.strip_prefix(&source).ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.source_root.join(relative))
    }
}

/// Totals for one batch run.
///
/// `compressed` counts images written whatever happened to their metadata;
/// `metadata_copied` counts only files whose tags were also copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub discovered: usize,
    pub compressed: usize,
    pub metadata_copied: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    fn record(&mut self, report: &TaskReport) {
        if report.is_compressed() {
            self.compressed += 1;
        } else {
            self.failed += 1;
        }
        if report.metadata_copied() {
            self.metadata_copied += 1;
        }
    }

    fn print(&self) {
        crate::info!("\n📊 Batch Summary:");
        crate::info!("  📁 Files found: {}", self.discovered);
        crate::info!("  ✔ Total files processed: {}", self.compressed);
        crate::info!("  🏷️  Metadata copied: {}", self.metadata_copied);
        if self.failed > 0 {
            crate::info!("  ⚠️  Failed files: {}", self.failed);
        }
        crate::info!("  ⏱️  Total time elapsed: {:.2} seconds", self.elapsed.as_secs_f64());
    }
}

/// Checks the roots before any task runs. Only these conditions abort a batch.
fn prepare_roots(config: &BatchConfig) -> Result<()> {
    validate_quality(config.quality)?;
    if !config.source_root.is_dir() {
        return Err(MirrorError::SourceNotFound(config.source_root.clone()));
    }
    ensure_dir(&config.target_root)
}

/// Runs the batch with the driver selected by `config.mode`.
pub fn run_batch(config: &BatchConfig) -> Result<BatchSummary> {
    match config.mode {
        Mode::Sequential => run_sequential(config),
        Mode::Parallel => run_parallel(config),
    }
}

/// Processes files one at a time in traversal order.
///
/// Each file is probed before its target directory is created, and a
/// cumulative count with elapsed time is printed whenever the walk leaves a
/// directory.
///
/// # Arguments
/// * `config` - Roots, quality, allowlist and metadata tool for the batch
///
/// # Returns
/// * `Ok(BatchSummary)` - Counters for the run; per-file failures are included here
/// * `Err(MirrorError)` - If the quality is invalid, the source is missing or the target root cannot be created
pub fn run_sequential(config: &BatchConfig) -> Result<BatchSummary> {
    prepare_roots(config)?;
    crate::info!("🚀 Starting sequential compression...");
    crate::info!("📁 Source: {:?}", config.source_root);
    crate::info!("📁 Target: {:?}", config.target_root);

    let start_time = Instant::now();
    let mut summary = BatchSummary::default();
    let mut current_dir: Option<PathBuf> = None;

    for entry in config.walker().walk() {
        let source = match entry {
            Ok(path) => path,
            Err(e) => {
                crate::error!("Error walking {:?}: {}", config.source_root, e);
                continue;
            }
        };

        let dir = source.parent().map(Path::to_path_buf);
        if current_dir.is_some() && current_dir != dir {
            print_directory_progress(&summary, start_time);
        }
        current_dir = dir;
        summary.discovered += 1;

        let task = match plan_sequential(config, &source) {
            Ok(task) => task,
            Err(e) => {
                crate::error!("Error processing {:?}: {}", source, e);
                summary.failed += 1;
                continue;
            }
        };

        let report = run_task(&task, &config.context);
        summary.record(&report);
        if report.is_compressed() {
            crate::info!("✔ Compressed and saved: {:?}", report.target);
            if report.metadata_copied() {
                crate::info!("✔ Metadata copied");
            }
            crate::info!("✔ Files processed so far: {}", summary.compressed);
        }
    }

    if current_dir.is_some() {
        print_directory_progress(&summary, start_time);
    }

    summary.elapsed = start_time.elapsed();
    summary.print();
    Ok(summary)
}

/// Rejects undecodable files before any target directory is created for them.
fn plan_sequential(config: &BatchConfig, source: &Path) -> Result<Task> {
    probe_image(source)?;
    let target = prepare_target(&config.source_root, &config.target_root, source)?;
    Task::new(source, target, config.quality)
}

fn print_directory_progress(summary: &BatchSummary, start_time: Instant) {
    crate::info!("✔ Total files processed: {}", summary.compressed);
    crate::info!(
        "✔ Total time elapsed: {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );
}

/// Walks the whole tree, creating target directories as it goes, and returns
/// the tasks to dispatch together with the number of files that could not be
/// mapped.
///
/// Traversal errors are logged and not counted; they do not name a file.
pub fn collect_tasks(config: &BatchConfig) -> (Vec<Task>, usize) {
    let mut tasks = Vec::new();
    let mut skipped = 0;

    for entry in config.walker().walk() {
        let source = match entry {
            Ok(path) => path,
            Err(e) => {
                crate::error!("Error walking {:?}: {}", config.source_root, e);
                continue;
            }
        };

        let planned = prepare_target(&config.source_root, &config.target_root, &source)
            .and_then(|target| Task::new(&source, target, config.quality));
        match planned {
            Ok(task) => tasks.push(task),
            Err(e) => {
                crate::error!("Error processing {:?}: {}", source, e);
                skipped += 1;
            }
        }
    }

    (tasks, skipped)
}

/// Collects every task up front, then runs them on a pool of `config.jobs`
/// workers (all cores when unset) behind a progress bar.
///
/// # Arguments
/// * `config` - Roots, quality, allowlist, worker count and metadata tool for the batch
///
/// # Returns
/// * `Ok(BatchSummary)` - Counters for the run; per-file failures are included here
/// * `Err(MirrorError)` - If the quality is invalid, the source is missing or the target root cannot be created
pub fn run_parallel(config: &BatchConfig) -> Result<BatchSummary> {
    prepare_roots(config)?;
    crate::info!("🚀 Starting batch compression...");
    crate::info!("📁 Source: {:?}", config.source_root);
    crate::info!("📁 Target: {:?}", config.target_root);

    let start_time = Instant::now();

    let (tasks, skipped) = collect_tasks(config);
    let mut summary = BatchSummary {
        discovered: tasks.len() + skipped,
        failed: skipped,
        ..BatchSummary::default()
    };

    if tasks.is_empty() {
        crate::warn!("No image files found under {:?}", config.source_root);
        summary.elapsed = start_time.elapsed();
        summary.print();
        return Ok(summary);
    }

    let jobs = config.jobs.unwrap_or_else(num_cpus::get).max(1);
    crate::info!("📊 Found {} image files to process", tasks.len());
    crate::info!("⚙️  Using {} parallel workers", jobs);

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            crate::warn!("Failed to build worker pool, falling back to the global pool: {}", e);
            None
        }
    };

    let progress = if crate::logger::is_quiet() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(tasks.len() as u64)
    };
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE) {
        progress.set_style(style.progress_chars("#>-"));
    }

    let dispatch = || -> Vec<TaskReport> {
        tasks
            .par_iter()
            .map(|task| {
                let report = run_task(task, &config.context);
                progress.inc(1);
                report
            })
            .collect()
    };
    let reports = match &pool {
        Some(pool) => pool.install(dispatch),
        None => dispatch(),
    };

    progress.finish_with_message("✅ Batch compression complete");

    for report in &reports {
        summary.record(report);
    }
    summary.elapsed = start_time.elapsed();
    summary.print();

    Ok(summary)
}
