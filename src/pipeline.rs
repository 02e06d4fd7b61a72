use crate::compress::compress_image;
use crate::error::MirrorError;
use crate::metadata::MetadataTool;
use crate::task::Task;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

/// What happened to a compressed file's metadata.
#[derive(Debug)]
pub enum MetadataStatus {
    Copied,
    /// Extraction failed or returned nothing; the output keeps default tags.
    Unavailable,
    /// Metadata handling was switched off.
    Disabled,
    Failed(MirrorError),
}

#[derive(Debug)]
pub enum TaskOutcome {
    Compressed { bytes: u64, metadata: MetadataStatus },
    Failed(MirrorError),
    Panicked(String),
}

#[derive(Debug)]
pub struct TaskReport {
    pub source: PathBuf,
    pub target: PathBuf,
    pub outcome: TaskOutcome,
}

impl TaskReport {
    pub fn is_compressed(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Compressed { .. })
    }

    pub fn metadata_copied(&self) -> bool {
        matches!(
            self.outcome,
            TaskOutcome::Compressed {
                metadata: MetadataStatus::Copied,
                ..
            }
        )
    }
}

/// Per-task collaborators shared read-only by every task of a batch.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    pub metadata: Option<MetadataTool>,
}

/// Compresses one image, then copies its metadata across.
///
/// Nothing escapes this function: errors and panics are logged against the
/// task's source path and folded into the returned report.
pub fn run_task(task: &Task, ctx: &TaskContext) -> TaskReport {
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| execute(task, ctx))) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            crate::error!("Error compressing {:?}: {}", task.source(), e);
            TaskOutcome::Failed(e)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            crate::error!("Panic while compressing {:?}: {}", task.source(), message);
            TaskOutcome::Panicked(message)
        }
    };

    TaskReport {
        source: task.source().to_path_buf(),
        target: task.target().to_path_buf(),
        outcome,
    }
}

/// Source file stem that makes a task panic in test builds.
#[cfg(test)]
pub(crate) const PANIC_TRIGGER: &str = "panic-in-task";

#[cfg(test)]
fn panic_if_triggered(task: &Task) {
    if task.source().file_stem() == Some(std::ffi::OsStr::new(PANIC_TRIGGER)) {
        panic!("task for {:?} panicked", task.source());
    }
}

#[cfg(not(test))]
fn panic_if_triggered(_task: &Task) {}

fn execute(task: &Task, ctx: &TaskContext) -> Result<TaskOutcome, MirrorError> {
    panic_if_triggered(task);
    let bytes = compress_image(task.source(), task.target(), task.quality())?;
    crate::verbose!("✔ Compressed and saved: {:?} ({} bytes)", task.target(), bytes);

    let metadata = match &ctx.metadata {
        None => MetadataStatus::Disabled,
        Some(tool) => copy_metadata(tool, task),
    };

    Ok(TaskOutcome::Compressed { bytes, metadata })
}

fn copy_metadata(tool: &MetadataTool, task: &Task) -> MetadataStatus {
    let Some(blob) = tool.extract(task.source()) else {
        return MetadataStatus::Unavailable;
    };

    match tool.inject(&blob, task.target()) {
        Ok(()) => {
            crate::verbose!("✔ Metadata copied to: {:?}", task.target());
            MetadataStatus::Copied
        }
        Err(e) => {
            crate::error!(
                "Error copying metadata from {:?} to {:?}: {}",
                task.source(),
                task.target(),
                e
            );
            MetadataStatus::Failed(e)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
