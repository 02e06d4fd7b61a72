pub mod logger;

pub mod batch;
pub mod cli;
pub mod compress;
pub mod constants;
pub mod error;
pub mod metadata;
pub mod paths;
pub mod pipeline;
pub mod task;
pub mod walker;

pub use batch::{run_batch, run_parallel, run_sequential, BatchConfig, BatchSummary, Mode};
pub use compress::{compress_image, normalize, probe_image};
pub use error::{MirrorError, Result};
pub use metadata::{MetadataBlob, MetadataTool};
pub use paths::{ensure_dir, mirror_dir, prepare_target};
pub use pipeline::{run_task, MetadataStatus, TaskContext, TaskOutcome, TaskReport};
pub use task::Task;
pub use walker::{ExtensionSet, ImageWalker};
