use anyhow::{bail, Context, Result};
use clap::Parser;
use img_mirror::cli::{Args, Commands, MetadataArgs};
use img_mirror::logger::{self, Verbosity};
use img_mirror::paths::ensure_dir;
use img_mirror::{
    info, run_batch, run_task, BatchConfig, ExtensionSet, MetadataStatus, MetadataTool,
    Task, TaskContext, TaskOutcome,
};
use std::fs;
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::set_verbosity(Verbosity::from_flags(args.quiet, args.verbose));

    match args.command {
        Commands::Compress {
            input,
            output,
            quality,
            metadata,
        } => {
            compress_single(&input, &output, quality, &metadata)?;
        }
        Commands::Batch {
            source,
            target,
            quality,
            extensions,
            mode,
            jobs,
            follow_links,
            metadata,
        } => {
            let mut config = BatchConfig::new(&source, &target);
            config.quality = quality;
            config.extensions =
                ExtensionSet::new(&extensions).context("Invalid --extensions value")?;
            config.mode = mode.into();
            config.jobs = jobs;
            config.follow_links = follow_links;
            config.context = task_context(&metadata);

            run_batch(&config)
                .with_context(|| format!("Batch from {:?} to {:?} aborted", source, target))?;
        }
    }

    Ok(())
}

fn task_context(args: &MetadataArgs) -> TaskContext {
    if args.no_metadata {
        return TaskContext::default();
    }

    let mut tool = MetadataTool::new(args.exiftool.as_os_str());
    if let Some(dir) = &args.scratch_dir {
        tool = tool.with_scratch_dir(dir);
    }
    TaskContext {
        metadata: Some(tool),
    }
}

fn compress_single(input: &Path, output: &Path, quality: u8, metadata: &MetadataArgs) -> Result<()> {
    info!("🗜️  Compressing image: {:?}", input);
    info!("📁 Output: {:?}", output);

    let original_size = fs::metadata(input)
        .with_context(|| format!("Cannot read {:?}", input))?
        .len();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let task = Task::new(input, output, quality)?;
    let report = run_task(&task, &task_context(metadata));

    match report.outcome {
        TaskOutcome::Compressed { bytes, metadata } => {
            let ratio = if original_size > 0 {
                ((original_size as f64 - bytes as f64) / original_size as f64) * 100.0
            } else {
                0.0
            };
            info!("📊 Original size: {} bytes", original_size);
            info!("📈 Compressed size: {} bytes", bytes);
            info!("🎯 Compression ratio: {:.1}%", ratio);
            if let MetadataStatus::Copied = metadata {
                info!("✔ Metadata copied");
            }
            Ok(())
        }
        TaskOutcome::Failed(e) => Err(e).with_context(|| format!("Failed to compress {:?}", input)),
        TaskOutcome::Panicked(message) => bail!("Failed to compress {:?}: {}", input, message),
    }
}
