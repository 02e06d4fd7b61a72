use crate::batch::Mode;
use crate::constants::{DEFAULT_METADATA_TOOL, DEFAULT_QUALITY};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-mirror",
    about = "Recompress a tree of images into a mirrored tree and carry their metadata over",
    long_about = "img-mirror walks a source directory, recompresses every image it finds and writes \
                  the result to the same relative path under a target directory. Tags are copied \
                  from each original onto its compressed copy with exiftool.",
    version,
    after_help = "EXAMPLES:\n  \
    img-mirror batch ~/Pictures /mnt/archive -q 70\n  \
    img-mirror batch ./photos ./photos-small -m sequential -e jpg,jpeg\n  \
    img-mirror compress IMG_0001.JPG small.jpg -q 60"
)]
pub struct Args {
    #[arg(long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Print a line for every processed file")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress a single image and copy its metadata",
        long_about = "Recompress one image to the given output path and copy its metadata. \
                      Fails if the image cannot be decoded or written; metadata problems are only reported."
    )]
    Compress {
        #[arg(help = "Input image file path")]
        input: PathBuf,

        #[arg(help = "Output image file path")]
        output: PathBuf,

        #[arg(
            short = 'q',
            long,
            default_value_t = DEFAULT_QUALITY,
            help = "Compression quality (1-100)",
            long_help = "Compression quality from 1 (smallest) to 100 (best). \
                         For PNG: >=90 uses Zopfli, >=70 uses high compression, <70 uses standard compression."
        )]
        quality: u8,

        #[command(flatten)]
        metadata: MetadataArgs,
    },

    #[command(
        about = "Compress every image under a directory into a mirrored tree",
        long_about = "Walk SOURCE recursively and write a compressed copy of every matching image \
                      to the same relative path under TARGET. Per-file failures are reported and skipped."
    )]
    Batch {
        #[arg(help = "Source directory")]
        source: PathBuf,

        #[arg(help = "Target directory (created if missing)")]
        target: PathBuf,

        #[arg(
            short = 'q',
            long,
            default_value_t = DEFAULT_QUALITY,
            help = "Compression quality (1-100)"
        )]
        quality: u8,

        #[arg(
            short = 'e',
            long,
            value_delimiter = ',',
            default_values = ["png", "jpg", "jpeg", "bmp", "gif"],
            help = "File extensions to process, comma separated (case-insensitive)"
        )]
        extensions: Vec<String>,

        #[arg(
            short = 'm',
            long,
            value_enum,
            default_value_t = ModeArg::Parallel,
            help = "Run files one at a time or on a worker pool"
        )]
        mode: ModeArg,

        #[arg(
            short = 'j',
            long,
            help = "Number of parallel workers (default: auto)",
            long_help = "Number of worker threads in parallel mode. \
                         If not specified, uses number of CPU cores."
        )]
        jobs: Option<usize>,

        #[arg(short = 'L', long, help = "Follow symbolic links while walking")]
        follow_links: bool,

        #[command(flatten)]
        metadata: MetadataArgs,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MetadataArgs {
    #[arg(
        long,
        default_value = DEFAULT_METADATA_TOOL,
        help = "Metadata tool used to read and write tags"
    )]
    pub exiftool: PathBuf,

    #[arg(long, help = "Do not copy metadata")]
    pub no_metadata: bool,

    #[arg(
        long,
        help = "Directory for temporary metadata files (default: system temp dir)"
    )]
    pub scratch_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Sequential,
    Parallel,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sequential => Mode::Sequential,
            ModeArg::Parallel => Mode::Parallel,
        }
    }
}
