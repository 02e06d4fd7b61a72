pub const DEFAULT_QUALITY: u8 = 70;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// Extensions visited when the user does not pass `--extensions`.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

pub const DEFAULT_METADATA_TOOL: &str = "exiftool";

pub const SCRATCH_FILE_PREFIX: &str = "img-mirror-meta-";
// exiftool picks the JSON reader for -tagsFromFile by extension.
pub const SCRATCH_FILE_SUFFIX: &str = ".json";

pub const OXIPNG_PRESET: u8 = 4;
pub const ZOPFLI_QUALITY_THRESHOLD: u8 = 90;
pub const HIGH_EFFORT_QUALITY_THRESHOLD: u8 = 70;
pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";
