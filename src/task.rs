use crate::constants::{MAX_QUALITY, MIN_QUALITY};
use crate::error::{MirrorError, Result};
use std::path::{Path, PathBuf};

/// One source image mapped to one target image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    source: PathBuf,
    target: PathBuf,
    quality: u8,
}

impl Task {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>, quality: u8) -> Result<Self> {
        validate_quality(quality)?;
        Ok(Self {
            source: source.into(),
            target: target.into(),
            quality,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

pub fn validate_quality(quality: u8) -> Result<u8> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        return Err(MirrorError::InvalidQuality(quality));
    }
    Ok(quality)
}
