use crate::constants::{DEFAULT_METADATA_TOOL, SCRATCH_FILE_PREFIX, SCRATCH_FILE_SUFFIX};
use crate::error::{MirrorError, Result};
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::Builder;

/// Serialized tag document as printed by `exiftool -json`. Never inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBlob(String);

impl MetadataBlob {
    /// Wraps tool output; blank output means there is nothing to copy.
    pub fn from_output(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Handle on the external metadata tool, run once per call with no timeout.
#[derive(Debug, Clone)]
pub struct MetadataTool {
    program: OsString,
    leading_args: Vec<OsString>,
    scratch_dir: PathBuf,
}

impl Default for MetadataTool {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_TOOL)
    }
}

impl MetadataTool {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Arguments placed before the tool's own, e.g. `perl` + `["exiftool"]`.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Directory where side-channel files are created.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn run<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .output()
            .map_err(|e| MirrorError::ToolUnavailable {
                tool: self.name(),
                source: e,
            })
    }

    fn check(&self, output: &Output, path: &Path) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }
        Err(MirrorError::ExternalTool {
            tool: self.name(),
            path: path.to_path_buf(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Runs `-json <source>` and returns the captured document.
    ///
    /// `Ok(None)` means the tool succeeded but printed nothing.
    pub fn try_extract(&self, source: &Path) -> Result<Option<MetadataBlob>> {
        let output = self.run([OsStr::new("-json"), source.as_os_str()])?;
        self.check(&output, source)?;
        Ok(MetadataBlob::from_output(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    /// Like [`MetadataTool::try_extract`], but a failing or missing tool is
    /// logged against `source` and reported as "no metadata available".
    pub fn extract(&self, source: &Path) -> Option<MetadataBlob> {
        match self.try_extract(source) {
            Ok(blob) => {
                if blob.is_none() {
                    crate::verbose!("No metadata reported for {:?}", source);
                }
                blob
            }
            Err(e) => {
                crate::error!("Error extracting metadata for {:?}: {}", source, e);
                None
            }
        }
    }

    /// Hands `blob` to the tool through a side-channel file and copies its
    /// tags onto `target` in place.
    ///
    /// The side-channel file is created exclusively, so concurrent tasks never
    /// share one, and it is removed on every exit path.
    pub fn inject(&self, blob: &MetadataBlob, target: &Path) -> Result<()> {
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = format!("{}{}-", SCRATCH_FILE_PREFIX, stem);

        let mut scratch = Builder::new()
            .prefix(&prefix)
            .suffix(SCRATCH_FILE_SUFFIX)
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| MirrorError::filesystem(&self.scratch_dir, e))?;
        let scratch_path = scratch.path().to_path_buf();

        scratch
            .write_all(blob.as_str().as_bytes())
            .and_then(|_| scratch.flush())
            .map_err(|e| MirrorError::filesystem(&scratch_path, e))?;

        let invoked = self
            .run([
                OsStr::new("-overwrite_original"),
                OsStr::new("-tagsFromFile"),
                scratch_path.as_os_str(),
                target.as_os_str(),
            ])
            .and_then(|output| self.check(&output, target));

        let removed = scratch
            .close()
            .map_err(|e| MirrorError::filesystem(&scratch_path, e));

        invoked.and(removed)
    }
}
