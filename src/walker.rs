use crate::constants::DEFAULT_IMAGE_EXTENSIONS;
use crate::error::{MirrorError, Result};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Case-insensitive allowlist of file extensions, stored lowercase without dots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: Vec<String>,
}

impl ExtensionSet {
    /// Builds an allowlist from user input such as `["JPG", ".png"]`.
    ///
    /// Blank entries are ignored; an allowlist with nothing left in it is rejected.
    pub fn new<I, S>(extensions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
            if ext.is_empty() {
                continue;
            }
            if ext.contains(['/', '\\', '.']) {
                return Err(MirrorError::InvalidExtension(ext));
            }
            if !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }

        if normalized.is_empty() {
            return Err(MirrorError::InvalidExtension(
                "at least one extension is required".to_string(),
            ));
        }

        Ok(Self {
            extensions: normalized,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext_lower)
            })
            .unwrap_or(false)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.extensions
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// Recursive traversal of a source root that yields allowlisted files.
///
/// Each call to [`ImageWalker::walk`] starts a fresh traversal. Within a
/// directory, files come before subdirectories and both are sorted by name,
/// so all candidates of one directory are yielded contiguously.
///
/// Symlinks to files are always yielded. Symlinked directories are not
/// descended into unless [`ImageWalker::follow_links`] is set; in that case
/// `walkdir` reports a link cycle as an error entry instead of descending
/// forever.
#[derive(Debug, Clone)]
pub struct ImageWalker {
    root: PathBuf,
    extensions: ExtensionSet,
    follow_links: bool,
    excluded: Option<PathBuf>,
}

impl ImageWalker {
    pub fn new(root: impl Into<PathBuf>, extensions: ExtensionSet) -> Self {
        Self {
            root: root.into(),
            extensions,
            follow_links: false,
            excluded: None,
        }
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Skips a subtree entirely, given as a path under the walker's root.
    pub fn exclude(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded = Some(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walks the tree. Traversal errors are yielded in place so the
    /// caller can log them and keep going.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by(files_first)
            .into_iter()
            .filter_entry(move |entry| Some(entry.path()) != self.excluded.as_deref())
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if is_file_entry(&entry) && self.extensions.matches(path) {
                        Some(Ok(entry.into_path()))
                    } else {
                        None
                    }
                }
                Err(e) => Some(Err(MirrorError::Walk(e))),
            })
    }
}

/// Regular files, plus symlinks that resolve to one. Links to directories are
/// only descended into when the walk follows links.
fn is_file_entry(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    a_dir
        .cmp(&b_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}
