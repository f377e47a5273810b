//! Scratch space for a tarball build.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Prefix of the hidden working directory created next to the output.
pub const WORK_DIR_PREFIX: &str = ".srcball-";

/// `<parent>/.srcball-XXXX/<name>`, removed when dropped.
///
/// The working directory lives next to the output so the final rename and
/// archive stay on the same filesystem.
#[derive(Debug)]
pub struct WorkDir {
    root: TempDir,
    name: String,
}

impl WorkDir {
    /// Create the working directory and its `<name>` tree under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub fn new(parent: &Path, name: &str) -> std::io::Result<Self> {
        let root = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(parent)?;
        fs::create_dir_all(root.path().join(name))?;
        tracing::debug!(path = %root.path().display(), "created working directory");
        Ok(Self {
            root,
            name: name.to_string(),
        })
    }

    /// The hidden top-level directory.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// The `<name>` tree the sources are checked out into.
    pub fn tree(&self) -> PathBuf {
        self.root.path().join(&self.name)
    }
}
