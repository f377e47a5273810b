//! Pull a single file back out of a source tarball.
//!
//! The outer `.orig.tar.gz` carries a few files directly under its
//! top-level directory and everything else inside an embedded
//! `-source.tar.bz2`. Lookups try the direct location first and fall back
//! to the embedded archive. All staging happens in [`TempDir`]s, which are
//! removed whichever way the lookup ends.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;

use crate::io::archive;

/// Extension identifying the embedded archive (and auto-discovered archives).
pub const INNER_ARCHIVE_EXTENSION: &str = "bz2";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No valid tar file found")]
    NoArchiveFound,

    #[error("File {0} not found in archive")]
    FileNotFoundInArchive(String),

    #[error(
        "IOError occurred whilst extracting file from archive: [Errno: {}] {message}{}",
        describe_errno(*.errno),
        describe_filename(.filename.as_deref())
    )]
    IoFailure {
        errno: Option<i32>,
        message: String,
        filename: Option<PathBuf>,
    },

    #[error("Unexpected error")]
    UnexpectedFailure { detail: String },

    #[error("File not found and no valid embedded tar file found in source tarball")]
    NotFound,

    #[error("Input filename shouldn't be absolute")]
    AbsolutePath,
}

fn describe_errno(errno: Option<i32>) -> String {
    errno.map_or_else(|| "None".to_string(), |e| e.to_string())
}

fn describe_filename(filename: Option<&Path>) -> String {
    filename.map_or_else(String::new, |f| format!(": '{}'", f.display()))
}

impl ExtractError {
    /// Classify an IO error: OS-level failures keep their errno and the
    /// file involved, anything else (corrupt or truncated archives) is
    /// unexpected.
    pub fn from_io(err: &io::Error, filename: Option<&Path>) -> Self {
        match err.raw_os_error() {
            Some(code) => {
                let message = err.to_string();
                let message = message
                    .strip_suffix(&format!(" (os error {code})"))
                    .unwrap_or(&message)
                    .to_string();
                Self::IoFailure {
                    errno: Some(code),
                    message,
                    filename: filename.map(Path::to_path_buf),
                }
            }
            None => Self::UnexpectedFailure {
                detail: err.to_string(),
            },
        }
    }
}

/// What to extract, and where.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Member path, relative to the archive's layout.
    pub path: PathBuf,
    /// Directory receiving `<dest>/<basename(path)>`.
    pub dest: PathBuf,
    /// Explicit outer archive; when `None` one is discovered in `search_dir`.
    pub archive: Option<PathBuf>,
    pub search_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The destination already had the file; nothing was opened.
    AlreadyPresent(PathBuf),
    Extracted(PathBuf),
}

impl ExtractOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyPresent(p) | Self::Extracted(p) => p,
        }
    }
}

fn staging_dir() -> Result<TempDir, ExtractError> {
    tempfile::Builder::new()
        .prefix("srcball-extract-")
        .tempdir()
        .map_err(|e| ExtractError::from_io(&e, None))
}

fn member_basename(member: &str) -> Result<&str, ExtractError> {
    Path::new(member)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ExtractError::FileNotFoundInArchive(member.to_string()))
}

/// Find the archive to read when none was given: the first `*.bz2` in
/// `dir`, in sorted order.
///
/// # Errors
///
/// Returns [`ExtractError::NoArchiveFound`] when nothing matches.
pub fn discover_archive(dir: &Path) -> Result<PathBuf, ExtractError> {
    let dir = dir.to_str().ok_or_else(|| ExtractError::UnexpectedFailure {
        detail: format!("non UTF-8 search directory {}", dir.display()),
    })?;
    let pattern = format!(
        "{}/*.{INNER_ARCHIVE_EXTENSION}",
        glob::Pattern::escape(dir)
    );

    let mut candidates: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| ExtractError::UnexpectedFailure {
            detail: e.to_string(),
        })?
        .filter_map(Result::ok)
        .collect();
    candidates.sort();

    if candidates.len() > 1 {
        tracing::warn!(
            count = candidates.len(),
            "several archives found, using the first"
        );
    }
    candidates.into_iter().next().ok_or(ExtractError::NoArchiveFound)
}

/// Extract `member` from `archive` into `<dest>/<basename(member)>`.
///
/// # Errors
///
/// Returns [`ExtractError::FileNotFoundInArchive`] if the member is absent,
/// or an IO classification of any read/write failure.
pub fn extract_file_from_archive(
    member: &str,
    dest: &Path,
    archive: &Path,
) -> Result<PathBuf, ExtractError> {
    let name = member_basename(member)?;
    let staging = staging_dir()?;
    let staged = staging.path().join(name);

    let found = archive::unpack_member(archive, member, &staged)
        .map_err(|e| ExtractError::from_io(&e, Some(archive)))?;
    if !found {
        return Err(ExtractError::FileNotFoundInArchive(member.to_string()));
    }

    let target = dest.join(name);
    fs::copy(&staged, &target).map_err(|e| ExtractError::from_io(&e, Some(&target)))?;
    Ok(target)
}

/// Top-level directory of an archive, taken from its first member.
fn top_level_dir(names: &[String]) -> Option<&str> {
    names
        .first()
        .and_then(|n| n.split('/').next())
        .filter(|top| !top.is_empty())
}

/// Try `<top>/<member>` in the outer archive.
///
/// # Errors
///
/// Returns an error if the member is listed but cannot be extracted.
pub fn extract_direct(
    archive: &Path,
    names: &[String],
    member: &str,
    dest: &Path,
) -> Result<Option<PathBuf>, ExtractError> {
    let Some(top) = top_level_dir(names) else {
        return Ok(None);
    };
    let candidate = format!("{top}/{member}");
    if !names.iter().any(|n| *n == candidate) {
        return Ok(None);
    }
    extract_file_from_archive(&candidate, dest, archive).map(Some)
}

/// The first member that looks like an embedded archive.
pub fn find_inner_archive(names: &[String]) -> Option<&str> {
    names
        .iter()
        .find(|n| {
            Path::new(n.as_str())
                .extension()
                .is_some_and(|ext| ext == INNER_ARCHIVE_EXTENSION)
        })
        .map(String::as_str)
}

/// Extract `member` from an explicit outer archive, descending into the
/// embedded archive when it is not found directly.
///
/// # Errors
///
/// Returns [`ExtractError::NotFound`] when neither a direct match nor an
/// embedded archive exists, or any error from the extraction itself.
pub fn extract_nested(member: &str, dest: &Path, archive: &Path) -> Result<PathBuf, ExtractError> {
    let names =
        archive::member_names(archive).map_err(|e| ExtractError::from_io(&e, Some(archive)))?;

    if let Some(path) = extract_direct(archive, &names, member, dest)? {
        return Ok(path);
    }

    let inner = find_inner_archive(&names).ok_or(ExtractError::NotFound)?;
    tracing::debug!(%inner, "descending into embedded archive");

    let staging = staging_dir()?;
    let staged_inner = staging.path().join(member_basename(inner)?);
    let found = archive::unpack_member(archive, inner, &staged_inner)
        .map_err(|e| ExtractError::from_io(&e, Some(archive)))?;
    if !found {
        return Err(ExtractError::NotFound);
    }

    extract_file_from_archive(member, dest, &staged_inner)
}

/// Run a whole extraction request.
///
/// # Errors
///
/// Returns [`ExtractError::AbsolutePath`] before touching the filesystem
/// if the requested path is absolute, and otherwise any extraction error.
pub fn extract_file(req: &ExtractRequest) -> Result<ExtractOutcome, ExtractError> {
    if req.path.has_root() {
        return Err(ExtractError::AbsolutePath);
    }

    let member = req.path.to_str().ok_or_else(|| ExtractError::UnexpectedFailure {
        detail: format!("non UTF-8 path {}", req.path.display()),
    })?;
    let target = req.dest.join(member_basename(member)?);
    if target.exists() {
        return Ok(ExtractOutcome::AlreadyPresent(target));
    }

    fs::create_dir_all(&req.dest).map_err(|e| ExtractError::from_io(&e, Some(&req.dest)))?;

    let extracted = match &req.archive {
        Some(archive) => extract_nested(member, &req.dest, archive)?,
        None => {
            let archive = discover_archive(&req.search_dir)?;
            extract_file_from_archive(member, &req.dest, &archive)?
        }
    };
    Ok(ExtractOutcome::Extracted(extracted))
}
