use std::path::{Path, PathBuf};

/// Extract the last path segment from a repository URL.
pub fn filename_from_url(url: &str) -> &str {
    url.trim_end_matches('/').split('/').next_back().unwrap_or("")
}

/// Everything before the last path segment of a repository URL.
pub fn parent_url(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    trimmed.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Outer archive name: `<name>_<version>.orig.tar.gz`
pub fn orig_tarball_name(name: &str, version: &str) -> String {
    format!("{name}_{version}.orig.tar.gz")
}

/// Embedded archive name: `<name>-<version>-source.tar.bz2`
pub fn embedded_tarball_name(name: &str, version: &str) -> String {
    format!("{name}-{version}-source.tar.bz2")
}

/// Copy of the shipped-locales manifest kept next to the embedded archive.
pub const UPSTREAM_SHIPPED_LOCALES: &str = "upstream-shipped-locales";

/// Ledger of checked-out l10n changesets, relative to the source directory.
pub const CHANGESETS_LEDGER: &str = "l10n/changesets";
