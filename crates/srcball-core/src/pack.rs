//! Packing the checked-out tree with the external `tar`.
//!
//! The sources go into an embedded `-source.tar.bz2` inside the working
//! tree, which is then wrapped, together with a copy of the shipped-locales
//! manifest, in the `.orig.tar.gz`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::BuildError;
use crate::exec;
use crate::layout::SourceLayout;
use crate::paths::{UPSTREAM_SHIPPED_LOCALES, embedded_tarball_name, orig_tarball_name};

/// `tar` arguments creating `archive_name` from the layout's include and
/// exclude tables. Paths are relative to the working tree.
pub fn embedded_tar_args(layout: &SourceLayout, archive_name: &str) -> Vec<String> {
    let src = &layout.source_dir;
    let mut args = vec!["-jvc".to_string(), "--exclude-vcs".to_string()];

    for exclude in &layout.exclude {
        args.push(
            if exclude.match_slash {
                "--wildcards-match-slash"
            } else {
                "--no-wildcards-match-slash"
            }
            .to_string(),
        );
        args.push("--exclude".to_string());
        args.push(format!("{src}/{}", exclude.pattern));
    }

    args.push("-f".to_string());
    args.push(archive_name.to_string());
    args.extend(layout.include.iter().map(|include| format!("{src}/{include}")));
    args
}

/// Pack the source directory into the embedded archive, keep a copy of the
/// shipped-locales manifest next to it and remove what was packed.
///
/// Returns the path of the embedded archive.
///
/// # Errors
///
/// Returns an error if `tar` fails or the tree cannot be rearranged.
pub fn pack_embedded_tar(
    layout: &SourceLayout,
    work_tree: &Path,
    repo_name: &str,
    version: &str,
) -> Result<PathBuf, BuildError> {
    let archive_name = embedded_tarball_name(repo_name, version);
    tracing::info!(archive = %archive_name, "packing embedded archive");

    exec::run(
        Command::new("tar")
            .args(embedded_tar_args(layout, &archive_name))
            .current_dir(work_tree),
        false,
    )?;

    let source_root = layout.source_root(work_tree);
    fs::copy(
        source_root.join(&layout.shipped_locales),
        work_tree.join(UPSTREAM_SHIPPED_LOCALES),
    )?;

    // Removed by hand: excluded files keep their directories non-empty.
    for include in &layout.include {
        let packed = work_tree.join(format!("{}/{include}", layout.source_dir));
        if packed.is_dir() {
            fs::remove_dir_all(&packed)?;
        } else if packed.exists() {
            fs::remove_file(&packed)?;
        }
    }

    Ok(work_tree.join(archive_name))
}

/// Rename `<work_root>/<name>` to `<name>-<version>` and archive it as
/// `<dest_dir>/<name>_<version>.orig.tar.gz`.
///
/// # Errors
///
/// Returns an error if the rename or `tar` fails.
pub fn pack_orig_source(
    work_root: &Path,
    name: &str,
    version: &str,
    dest_dir: &Path,
) -> Result<PathBuf, BuildError> {
    let versioned = format!("{name}-{version}");
    fs::rename(work_root.join(name), work_root.join(&versioned))?;

    let archive = dest_dir.join(orig_tarball_name(name, version));
    tracing::info!(archive = %archive.display(), "packing orig tarball");

    exec::run(
        Command::new("tar")
            .arg("-zcf")
            .arg(&archive)
            .arg(&versioned)
            .current_dir(work_root),
        false,
    )?;

    Ok(archive)
}
