//! Test doubles shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{BuildError, CommandError};
use crate::vcs::{Changeset, Vcs};

/// In-memory stand-in for Mercurial.
///
/// Clones create the destination directory with an `.hg` marker, so that
/// `is_repo` and the filesystem side effects look like the real thing.
#[derive(Debug, Default)]
pub(crate) struct FakeVcs {
    /// Sources whose clone exits non-zero because the repository is absent.
    pub(crate) missing_sources: HashSet<String>,
    /// Sources whose clone exits non-zero with the given output.
    pub(crate) aborting_sources: HashMap<String, String>,
    /// Revisions `update -r` rejects.
    pub(crate) missing_revs: HashSet<String>,
    /// Tip reported per repository directory name; falls back to `default_tip`.
    pub(crate) tips: HashMap<String, Changeset>,
    pub(crate) default_tip: Option<Changeset>,
    /// Sources that fail with a spawn error rather than a non-zero exit.
    pub(crate) broken_sources: HashSet<String>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeVcs {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn failed(command: String, output: &str) -> BuildError {
        BuildError::Command(CommandError::Failed {
            command,
            code: Some(255),
            output: output.to_string(),
        })
    }
}

impl Vcs for FakeVcs {
    fn clone_repo(&self, source: &str, dest: &Path) -> Result<(), BuildError> {
        self.record(format!("clone {source} {}", dest.display()));
        if self.broken_sources.contains(source) {
            return Err(BuildError::Command(CommandError::Spawn {
                command: format!("hg clone {source}"),
                source: std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full"),
            }));
        }
        if self.missing_sources.contains(source) {
            return Err(Self::failed(
                format!("hg clone {source}"),
                "abort: HTTP Error 404: Not Found\n",
            ));
        }
        if let Some(output) = self.aborting_sources.get(source) {
            return Err(Self::failed(format!("hg clone {source}"), output));
        }
        std::fs::create_dir_all(dest.join(".hg"))?;
        Ok(())
    }

    fn update(&self, repo: &Path, rev: Option<&str>) -> Result<(), BuildError> {
        self.record(format!("update {} {}", repo.display(), rev.unwrap_or("tip")));
        match rev {
            Some(r) if self.missing_revs.contains(r) => {
                Err(Self::failed(
                    format!("hg update -r {r}"),
                    &format!("abort: unknown revision '{r}'!\n"),
                ))
            }
            _ => Ok(()),
        }
    }

    fn pull(&self, repo: &Path, source: &str) -> Result<(), BuildError> {
        self.record(format!("pull {} {source}", repo.display()));
        Ok(())
    }

    fn is_repo(&self, repo: &Path) -> Result<bool, BuildError> {
        Ok(repo.join(".hg").is_dir())
    }

    fn tip(&self, repo: &Path) -> Result<Changeset, BuildError> {
        let name = repo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.tips
            .get(&name)
            .or(self.default_tip.as_ref())
            .cloned()
            .ok_or_else(|| Self::failed("hg tip".to_string(), "abort: no repository found\n"))
    }
}

/// Write a tar archive with the given members. Names ending in `/` become
/// directories.
pub(crate) fn write_archive(
    path: &Path,
    compression: crate::io::archive::Compression,
    members: &[(&str, &[u8])],
) {
    use crate::io::archive::Compression;
    use std::io::Write;

    let file = std::fs::File::create(path).unwrap();
    let writer: Box<dyn Write> = match compression {
        Compression::None => Box::new(file),
        Compression::Gzip => Box::new(flate2::write::GzEncoder::new(
            file,
            flate2::Compression::default(),
        )),
        Compression::Bzip2 => Box::new(bzip2::write::BzEncoder::new(
            file,
            bzip2::Compression::default(),
        )),
        Compression::Zstd => Box::new(zstd::stream::write::Encoder::new(file, 0).unwrap().auto_finish()),
    };

    let mut builder = tar::Builder::new(writer);
    for (name, data) in members {
        let mut header = tar::Header::new_gnu();
        if name.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
        } else {
            header.set_mode(0o644);
            header.set_size(data.len() as u64);
        }
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap().flush().unwrap();
}
