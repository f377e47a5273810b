//! Version-control client seam.
//!
//! Checkout logic only talks to [`Vcs`], so it can be exercised without a
//! real Mercurial installation. [`Mercurial`] is the production client.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::BuildError;
use crate::exec;

/// A revision as reported by `hg tip`: local number plus node hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
    pub rev: u64,
    pub node: String,
}

impl Changeset {
    /// Parse the `changeset:` line out of `hg tip`/`hg log` output.
    ///
    /// ```
    /// use srcball_core::Changeset;
    ///
    /// let cs = Changeset::parse_log("changeset:   1234:0123456789ab\ntag: tip\n").unwrap();
    /// assert_eq!(cs.rev, 1234);
    /// assert_eq!(cs.node, "0123456789ab");
    /// ```
    pub fn parse_log(output: &str) -> Option<Self> {
        let line = output.lines().find(|l| l.starts_with("changeset:"))?;
        let field = line.split_whitespace().nth(1)?;
        let (rev, node) = field.split_once(':')?;
        Some(Self {
            rev: rev.trim().parse().ok()?,
            node: node.trim().to_string(),
        })
    }
}

impl fmt::Display for Changeset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.rev, self.node)
    }
}

/// Operations the builder needs from a version-control client.
pub trait Vcs: Send + Sync {
    /// Clone `source` into `dest`.
    fn clone_repo(&self, source: &str, dest: &Path) -> Result<(), BuildError>;

    /// Update the working copy at `repo`, to `rev` if given, else to tip.
    fn update(&self, repo: &Path, rev: Option<&str>) -> Result<(), BuildError>;

    /// Pull new changesets from `source` into `repo`.
    fn pull(&self, repo: &Path, source: &str) -> Result<(), BuildError>;

    /// Whether `repo` is a usable repository.
    fn is_repo(&self, repo: &Path) -> Result<bool, BuildError>;

    /// The tip changeset of `repo`.
    fn tip(&self, repo: &Path) -> Result<Changeset, BuildError>;
}

/// Mercurial command-line client.
#[derive(Debug, Clone)]
pub struct Mercurial {
    program: PathBuf,
}

impl Default for Mercurial {
    fn default() -> Self {
        Self {
            program: PathBuf::from("hg"),
        }
    }
}

impl Mercurial {
    /// Use a specific `hg` binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, cwd: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl Vcs for Mercurial {
    fn clone_repo(&self, source: &str, dest: &Path) -> Result<(), BuildError> {
        exec::run(self.command(None).arg("clone").arg(source).arg(dest), false)?;
        Ok(())
    }

    fn update(&self, repo: &Path, rev: Option<&str>) -> Result<(), BuildError> {
        let mut cmd = self.command(Some(repo));
        cmd.arg("update");
        if let Some(rev) = rev {
            cmd.arg("-r").arg(rev);
        }
        exec::run(&mut cmd, false)?;
        Ok(())
    }

    fn pull(&self, repo: &Path, source: &str) -> Result<(), BuildError> {
        exec::run(self.command(Some(repo)).arg("pull").arg(source), false)?;
        Ok(())
    }

    fn is_repo(&self, repo: &Path) -> Result<bool, BuildError> {
        let (status, _) = exec::run_unchecked(self.command(Some(repo)).arg("summary"), true)?;
        Ok(status.success())
    }

    fn tip(&self, repo: &Path) -> Result<Changeset, BuildError> {
        let out = exec::run(self.command(Some(repo)).arg("tip"), true)?;
        Changeset::parse_log(&out).ok_or_else(|| {
            BuildError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("no changeset in `hg tip` output for {}", repo.display()),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIP: &str = "changeset:   98765:1a2b3c4d5e6f\n\
                       tag:         tip\n\
                       user:        Someone <someone@example.org>\n\
                       date:        Tue Oct 09 12:00:00 2012 -0700\n\
                       summary:     Bump version\n";

    #[test]
    fn test_parse_tip() {
        let cs = Changeset::parse_log(TIP).unwrap();
        assert_eq!(cs.rev, 98765);
        assert_eq!(cs.node, "1a2b3c4d5e6f");
        assert_eq!(cs.to_string(), "98765:1a2b3c4d5e6f");
    }

    #[test]
    fn test_parse_tip_without_changeset() {
        assert_eq!(Changeset::parse_log("abort: no repository found\n"), None);
        assert_eq!(Changeset::parse_log("changeset: garbage\n"), None);
    }

    #[test]
    fn test_missing_client_is_not_a_client_failure() {
        let hg = Mercurial::with_program("srcball-no-such-hg");
        let dir = tempfile::tempdir().unwrap();
        let err = hg.tip(dir.path()).unwrap_err();
        assert!(!err.is_client_failure());
    }
}
