//! Checkout of the main repository and the per-locale l10n repositories.
//!
//! A locale whose repository or requested revision does not exist is left
//! out of the tarball rather than failing the run; that decision is made
//! here and surfaced as [`CheckoutOutcome::Skipped`]. Everything else is
//! fatal, including a clone that aborts for an unrelated reason.

use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::BuildError;
use crate::exec;
use crate::locales::{Blacklist, LocaleEntry, SOURCE_LOCALE};
use crate::paths::{CHANGESETS_LEDGER, filename_from_url, parent_url};
use crate::vcs::{Changeset, Vcs};

/// Result of checking out one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    CheckedOut(Changeset),
    Skipped(String),
}

/// Bring the cached clone of `repo` under `cache_dir` up to date, cloning it
/// on first use. Returns the path of the local clone.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be prepared or the VCS
/// client fails.
pub fn ensure_cache(vcs: &dyn Vcs, repo: &str, cache_dir: &Path) -> Result<PathBuf, BuildError> {
    let dest = cache_dir.join(filename_from_url(repo));

    if dest.is_dir() && vcs.is_repo(&dest)? {
        vcs.pull(&dest, repo)?;
        vcs.update(&dest, None)?;
        return Ok(dest);
    }

    if dest.exists() {
        tracing::warn!(path = %dest.display(), "discarding unusable cache entry");
        fs::remove_dir_all(&dest)?;
    }
    fs::create_dir_all(cache_dir)?;
    vcs.clone_repo(repo, &dest)?;
    Ok(dest)
}

/// Clone `source` into `dest` and update to `tag` (or tip).
///
/// # Errors
///
/// Returns [`BuildError::RevisionNotFound`] when the client rejects `tag`,
/// or the underlying error otherwise.
pub fn do_checkout(
    vcs: &dyn Vcs,
    source: &str,
    dest: &Path,
    tag: Option<&str>,
) -> Result<(), BuildError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    vcs.clone_repo(source, dest)?;

    match (vcs.update(dest, tag), tag) {
        (Err(e), Some(tag)) if e.is_client_failure() => Err(BuildError::RevisionNotFound {
            revision: tag.to_string(),
            repo: source.to_string(),
        }),
        (result, _) => result,
    }
}

fn resolve_source(
    vcs: &dyn Vcs,
    repo: &str,
    cache_dir: Option<&Path>,
) -> Result<String, BuildError> {
    match cache_dir {
        Some(cache) => Ok(ensure_cache(vcs, repo, cache)?
            .to_string_lossy()
            .into_owned()),
        None => Ok(repo.to_string()),
    }
}

/// Check out the main repository into `dest`, through the cache if given.
///
/// # Errors
///
/// Any failure is fatal, including an unknown tag.
pub fn checkout_source(
    vcs: &dyn Vcs,
    repo: &str,
    cache: Option<&Path>,
    tag: Option<&str>,
    dest: &Path,
) -> Result<(), BuildError> {
    println!("\n  checking out {repo}");
    let source = resolve_source(vcs, repo, cache)?;
    do_checkout(vcs, &source, dest, tag)
}

/// The mozilla repository paired with a comm-style repository URL.
pub fn mozilla_repo_url(repo: &str) -> String {
    let name = filename_from_url(repo).replace("comm", "mozilla");
    match parent_url(repo) {
        "" => name,
        parent => format!("{parent}/{name}"),
    }
}

/// Arguments to `python` for the tree's `client.py checkout`.
///
/// `mozilla_local` is the cached clone of the mozilla repository, if any.
pub fn post_checkout_args(mozilla_local: Option<&Path>, tag: Option<&str>) -> Vec<String> {
    let mut args = vec!["client.py".to_string(), "checkout".to_string()];
    if let Some(local) = mozilla_local {
        args.push(format!("--mozilla-repo={}", local.display()));
    }
    if let Some(tag) = tag {
        args.push(format!("--comm-rev={tag}"));
        args.push(format!("--mozilla-rev={tag}"));
    }
    args
}

/// Refresh the cached mozilla repository (when caching) and return the
/// `client.py` arguments that point at it.
///
/// # Errors
///
/// Returns an error if the mozilla repository cannot be cached.
pub fn prepare_post_checkout(
    vcs: &dyn Vcs,
    repo: &str,
    cache: Option<&Path>,
    tag: Option<&str>,
) -> Result<Vec<String>, BuildError> {
    let mozilla_local = cache
        .map(|cache| ensure_cache(vcs, &mozilla_repo_url(repo), cache))
        .transpose()?;
    Ok(post_checkout_args(mozilla_local.as_deref(), tag))
}

/// Run the tree's own `client.py checkout` to pull in nested repositories.
///
/// # Errors
///
/// Returns an error if caching the mozilla repository or the script fails.
pub fn post_checkout(
    vcs: &dyn Vcs,
    repo: &str,
    cache: Option<&Path>,
    tag: Option<&str>,
    source_root: &Path,
) -> Result<(), BuildError> {
    let args = prepare_post_checkout(vcs, repo, cache, tag)?;
    exec::run(
        Command::new("python").args(args).current_dir(source_root),
        false,
    )?;
    Ok(())
}

/// Settings shared by every locale checkout in a run.
#[derive(Clone, Copy)]
pub struct L10nCheckout<'a> {
    pub vcs: &'a dyn Vcs,
    /// Base URL; each locale lives at `<base>/<locale>`.
    pub base: &'a str,
    pub cache: Option<&'a Path>,
    pub tag: Option<&'a str>,
    pub blacklist: &'a Blacklist,
}

impl std::fmt::Debug for L10nCheckout<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("L10nCheckout")
            .field("base", &self.base)
            .field("cache", &self.cache)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

impl L10nCheckout<'_> {
    fn fetch_locale(&self, locale: &str, dest: &Path) -> Result<Changeset, BuildError> {
        let remote = format!("{}/{locale}", self.base.trim_end_matches('/'));
        let l10n_cache = self.cache.map(|c| c.join("l10n"));
        let source = resolve_source(self.vcs, &remote, l10n_cache.as_deref())?;
        do_checkout(self.vcs, &source, dest, self.tag)?;
        self.vcs.tip(dest)
    }

    /// Check out one locale into `<l10n_dir>/<locale>`.
    ///
    /// # Errors
    ///
    /// A missing repository or revision is reported as
    /// [`CheckoutOutcome::Skipped`] after removing any partial checkout;
    /// every other failure, including a clone that aborts for any other
    /// reason, is returned.
    pub fn checkout_locale(
        &self,
        locale: &str,
        l10n_dir: &Path,
    ) -> Result<CheckoutOutcome, BuildError> {
        let dest = l10n_dir.join(locale);

        match self.fetch_locale(locale, &dest) {
            Ok(changeset) => Ok(CheckoutOutcome::CheckedOut(changeset)),
            Err(e) if e.is_missing_upstream() => {
                tracing::warn!(%locale, error = %e, "omitting locale from tarball");
                if dest.exists() {
                    fs::remove_dir_all(&dest)?;
                }
                Ok(CheckoutOutcome::Skipped(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Check out every locale named in the manifests, recording each
    /// success in the changeset ledger. Returns the checked-out locales.
    ///
    /// `all` is `None` when the tree has no all-locales manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be written or a locale fails
    /// for a reason other than a client failure.
    pub fn checkout_all(
        &self,
        source_root: &Path,
        all: Option<&[LocaleEntry]>,
        shipped: &[LocaleEntry],
    ) -> Result<BTreeSet<String>, BuildError> {
        let l10n_dir = source_root.join("l10n");
        fs::create_dir_all(&l10n_dir)?;
        let mut ledger = File::create(source_root.join(CHANGESETS_LEDGER))?;

        let mut attempted = HashSet::new();
        let mut checked_out = BTreeSet::new();

        let manifests = [(all.unwrap_or_default(), true), (shipped, false)];
        for (entries, from_all) in manifests {
            for entry in entries {
                let locale = entry.locale.as_str();
                if locale == SOURCE_LOCALE || !attempted.insert(locale.to_string()) {
                    continue;
                }
                if self.blacklist.contains(locale) {
                    println!("    skipping blacklisted locale {locale}");
                    continue;
                }
                if !from_all && all.is_some() {
                    tracing::warn!(
                        %locale,
                        "locale is not in all-locales, this is an upstream oversight"
                    );
                }

                match self.checkout_locale(locale, &l10n_dir)? {
                    CheckoutOutcome::CheckedOut(changeset) => {
                        writeln!(ledger, "{locale} {changeset}")?;
                        ledger.flush()?;
                        checked_out.insert(locale.to_string());
                    }
                    CheckoutOutcome::Skipped(reason) => {
                        println!("    omitting {locale}: {reason}");
                    }
                }
            }
        }

        Ok(checked_out)
    }
}
