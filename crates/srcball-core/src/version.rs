//! Upstream version derivation.
//!
//! Tagged builds take their version from the release tag
//! (`FIREFOX_17_0b1_BUILD1` is `17.0~b1+build1`); untagged builds get a
//! pseudo-version from the tip changeset and its push date
//! (`17.0.1~hg20121009r98765`). Either way the result starts with the
//! normalized content of the tree's version file.

use std::path::Path;

use chrono::NaiveDate;
use reqwest::Client;

use crate::error::BuildError;
use crate::io::pushlog;
use crate::layout::SourceLayout;
use crate::vcs::Vcs;

/// Marker that ends the version components of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMarker {
    Release,
    Build,
}

/// A release tag broken into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    /// Dot-joined, normalized version components.
    pub version: String,
    /// Digits following `BUILD`, kept verbatim (`"03"` stays `"03"`).
    pub build: Option<String>,
    pub stop: Option<StopMarker>,
}

impl ParsedTag {
    /// The Debian-style version string for this tag.
    pub fn to_version_string(&self) -> String {
        match &self.build {
            Some(build) => format!("{}+build{build}", self.version),
            None => self.version.clone(),
        }
    }
}

/// Split `s` after its leading run of characters accepted by `keep`, and
/// join the two halves with `~` when there is a suffix.
fn tilde_suffix(s: &str, keep: impl Fn(char) -> bool) -> String {
    let split = s.find(|c: char| !keep(c)).unwrap_or(s.len());
    let (numeric, suffix) = s.split_at(split);
    if suffix.is_empty() {
        numeric.to_string()
    } else {
        format!("{numeric}~{suffix}")
    }
}

/// Normalize the content of a version file: `17.0b1` becomes `17.0~b1`.
///
/// ```
/// use srcball_core::version::normalize_version;
///
/// assert_eq!(normalize_version("17.0b1\n"), "17.0~b1");
/// assert_eq!(normalize_version("10.0"), "10.0");
/// ```
pub fn normalize_version(raw: &str) -> String {
    tilde_suffix(raw.trim(), |c| c.is_ascii_digit() || c == '.')
}

/// Normalize a single tag component: `0b1` becomes `0~b1`.
pub fn normalize_component(comp: &str) -> String {
    tilde_suffix(comp, |c| c.is_ascii_digit())
}

/// Parse the version components of a release tag.
///
/// Everything before the first underscore is the product prefix and is
/// ignored.
///
/// # Errors
///
/// Returns [`BuildError::InvalidTag`] if a component follows a stop marker,
/// a stop marker comes before any version component, no version component
/// is present at all, or `BUILD` is followed by something other than
/// digits.
pub fn parse_tag(tag: &str) -> Result<ParsedTag, BuildError> {
    let invalid = || BuildError::InvalidTag(tag.to_string());

    let mut version = String::new();
    let mut build = None;
    let mut stop = None;

    for comp in tag.split('_').skip(1) {
        if stop.is_some() {
            return Err(invalid());
        }

        if let Some(number) = comp.strip_prefix("BUILD") {
            if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            build = Some(number.to_string());
            stop = Some(StopMarker::Build);
        } else if comp.starts_with("RELEASE") {
            stop = Some(StopMarker::Release);
        } else {
            if !version.is_empty() {
                version.push('.');
            }
            version.push_str(&normalize_component(comp));
        }

        if stop.is_some() && version.is_empty() {
            return Err(invalid());
        }
    }

    if version.is_empty() {
        return Err(invalid());
    }

    Ok(ParsedTag {
        version,
        build,
        stop,
    })
}

/// Version string for a tagged build, checked against the version file.
///
/// # Errors
///
/// Returns [`BuildError::InvalidTag`] if the tag does not parse or does not
/// start with the normalized version file content.
pub fn version_from_tag(version_file: &str, tag: &str) -> Result<String, BuildError> {
    let expected = normalize_version(version_file);
    let version = parse_tag(tag)?.to_version_string();
    if !version.starts_with(&expected) {
        tracing::debug!(%tag, %expected, derived = %version, "tag does not match version file");
        return Err(BuildError::InvalidTag(tag.to_string()));
    }
    Ok(version)
}

/// Version string for an untagged build: `<base>~hg<YYYYMMDD>r<rev>`.
pub fn pseudo_version(base: &str, date: NaiveDate, rev: u64) -> String {
    format!("{base}~hg{}r{rev}", date.format("%Y%m%d"))
}

/// Work out the upstream version of the checked-out tree.
///
/// # Errors
///
/// Returns an error if the version file cannot be read, the tag is invalid,
/// or (untagged builds) the tip or its push date cannot be determined.
pub async fn determine_upstream_version(
    vcs: &dyn Vcs,
    client: &Client,
    repo: &str,
    source_root: &Path,
    layout: &SourceLayout,
    tag: Option<&str>,
) -> Result<String, BuildError> {
    let version_path = source_root.join(&layout.version_file);
    let raw = std::fs::read_to_string(&version_path).map_err(|e| {
        BuildError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {}: {e}", version_path.display()),
        ))
    })?;

    let version = match tag {
        Some(tag) => version_from_tag(&raw, tag)?,
        None => {
            let tip = vcs.tip(source_root)?;
            let date = pushlog::fetch_push_date(client, repo, &tip.node).await?;
            let mut version = pseudo_version(&normalize_version(&raw), date, tip.rev);

            if layout.post_checkout {
                let nested = vcs.tip(&source_root.join("mozilla"))?;
                version.push_str(&format!(".{}", nested.rev));
            }
            version
        }
    };

    tracing::info!(%version, "upstream version");
    println!("\n  upstream version is {version}");
    Ok(version)
}
