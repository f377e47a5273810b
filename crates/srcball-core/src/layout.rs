//! Description of the upstream source tree being packaged.
//!
//! The defaults describe a Firefox checkout. Other trees (for example a
//! comm-central style tree that needs a post-checkout step) can supply a
//! TOML file with the fields they want to override:
//!
//! ```toml
//! source_dir = "comm-central"
//! all_locales = "mail/locales/all-locales"
//! shipped_locales = "mail/locales/shipped-locales"
//! version_file = "mail/config/version.txt"
//! post_checkout = true
//!
//! [[exclude]]
//! pattern = "*.pyc"
//! match_slash = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BuildError;

/// Paths packed into the embedded archive, relative to the source directory.
/// The empty entry means the whole source directory.
const INCLUDE: &[&str] = &[""];

/// `(glob, wildcard_match_slash)` pairs excluded from the embedded archive.
const EXCLUDE: &[(&str, bool)] = &[
    ("build/mobile/sutagent/android", false),
    ("build/package/mac_osx/mozilla.dsstore", false),
    ("*.exe", true),
    ("*.pyc", true),
    ("gfx/angle/samples/gles2_book", false),
    ("intl/unicharutil/tools/data", false),
    ("layout/doc/object_diagram_template.sda", false),
    ("layout/doc/SpaceMgr_BlockReflSt_OD.sda", false),
    ("l10n/*/calendar", false),
    ("l10n/*/editor", false),
    ("l10n/*/embedding", false),
    ("l10n/*/extensions", false),
    ("l10n/*/mail", false),
    ("l10n/*/mobile", false),
    ("l10n/*/other-licenses/sunbird", false),
    ("l10n/*/other-licenses/thunderbird", false),
    ("l10n/*/suite", false),
    ("netwerk/protocol/ftp/doc/rfc959.txt", false),
    ("other-licenses/7zstub", false),
    ("other-licenses/nsis", false),
    ("security/nss/cmd/samples", false),
    ("testing/extensions/community", false),
    ("testing/mozmill/mozmill/docs/_build/doctrees", false),
    ("testing/mozmill/virtualenv/virtualenv_support", false),
    (
        "toolkit/crashreporter/client/macbuild/Contents/Resources/crashreporter.icns",
        false,
    ),
    (
        "toolkit/crashreporter/client/macbuild/Contents/Resources/English.lproj/MainMenu.nib/keyedobjects.nib",
        false,
    ),
    (
        "toolkit/crashreporter/client/macbuild/Contents/Resources/English.lproj/MainMenuRTL.nib/keyedobjects.nib",
        false,
    ),
    ("toolkit/crashreporter/google-breakpad/src/client/mac", false),
    ("toolkit/crashreporter/google-breakpad/src/tools/windows", false),
    (
        "toolkit/mozapps/update/updater/macbuild/Contents/Resources/updater.icns",
        false,
    ),
    (
        "toolkit/mozapps/update/updater/macbuild/Contents/Resources/English.lproj/MainMenu.nib/keyedobjects.nib",
        false,
    ),
    ("widget/src/cocoa/resources/MainMenu.nib", false),
    ("xpcom/tests/unit/data/presentation.key", false),
    ("xpcom/tests/unit/data/SmallApp.app", false),
];

/// A glob excluded from the embedded archive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExcludePattern {
    /// Glob relative to the source directory.
    pub pattern: String,
    /// Whether `*` may match across `/` (`tar --wildcards-match-slash`).
    #[serde(default)]
    pub match_slash: bool,
}

/// Immutable description of the upstream tree, passed to every stage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceLayout {
    /// Directory the main repository is checked out into.
    pub source_dir: String,
    /// Manifest of every translated locale. `None` disables l10n checkout.
    pub all_locales: Option<PathBuf>,
    /// Manifest of the locales shipped in a release.
    pub shipped_locales: PathBuf,
    /// File holding the upstream version number.
    pub version_file: PathBuf,
    /// Run `client.py checkout` after the main checkout.
    pub post_checkout: bool,
    pub include: Vec<String>,
    pub exclude: Vec<ExcludePattern>,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            source_dir: "mozilla".to_string(),
            all_locales: Some(PathBuf::from("browser/locales/all-locales")),
            shipped_locales: PathBuf::from("browser/locales/shipped-locales"),
            version_file: PathBuf::from("browser/config/version.txt"),
            post_checkout: false,
            include: INCLUDE.iter().map(|s| (*s).to_string()).collect(),
            exclude: EXCLUDE
                .iter()
                .map(|&(pattern, match_slash)| ExcludePattern {
                    pattern: pattern.to_string(),
                    match_slash,
                })
                .collect(),
        }
    }
}

impl SourceLayout {
    /// Parse a layout from TOML, filling unspecified fields with defaults.
    ///
    /// An empty `all_locales` string disables l10n checkout.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Layout`] if the document is malformed or the
    /// source directory is empty.
    pub fn from_toml_str(content: &str) -> Result<Self, BuildError> {
        let mut layout: Self =
            toml::from_str(content).map_err(|e| BuildError::Layout(e.to_string()))?;

        if layout
            .all_locales
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            layout.all_locales = None;
        }
        if layout.source_dir.is_empty() {
            return Err(BuildError::Layout("source_dir must not be empty".to_string()));
        }
        Ok(layout)
    }

    /// Load a layout from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// The source directory inside a working tree.
    pub fn source_root(&self, work_tree: &Path) -> PathBuf {
        work_tree.join(&self.source_dir)
    }
}
