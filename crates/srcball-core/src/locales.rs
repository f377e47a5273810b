//! Locale manifests, the blacklist and the shipped-locale completeness gate.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::error::BuildError;

/// The source locale; it has no l10n repository.
pub const SOURCE_LOCALE: &str = "en-US";

/// Platform name a locale must list (if it lists any) to ship on Linux.
const LINUX: &str = "linux";

/// One line of an `all-locales` / `shipped-locales` manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleEntry {
    pub locale: String,
    /// Platforms the locale is restricted to; empty means all.
    pub platforms: Vec<String>,
}

impl LocaleEntry {
    /// Parse a manifest line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let mut tokens = line.split_whitespace();
        let locale = tokens.next()?.to_string();
        Some(Self {
            locale,
            platforms: tokens.map(str::to_string).collect(),
        })
    }

    pub fn ships_on_linux(&self) -> bool {
        self.platforms.is_empty() || self.platforms.iter().any(|p| p == LINUX)
    }
}

/// Parse every entry of a manifest, in order.
pub fn parse_manifest(content: &str) -> Vec<LocaleEntry> {
    content.lines().filter_map(LocaleEntry::parse).collect()
}

/// Read and parse a manifest file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_manifest(path: &Path) -> Result<Vec<LocaleEntry>, BuildError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        BuildError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {}: {e}", path.display()),
        ))
    })?;
    Ok(parse_manifest(&content))
}

/// Locales deliberately left out of the tarball.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist(HashSet<String>);

impl Blacklist {
    pub fn parse(content: &str) -> Self {
        Self(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string)
                .collect(),
        )
    }

    /// Load the blacklist file, or an empty blacklist when none is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(path: Option<&Path>) -> Result<Self, BuildError> {
        match path {
            Some(p) => Ok(Self::parse(&std::fs::read_to_string(p)?)),
            None => Ok(Self::default()),
        }
    }

    pub fn contains(&self, locale: &str) -> bool {
        self.0.contains(locale)
    }
}

/// Fail if any shipped Linux locale did not make it into the checkout.
///
/// `en-US`, blacklisted locales and locales restricted to other platforms
/// are never required.
///
/// # Errors
///
/// Returns [`BuildError::MissingLocale`] naming the first missing locale.
pub fn verify_all_locales(
    checked_out: &BTreeSet<String>,
    shipped: &[LocaleEntry],
    blacklist: &Blacklist,
) -> Result<(), BuildError> {
    println!("\n  checking that required locales are present");

    for entry in shipped {
        let locale = entry.locale.as_str();
        if locale == SOURCE_LOCALE {
            println!("    ignoring {SOURCE_LOCALE}");
            continue;
        }
        if blacklist.contains(locale) {
            println!("    ignoring blacklisted locale {locale}");
            continue;
        }
        if !entry.ships_on_linux() {
            println!("    ignoring {locale} (not for linux)");
            continue;
        }
        if !checked_out.contains(locale) {
            return Err(BuildError::MissingLocale(locale.to_string()));
        }
        println!("    {locale} - yes");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIPPED: &str = "# shipped locales\n\
                           de\n\
                           en-US\n\
                           ja linux win32\n\
                           ja-JP-mac osx\n\
                           \n\
                           fr\n";

    fn set(locales: &[&str]) -> BTreeSet<String> {
        locales.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_entry_with_platforms() {
        let e = LocaleEntry::parse("  ja linux win32 ").unwrap();
        assert_eq!(e.locale, "ja");
        assert_eq!(e.platforms, vec!["linux", "win32"]);
        assert!(e.ships_on_linux());
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        assert_eq!(LocaleEntry::parse("# comment"), None);
        assert_eq!(LocaleEntry::parse("   "), None);
        let entries = parse_manifest(SHIPPED);
        let names: Vec<_> = entries.iter().map(|e| e.locale.as_str()).collect();
        assert_eq!(names, vec!["de", "en-US", "ja", "ja-JP-mac", "fr"]);
    }

    #[test]
    fn test_non_linux_locale() {
        let e = LocaleEntry::parse("ja-JP-mac osx").unwrap();
        assert!(!e.ships_on_linux());
    }

    #[test]
    fn test_blacklist_parse() {
        let bl = Blacklist::parse("# not ready\nfr\n\n  de  \n");
        assert!(bl.contains("fr"));
        assert!(bl.contains("de"));
        assert!(!bl.contains("# not ready"));
        assert!(!bl.contains(""));
    }

    #[test]
    fn test_blacklist_load_none() {
        assert_eq!(Blacklist::load(None).unwrap(), Blacklist::default());
    }

    #[test]
    fn test_verify_all_present() {
        let shipped = parse_manifest(SHIPPED);
        let result = verify_all_locales(&set(&["de", "ja", "fr"]), &shipped, &Blacklist::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_verify_missing_locale() {
        let shipped = parse_manifest(SHIPPED);
        let err = verify_all_locales(&set(&["de", "ja"]), &shipped, &Blacklist::default())
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingLocale(ref l) if l == "fr"));
        assert_eq!(err.to_string(), "Locale fr is missing from the source tarball");
    }

    #[test]
    fn test_verify_ignores_en_us_blacklisted_and_non_linux() {
        let shipped = parse_manifest(SHIPPED);
        let blacklist = Blacklist::parse("fr\n");
        // Neither en-US, fr (blacklisted) nor ja-JP-mac (osx only) are required.
        let result = verify_all_locales(&set(&["de", "ja"]), &shipped, &blacklist);
        assert!(result.is_ok());
    }

    #[test]
    fn test_verify_empty_checkout_with_only_exempt_locales() {
        let shipped = parse_manifest("en-US\nja-JP-mac osx\n");
        assert!(verify_all_locales(&BTreeSet::new(), &shipped, &Blacklist::default()).is_ok());
    }
}
