//! srcball core library.
//!
//! Shared logic behind the `create-tarball` and `extract-file` tools:
//! running the external version-control and archive clients, deriving the
//! upstream version, checking out and verifying l10n repositories, packing
//! the orig tarball and extracting single files back out of it.

pub mod checkout;
pub mod deps;
pub mod error;
pub mod exec;
pub mod extract;
pub mod io;
pub mod layout;
pub mod locales;
pub mod pack;
pub mod paths;
pub mod vcs;
pub mod version;
pub mod workdir;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{BuildError, CommandError};
pub use extract::{ExtractError, ExtractOutcome, ExtractRequest};
pub use layout::SourceLayout;
pub use paths::*;
pub use vcs::{Changeset, Mercurial, Vcs};

/// User Agent string for HTTP requests
pub const USER_AGENT: &str = concat!("srcball/", env!("CARGO_PKG_VERSION"));
