//! Domain-specific errors for tarball assembly

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Dependency not found: {program}. Please install package {package}")]
    DependencyNotFound { program: String, package: String },

    #[error("Locale {0} is missing from the source tarball")]
    MissingLocale(String),

    #[error("Revision {revision} not found in {repo}")]
    RevisionNotFound { revision: String, repo: String },

    #[error("Tag {0} is invalid")]
    InvalidTag(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Invalid pushlog response: {0}")]
    Pushlog(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid source layout: {0}")]
    Layout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Whether this is a failure reported by an external client (non-zero
    /// exit), as opposed to a local failure such as a missing binary or a
    /// filesystem error.
    pub fn is_client_failure(&self) -> bool {
        match self {
            Self::RevisionNotFound { .. } => true,
            Self::Command(e) => e.is_exit_failure(),
            _ => false,
        }
    }

    /// Whether the upstream repository or the requested revision does not
    /// exist. Only these failures may drop a locale from the tarball.
    pub fn is_missing_upstream(&self) -> bool {
        match self {
            Self::RevisionNotFound { .. } => true,
            Self::Command(e) => e.reports_missing_repository(),
            _ => false,
        }
    }
}

/// Failure running an external command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with {}{}", describe_code(*.code), describe_output(.output))]
    Failed {
        command: String,
        code: Option<i32>,
        output: String,
    },
}

/// `hg` messages meaning the remote repository is not there.
const MISSING_REPOSITORY_MARKERS: &[&str] = &[
    "HTTP Error 404",
    "HTTP Error 410",
    "does not appear to be an hg repository",
    "There is no Mercurial repository here",
    "repository not found",
];

impl CommandError {
    /// True when the command ran but exited unsuccessfully.
    pub fn is_exit_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// True when the command exited unsuccessfully because the repository
    /// it was pointed at does not exist.
    pub fn reports_missing_repository(&self) -> bool {
        match self {
            Self::Failed { output, .. } => MISSING_REPOSITORY_MARKERS
                .iter()
                .any(|marker| output.contains(marker)),
            Self::Spawn { .. } => false,
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "termination by signal".to_string(),
    }
}

fn describe_output(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .map_or_else(String::new, |last| format!(": {last}"))
}
