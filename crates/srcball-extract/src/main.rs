//! `extract-file` - pull a single file out of a source tarball.
//!
//! Looks for the file directly in the outer archive first and then inside
//! the embedded `.bz2` archive. Does nothing if the destination already has
//! the file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use srcball_core::extract::{self, ExtractOutcome, ExtractRequest};
use srcball_core::{ExtractError, absolutize};

#[derive(Parser, Debug)]
#[command(name = "extract-file", author, version, about = "Extract a file from a source tarball", long_about = None)]
struct Args {
    /// Directory to extract the file into
    #[arg(short = 'd', value_name = "DIR", default_value = ".")]
    dest: PathBuf,

    /// Source tarball to read (defaults to the first *.bz2 in the current directory)
    #[arg(short = 'o', value_name = "ARCHIVE")]
    archive: Option<PathBuf>,

    /// Path of the file inside the source tree
    file: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args) {
        Ok(outcome) => {
            tracing::debug!(path = %outcome.path().display(), ?outcome, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExtractOutcome, ExtractError> {
    // Checked before the working directory is even looked at.
    if args.file.has_root() {
        return Err(ExtractError::AbsolutePath);
    }

    let cwd = std::env::current_dir().map_err(|e| ExtractError::from_io(&e, None))?;
    let request = ExtractRequest {
        path: args.file,
        dest: absolutize(&cwd, &args.dest),
        archive: args.archive.map(|a| absolutize(&cwd, &a)),
        search_dir: cwd,
    };
    extract::extract_file(&request)
}
