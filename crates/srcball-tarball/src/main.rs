//! `create-tarball` - assemble an upstream source tarball.
//!
//! Checks out the main repository and its l10n repositories, verifies that
//! every shipped locale made it in, derives the upstream version and packs
//! `<name>_<version>.orig.tar.gz` into the current directory.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use srcball_core::checkout::{self, L10nCheckout};
use srcball_core::deps::{self, DEPENDENCIES, POST_CHECKOUT_DEPENDENCY};
use srcball_core::locales::{self, Blacklist};
use srcball_core::pack;
use srcball_core::version;
use srcball_core::workdir::WorkDir;
use srcball_core::{Mercurial, SourceLayout, USER_AGENT, absolutize, filename_from_url};

#[derive(Parser, Debug)]
#[command(name = "create-tarball", author, version, about = "Build an upstream source tarball from Mercurial", long_about = None)]
struct Args {
    /// The remote repository from which to pull the main source
    #[arg(short, long)]
    repo: String,

    /// A local cache of the remote repositories
    #[arg(short, long, env = "SRCBALL_CACHE")]
    cache: Option<PathBuf>,

    /// The base URL of the remote repositories to pull l10n data from
    #[arg(short, long = "l10n-base-repo")]
    l10n_base_repo: Option<String>,

    /// Release tag to base the checkout on
    #[arg(short, long)]
    tag: Option<String>,

    /// The package name
    #[arg(short, long)]
    name: String,

    /// File with a list of blacklisted locales
    #[arg(short = 'b', long = "locale-blacklist")]
    locale_blacklist: Option<PathBuf>,

    /// TOML file describing the source tree (defaults to a Firefox tree)
    #[arg(long, env = "SRCBALL_LAYOUT")]
    layout: Option<PathBuf>,
}

fn usage_error(kind: ErrorKind, message: &str) -> ! {
    Args::command().error(kind, message).exit()
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let layout = match &args.layout {
        Some(path) => SourceLayout::load(path)
            .with_context(|| format!("failed to load layout {}", path.display()))?,
        None => SourceLayout::default(),
    };

    if args.l10n_base_repo.is_none() && layout.all_locales.is_some() {
        usage_error(
            ErrorKind::MissingRequiredArgument,
            "Must specify a base repository for l10n data",
        );
    }
    if args.locale_blacklist.as_ref().is_some_and(|b| !b.exists()) {
        usage_error(ErrorKind::ValueValidation, "Locale blacklist file does not exist");
    }

    let start_dir = std::env::current_dir().context("failed to determine current directory")?;

    deps::check_dependencies(DEPENDENCIES)?;
    if layout.post_checkout {
        deps::check_dependencies(&[POST_CHECKOUT_DEPENDENCY])?;
    }

    let blacklist = Blacklist::load(args.locale_blacklist.as_deref())?;
    let cache = args.cache.as_deref().map(|c| absolutize(&start_dir, c));
    let tag = args.tag.as_deref();

    let work = WorkDir::new(&start_dir, &args.name)
        .with_context(|| format!("failed to create working directory in {}", start_dir.display()))?;
    let tree = work.tree();
    let source_root = layout.source_root(&tree);

    let vcs = Mercurial::default();

    tracing::info!(repo = %args.repo, "checking out source");
    checkout::checkout_source(&vcs, &args.repo, cache.as_deref(), tag, &source_root)?;
    if layout.post_checkout {
        checkout::post_checkout(&vcs, &args.repo, cache.as_deref(), tag, &source_root)?;
    }

    if let Some(base) = &args.l10n_base_repo {
        check_l10n(&vcs, &layout, base, cache.as_deref(), tag, &blacklist, &source_root)?;
    }

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")?;
    let version =
        version::determine_upstream_version(&vcs, &client, &args.repo, &source_root, &layout, tag)
            .await?;

    pack::pack_embedded_tar(&layout, &tree, filename_from_url(&args.repo), &version)?;
    let archive = pack::pack_orig_source(work.root(), &args.name, &version, &start_dir)?;

    println!("\n  created {}", archive.display());
    Ok(())
}

/// Check out every l10n repository the manifests name and make sure the
/// shipped ones are all present.
fn check_l10n(
    vcs: &Mercurial,
    layout: &SourceLayout,
    base: &str,
    cache: Option<&Path>,
    tag: Option<&str>,
    blacklist: &Blacklist,
    source_root: &Path,
) -> Result<()> {
    let all = layout
        .all_locales
        .as_ref()
        .map(|p| locales::read_manifest(&source_root.join(p)))
        .transpose()?;
    let shipped = locales::read_manifest(&source_root.join(&layout.shipped_locales))?;

    tracing::info!(base, "checking out l10n repositories");
    let l10n = L10nCheckout {
        vcs,
        base,
        cache,
        tag,
        blacklist,
    };
    let checked_out = l10n.checkout_all(source_root, all.as_deref(), &shipped)?;

    locales::verify_all_locales(&checked_out, &shipped, blacklist)?;
    Ok(())
}
