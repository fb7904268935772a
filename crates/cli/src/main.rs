//! svn2git command-line tool.
//!
//! Converts a Subversion repository into a git repository with real tags and
//! branches by driving git-svn, or resyncs a previous conversion with
//! `--rebase`.

mod style;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use svn2git_core::{Migration, MigrationConfig, MigrationReport, ProcessExecutor, TrunkOutcome};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Migrate a Subversion repository to git.
#[derive(Parser, Debug)]
#[command(
    name = "svn2git",
    version,
    about = "Convert a Subversion repository into git tags and branches"
)]
struct Cli {
    /// Subversion repository URL. Not accepted with --rebase.
    #[arg(value_name = "SVN_URL")]
    svn_url: Option<String>,

    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resync an existing conversion with new Subversion revisions.
    #[arg(long, conflicts_with = "svn_url")]
    rebase: bool,

    /// Username for transports that need it (http(s), svn).
    #[arg(long)]
    username: Option<String>,

    /// Subpath to trunk from the repository URL.
    #[arg(long)]
    trunk: Option<String>,

    /// Subpath to branches from the repository URL.
    #[arg(long)]
    branches: Option<String>,

    /// Subpath to tags from the repository URL.
    #[arg(long)]
    tags: Option<String>,

    /// Use this if the root level of the repository is equivalent to trunk
    /// and there are no tags or branches.
    #[arg(long)]
    root_is_trunk: bool,

    /// Do not import anything from trunk.
    #[arg(long)]
    no_trunk: bool,

    /// Do not try to import any branches.
    #[arg(long)]
    no_branches: bool,

    /// Do not try to import any tags.
    #[arg(long)]
    no_tags: bool,

    /// Regular expression of paths to leave out of the fetch.
    #[arg(long, value_name = "REGEX")]
    exclude: Option<String>,

    /// Revision range to fetch.
    #[arg(long, value_name = "START[:END]")]
    revision: Option<String>,

    /// Path to the svn-to-git authors mapping file.
    #[arg(long)]
    authors: Option<PathBuf>,

    /// Keep git-svn-id metadata in commit messages.
    #[arg(long)]
    metadata: bool,

    /// Accept URLs as-is without connecting to a higher level directory.
    #[arg(long)]
    no_minimize_url: bool,

    /// Ref namespace git-svn creates remote refs under.
    #[arg(long)]
    prefix: Option<String>,

    /// Branch that receives trunk.
    #[arg(long)]
    default_branch: Option<String>,

    /// Repository directory to work in.
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Debug logging; git output goes straight to the terminal.
    #[arg(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", style::error(&format!("{e:#}")));
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    if config.verbose {
        config.log_summary();
    }

    debug!(repo = %cli.repo.display(), rebase = config.rebase, "starting svn2git");
    let executor = ProcessExecutor::new(&cli.repo).with_passthrough(config.verbose);
    let migration = Migration::new(&executor, &config);

    let spinner = (!config.verbose).then(|| {
        let message = if config.rebase {
            "Resyncing with Subversion...".to_string()
        } else {
            format!("Converting {}...", config.url)
        };
        start_spinner(message)
    });

    let result = migration.run().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let report = result.context(if config.rebase {
        "resync failed"
    } else {
        "migration failed"
    })?;
    print_report(&report, &config);
    Ok(())
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Load the optional config file, overlay command-line flags and resolve.
fn build_config(cli: &Cli) -> Result<MigrationConfig> {
    let mut config = match &cli.config {
        Some(path) => MigrationConfig::load_from_file(path).context("failed to load configuration file")?,
        None => MigrationConfig::default(),
    };

    if let Some(url) = &cli.svn_url {
        config.url = url.clone();
    }
    if let Some(username) = &cli.username {
        config.username = Some(username.clone());
    }
    config.rebase |= cli.rebase;
    config.verbose |= cli.verbose;

    let layout = &mut config.layout;
    if let Some(trunk) = &cli.trunk {
        layout.trunk = trunk.clone();
    }
    if let Some(branches) = &cli.branches {
        layout.branches = branches.clone();
    }
    if let Some(tags) = &cli.tags {
        layout.tags = tags.clone();
    }
    layout.root_is_trunk |= cli.root_is_trunk;
    layout.no_trunk |= cli.no_trunk;
    layout.no_branches |= cli.no_branches;
    layout.no_tags |= cli.no_tags;

    let fetch = &mut config.fetch;
    if let Some(exclude) = &cli.exclude {
        fetch.exclude = exclude.clone();
    }
    if let Some(revision) = &cli.revision {
        fetch.revision = revision.clone();
    }
    if let Some(authors) = &cli.authors {
        fetch.authors = Some(authors.clone());
    }
    fetch.metadata |= cli.metadata;
    fetch.no_minimize_url |= cli.no_minimize_url;

    if let Some(prefix) = &cli.prefix {
        config.git.prefix = prefix.clone();
    }
    if let Some(default_branch) = &cli.default_branch {
        config.git.default_branch = default_branch.clone();
    }

    config.resolve().context("invalid configuration")?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn start_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_report(report: &MigrationReport, config: &MigrationConfig) {
    let title = if config.rebase {
        "Resync complete"
    } else {
        "Migration complete"
    };
    println!("{}", style::success(title));
    println!("  {}", style::header("Summary"));
    println!("  Tags created     : {}", name_list(&report.tags_created));
    println!("  Branches created : {}", name_list(&report.branches_created));
    println!("  Branches rebased : {}", name_list(&report.branches_rebased));

    let trunk = match report.trunk {
        TrunkOutcome::Reset => "reset to trunk",
        TrunkOutcome::Kept => "kept",
    };
    println!("  Default branch   : {} ({})", config.git.default_branch, trunk);
}

fn name_list(names: &[String]) -> String {
    if names.is_empty() {
        style::dim("(none)")
    } else {
        format!("{} ({})", names.len(), names.join(", "))
    }
}
