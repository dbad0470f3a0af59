use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

use git_semver::ui::{self, ShowField};
use git_semver::{load_config, resolve_version_with, Git2Repository, ResolveOptions};

#[derive(clap::Parser)]
#[command(
    name = "git-semver",
    version,
    about = "Compute a semantic version from git history"
)]
struct Args {
    #[arg(short, long, default_value = ".", help = "Repository path (discovered upwards)")]
    path: PathBuf,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Version this branch name instead of the checked-out one")]
    branch: Option<String>,

    #[arg(short, long, value_enum, default_value = "semver", help = "Field to print")]
    show: ShowField,

    #[arg(short, long, action = clap::ArgAction::Count, help = "More log output (-vv for trace)")]
    verbose: u8,

    #[arg(short, long, help = "Only log errors")]
    quiet: bool,
}

/// Priority: quiet flag > verbose flag > RUST_LOG env > default_level
fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    if verbose > 0 {
        let level = match verbose {
            1 => "debug",
            _ => "trace",
        };
        return EnvFilter::new(level);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_deref(), &args.path).context("Error loading config")?;
    let repo = Git2Repository::open(&args.path)
        .with_context(|| format!("Git repository error at {}", args.path.display()))?;

    let options = ResolveOptions {
        branch_override: args.branch.clone(),
        ..ResolveOptions::default()
    };
    let version = resolve_version_with(&repo, &config, &options)?;

    if args.verbose > 0 {
        ui::display_summary(&version);
    }
    println!("{}", ui::field_value(&version, args.show));
    Ok(())
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(args.quiet, args.verbose, "warn"))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(&args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
