//! Bazel cache sweeper CLI
//!
//! Entry point for the `bazel-sweep` command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::SystemTime;

use bazel_sweep::policy::{CacheEntry, Decision, SkipReason};
use bazel_sweep::signal::EXIT_CODE_INTERRUPTED;
use bazel_sweep::{
    logging, CacheSweeper, CliOverrides, FsRemover, RunSummary, SignalHandler, SweepConfig,
    SweepError,
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bazel-sweep")]
#[command(about = "Bound a Bazel cache directory by access time", version)]
struct Cli {
    /// Log every classification decision
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Path to config file (default: .bazel-sweep.toml if present)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove cache entries not accessed within the retention window
    Clean {
        #[command(flatten)]
        sweep: SweepArgs,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how paths would be classified, without deleting anything
    Explain {
        #[command(flatten)]
        sweep: SweepArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Paths to classify (relative paths are taken from the cache root)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct SweepArgs {
    /// Path to the Bazel cache directory to clean
    #[arg(long)]
    bazel_cache_dir: Option<PathBuf>,

    /// Keep entries accessed within this many days
    #[arg(long)]
    keep_files_access_days: Option<u32>,

    /// File listing the external repository targets to keep, one per line
    #[arg(long)]
    external_repo_target_list: Option<PathBuf>,
}

impl SweepArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            cache_dir: self.bazel_cache_dir.clone(),
            keep_days: self.keep_files_access_days,
            reference_list: self.external_repo_target_list.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Clean { sweep, json } => run_clean(cli.config.as_deref(), sweep, *json),
        Commands::Explain { sweep, json, paths } => {
            run_explain(cli.config.as_deref(), sweep, *json, paths)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ SweepError::Interrupted { .. }) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_CODE_INTERRUPTED)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(config_path: Option<&Path>, sweep: &SweepArgs) -> Result<SweepConfig, SweepError> {
    Ok(SweepConfig::load(config_path, &sweep.overrides())?)
}

fn run_clean(config_path: Option<&Path>, sweep: &SweepArgs, json: bool) -> Result<(), SweepError> {
    let config = load_config(config_path, sweep)?;

    let handler = SignalHandler::new();
    if let Err(e) = handler.install() {
        tracing::warn!(error = %e, "could not install interrupt handler");
    }

    let summary = bazel_sweep::run(&config, &FsRemover, &handler.state())?;
    print_summary(&summary, json);
    Ok(())
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("Error serializing output: {}", e),
        }
        return;
    }

    let stats = &summary.stats;
    println!("Cleaned {}", summary.cache_dir);
    println!("  Retention window: {} days", summary.keep_days);
    println!("  Entries visited: {}", stats.visited);
    println!("  Removed: {}", summary.removed);
    println!("  Protected: {}", stats.protected);
    println!("  Active targets skipped: {}", stats.pruned);
    if stats.retained_dirs > 0 {
        println!("  Directories retained: {}", stats.retained_dirs);
    }
    if stats.unresolved > 0 {
        println!("  Unknown access time (kept): {}", stats.unresolved);
    }
}

fn run_explain(
    config_path: Option<&Path>,
    sweep: &SweepArgs,
    json: bool,
    paths: &[PathBuf],
) -> Result<(), SweepError> {
    let config = load_config(config_path, sweep)?;
    config.check_cache_root()?;
    let references = config.load_references()?;
    let policy = config.to_policy(references, SystemTime::now());
    let sweeper = CacheSweeper::new(&policy);

    let mut explained = Vec::with_capacity(paths.len());
    for path in paths {
        let path = if path.is_relative() {
            config.cache_dir.join(path)
        } else {
            path.clone()
        };
        explained.push(sweeper.inspect(&path)?);
    }

    if json {
        let output: Vec<serde_json::Value> = explained
            .iter()
            .map(|(entry, decision)| {
                serde_json::json!({
                    "path": entry.path.display().to_string(),
                    "is_dir": entry.is_dir,
                    "last_access": format_access(entry),
                    "code": decision.to_code(),
                    "result": decision,
                })
            })
            .collect();
        match serde_json::to_string_pretty(&output) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("Error serializing output: {}", e),
        }
    } else {
        for (entry, decision) in &explained {
            println!("{}", entry.path.display());
            println!("  Decision: {}", describe(decision));
            println!("  Code: {}", decision.to_code());
            println!(
                "  Last access: {}",
                format_access(entry).unwrap_or_else(|| "unknown".to_string())
            );
        }
    }
    Ok(())
}

fn format_access(entry: &CacheEntry) -> Option<String> {
    entry
        .last_access
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
}

fn describe(decision: &Decision) -> &'static str {
    match decision {
        Decision::Delete => "would be removed",
        Decision::Protect { .. } => "kept (protected)",
        Decision::PruneSubtree => "kept with its whole subtree (active target)",
        Decision::SkipToContinue { reason } => match reason {
            SkipReason::CacheRoot => "kept (cache root)",
            SkipReason::Recent => "kept (recently accessed)",
            SkipReason::AccessTimeUnknown => "kept (access time unknown)",
            SkipReason::DirectoryRetained => "kept (directory deletion disabled)",
        },
    }
}
