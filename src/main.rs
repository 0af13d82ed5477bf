//! fmb - command-line front end for the fmbridge filesystem facade.
//!
//! Usage:
//!   fmb cp SRC DST        Copy a file or directory tree
//!   fmb mv SRC DST        Move a file or directory tree
//!   fmb rm [-r] PATH      Remove a file (or a tree with -r)
//!   fmb stat PATH         Show entry information
//!   fmb mime PATH|URL     Show the MIME type
//!   fmb exists PATH       Check whether a path exists
//!   fmb home | root | data-dir

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};

use fmbridge_core::{EntryInfo, FacadeConfig};
use fmbridge_ops::{CopyStats, FileManager};

#[derive(Parser)]
#[command(
    name = "fmb",
    version,
    about = "Copy, move, remove and inspect files",
    long_about = "fmb drives the fmbridge filesystem facade from the command line.\n\n\
                  Copies and moves run on background workers and are awaited \
                  before the command exits."
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy a file or directory tree
    Cp {
        source: PathBuf,
        target: PathBuf,

        /// Replace existing files
        #[arg(short, long)]
        force: bool,
    },

    /// Move a file or directory tree
    Mv {
        source: PathBuf,
        target: PathBuf,

        /// Replace an existing target
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a file, or a directory tree with -r
    Rm {
        path: PathBuf,

        /// Remove directories and their contents
        #[arg(short, long)]
        recursive: bool,

        /// Move to trash instead of deleting
        #[arg(short, long)]
        trash: bool,
    },

    /// Show information about an entry
    Stat {
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the MIME type of a path or URL
    Mime { url: String },

    /// Check whether a path exists (exit status 1 if not)
    Exists { path: PathBuf },

    /// Print the home directory
    Home,

    /// Print the filesystem root
    Root,

    /// Print the application data directory
    DataDir {
        /// Create the directory if it is missing
        #[arg(long)]
        create: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(run(cli.command, config))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the facade configuration from a TOML file, or use defaults.
fn load_config(path: Option<&Path>) -> Result<FacadeConfig> {
    let Some(path) = path else {
        return Ok(FacadeConfig::default());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: FacadeConfig =
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?;
    config.validate()?;

    tracing::debug!(config = %path.display(), "configuration loaded");
    Ok(config)
}

async fn run(command: Command, mut config: FacadeConfig) -> Result<()> {
    match command {
        Command::Cp {
            source,
            target,
            force,
        } => {
            config.overwrite |= force;
            let fm = FileManager::new(config)?;
            let stats = fm
                .copy_file(&source, &target)
                .wait()
                .await
                .with_context(|| format!("Copy of {} failed", source.display()))?;
            print_stats("Copied", &stats);
        }
        Command::Mv {
            source,
            target,
            force,
        } => {
            config.overwrite |= force;
            let fm = FileManager::new(config)?;
            let stats = fm
                .move_file(&source, &target)
                .wait()
                .await
                .with_context(|| format!("Move of {} failed", source.display()))?;
            print_stats("Moved", &stats);
        }
        Command::Rm {
            path,
            recursive,
            trash,
        } => {
            config.use_trash |= trash;
            let fm = FileManager::new(config)?;
            if fm.stat(&path).is_ok_and(|info| info.is_dir()) {
                if !recursive {
                    bail!("{} is a directory (use -r)", path.display());
                }
                fm.remove_dir(&path)?;
            } else {
                fm.remove(&path)?;
            }
        }
        Command::Stat { path, format } => {
            let fm = FileManager::new(config)?;
            let info = fm.stat(&path)?;
            match format {
                OutputFormat::Text => print_entry(&info, &fm.mime(&path.to_string_lossy())),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
            }
        }
        Command::Mime { url } => {
            let fm = FileManager::new(config)?;
            println!("{}", fm.mime(&url));
        }
        Command::Exists { path } => {
            let fm = FileManager::new(config)?;
            let exists = fm.exists_path(&path);
            println!("{exists}");
            if !exists {
                std::process::exit(1);
            }
        }
        Command::Home => {
            let fm = FileManager::new(config)?;
            match fm.home() {
                Some(home) => println!("{}", home.display()),
                None => bail!("No home directory found"),
            }
        }
        Command::Root => {
            let fm = FileManager::new(config)?;
            println!("{}", fm.root().display());
        }
        Command::DataDir { create } => {
            let fm = FileManager::new(config)?;
            let dir = if create {
                fm.ensure_data_dir()?
            } else {
                fm.data_dir()?
            };
            println!("{}", dir.display());
        }
    }

    Ok(())
}

fn print_stats(action: &str, stats: &CopyStats) {
    println!(
        "{} {} files, {} directories ({})",
        action,
        stats.files,
        stats.directories,
        format_size(stats.bytes)
    );
}

fn print_entry(info: &EntryInfo, mime: &str) {
    println!("{}", "─".repeat(60));
    println!(" {}", info.path.display());
    println!("{}", "─".repeat(60));
    println!(" Kind:      {}", info.kind);
    println!(" Size:      {}", format_size(info.size));
    println!(" MIME:      {mime}");
    if let Some(modified) = info.modified {
        println!(" Modified:  {}", modified.format("%Y-%m-%d %H:%M:%S"));
    }
    println!(" Hidden:    {}", if info.hidden { "yes" } else { "no" });
    println!(" Read-only: {}", if info.readonly { "yes" } else { "no" });
}

/// Format a byte count.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
