//! zipkit-cli - Command-line interface for zipkit
//!
//! Every archive subcommand prints its result as JSON on stdout and exits
//! with a code derived from the failure kind. Logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use zipkit_core::config::Config;
use zipkit_core::{archive, SourceSpec};

mod report;

/// zipkit - list, create, extract and test ZIP archives
#[derive(Parser)]
#[command(name = "zipkit")]
#[command(author, version, about = "List, create, extract and test ZIP archives", long_about = None)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, env = "ZIPKIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List archive members
    List {
        /// Archive file
        archive: String,
    },

    /// Create an archive from files and directories
    Create {
        /// Archive file to create
        archive: String,

        /// Source files or directories; each may be a semicolon-joined list
        #[arg(required = true)]
        sources: Vec<String>,

        /// Prefix removed from every source path to form member names
        #[arg(long, default_value = "")]
        root: String,

        /// Replace the archive if it already exists
        #[arg(long, conflicts_with = "no_overwrite")]
        overwrite: bool,

        /// Fail if the archive exists, even when the configuration allows replacing it
        #[arg(long)]
        no_overwrite: bool,

        /// Deflate compression level
        #[arg(long)]
        level: Option<i64>,
    },

    /// Extract a single member
    Extract {
        /// Archive file
        archive: String,

        /// Member name as stored in the archive
        member: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Extract all members
    ExtractAll {
        /// Archive file
        archive: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Verify the CRC and headers of every member
    Test {
        /// Archive file
        archive: String,
    },

    /// Show or change configuration
    Config {
        /// Show current configuration
        #[arg(long, conflicts_with_all = ["path", "set"])]
        show: bool,

        /// Show configuration file path
        #[arg(long, conflicts_with_all = ["show", "set"])]
        path: bool,

        /// Set a value, e.g. `create.overwrite=true`
        #[arg(long, value_name = "KEY=VALUE", conflicts_with_all = ["show", "path"])]
        set: Option<String>,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load_from(path)?),
        None => Ok(Config::load_or_default()),
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::List { archive: file } => report::emit(&archive::list(&file)),

        Commands::Create {
            archive: file,
            sources,
            root,
            overwrite,
            no_overwrite,
            level,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let mut options = config.create_options();
            if level.is_some() {
                options.compression_level = level;
            }
            let overwrite = !no_overwrite && (overwrite || config.create.overwrite);

            let sources = SourceSpec::new(sources.iter().flat_map(|s| s.split(';')));
            report::emit(&archive::create_with_options(
                &file, &sources, &root, overwrite, &options,
            ))
        }

        Commands::Extract {
            archive: file,
            member,
            output,
        } => report::emit(&archive::extract(&file, &member, &output)),

        Commands::ExtractAll {
            archive: file,
            output,
        } => report::emit(&archive::extract_all(&file, &output)),

        Commands::Test { archive: file } => report::emit(&archive::test(&file)),

        Commands::Config { show, path, set } => {
            let config_path = match cli.config {
                Some(path) => path,
                None => Config::config_path()
                    .map_err(|e| anyhow::anyhow!("Failed to get config path: {}", e))?,
            };

            if path {
                println!("{}", config_path.display());
            } else if let Some(assignment) = set {
                let (key, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got {}", assignment))?;

                let mut config = Config::load_from(&config_path)?;
                config.set(key.trim(), value.trim())?;
                config.save_to(&config_path)?;
                info!("Set {} in {}", key.trim(), config_path.display());
            } else if show {
                let config = Config::load_from(&config_path)?;
                println!("{}", toml::to_string_pretty(&config)?);
            } else {
                eprintln!("Please specify --show, --path or --set");
            }
            info!("Configuration command complete");
            Ok(0)
        }
    }
}
