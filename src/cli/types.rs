use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Main CLI parser structure
#[derive(Parser)]
#[command(name = "smart-toc")]
#[command(about = "Analyze captured pages the way the table of contents overlay sees them", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show the full backtrace when an error occurs
    #[arg(short, long, default_value_t = false)]
    pub trace: bool,

    /// Enable verbose debugging
    #[arg(short = 'g', long, default_value_t = false)]
    pub debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

/// Output format for settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Yaml,
    Json,
    Toml,
}

/// Subcommands for the CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Run detection, placement and scroll tracking on a page snapshot
    #[command(alias = "a")]
    Analyze {
        /// Page snapshot (JSON)
        snapshot: PathBuf,

        /// Settings file (YAML, TOML or JSON) merged over the defaults
        #[arg(short, long, value_name = "CONFIG_FILE")]
        config: Option<PathBuf>,

        /// Print the rendered overlay markup
        #[arg(long, default_value_t = false)]
        html: bool,

        /// Print the result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Tell whether a URL is excluded from the table of contents
    #[command(alias = "c")]
    CheckUrl {
        url: String,

        /// Settings file (YAML, TOML or JSON) merged over the defaults
        #[arg(short, long, value_name = "CONFIG_FILE")]
        config: Option<PathBuf>,
    },

    /// Print the default settings
    Defaults {
        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },

    /// Show or replace the settings kept in the settings store
    Settings {
        /// Store file (defaults to the user configuration directory)
        #[arg(short, long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Validate this settings file and save it to the store
        #[arg(long, value_name = "CONFIG_FILE")]
        set: Option<PathBuf>,
    },
}
