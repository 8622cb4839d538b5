/// CLI argument parsing

use clap::{Parser, Subcommand};

use crate::core::aggregate::RankBy;
use crate::core::log_parser::LogFilter;
use crate::core::registry::StatusFilter;

// Build timestamp injected at compile time
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "dockmon")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides DOCKMON_API_URL and the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show containers with their latest resource usage
    Status {
        /// Which containers to list (all, running, stopped)
        #[arg(short, long, default_value = "all")]
        filter: StatusFilter,
    },

    /// Rank containers by resource usage
    Top {
        /// Ranking field (cpu, memory)
        #[arg(short, long, default_value = "cpu")]
        by: RankBy,

        /// Number of containers to show
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },

    /// Show active resource alerts
    Alerts,

    /// Print the logs of a container for one day
    Logs {
        /// Container name
        container: String,

        /// Day to show (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<chrono::NaiveDate>,

        /// Level filter (all, error, warning, info)
        #[arg(short, long, default_value = "all")]
        level: LogFilter,

        /// Number of lines to request
        #[arg(short = 'n', long)]
        tail: Option<usize>,
    },

    /// Follow the logs of a container in real time
    Watch {
        /// Container name
        container: String,

        /// Level filter (all, error, warning, info)
        #[arg(short, long, default_value = "all")]
        level: LogFilter,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// View the effective configuration
    View,

    /// Print the config file location
    Path,
}
