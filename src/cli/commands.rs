use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// `boltconsent` - consent enforcement engine for embedded cookie banners.
#[derive(Parser, Debug)]
#[command(name = "boltconsent")]
#[command(version = "0.1.0")]
#[command(about = "Probe deny-lists, compute consent signals and simulate page loads.", long_about = None)]
pub struct Cli {
    /// TOML config file (environment variables still override it)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a script URL or cookie write against the deny-lists
    Probe {
        #[command(subcommand)]
        probe_command: ProbeCommands,
    },

    /// Print the consent signals a decision produces
    Signals {
        /// Decision as a JSON object, e.g. '{"necessary":true,"statistics":false}'
        decision: String,
    },

    /// Run the engine against an in-memory page and print the resulting posture
    Simulate {
        /// Hostname the simulated page is served from
        #[arg(long, default_value = "localhost")]
        hostname: String,

        /// Decision to take after initialization
        #[arg(long, value_enum, default_value_t = DecisionArg::None)]
        decision: DecisionArg,

        /// Use a built-in backend instead of the configured API
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProbeCommands {
    /// Would a script with this `src` be blocked?
    Script { url: String },
    /// Would this `document.cookie` write be dropped?
    Cookie { write: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecisionArg {
    Accept,
    Reject,
    None,
}
