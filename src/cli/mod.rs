use clap::{Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the types implementing an interface
    Implementors {
        /// Interface path, e.g. `iron::middleware::Handler`
        interface: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Give up waiting for the interface's fragment after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// List the interfaces a type implements
    Implements {
        /// Type path or bare type name
        type_name: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Load every fragment and report malformed ones and duplicate interfaces
    Check {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    Stats,
}
