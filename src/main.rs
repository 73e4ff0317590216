use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use implindex::connector::api::{Container, ContainerConfig, Router};
use implindex::{Commands, DEFAULT_LOAD_CONCURRENCY};

#[derive(Parser)]
#[command(name = "implindex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding implementor fragments (`.json` or rustdoc `.js`)
    #[arg(
        short = 'd',
        long,
        global = true,
        env = "IMPLINDEX_FRAGMENTS_DIR",
        default_value = "target/doc/implementors"
    )]
    fragments_dir: String,

    /// Number of fragments fetched and decoded at once
    #[arg(long, global = true, env = "IMPLINDEX_CONCURRENCY", default_value_t = DEFAULT_LOAD_CONCURRENCY)]
    concurrency: usize,

    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let fallback = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(ContainerConfig {
        fragments_dir: expand_tilde(&cli.fragments_dir),
        concurrency: cli.concurrency.max(1),
        show_progress: cli.progress,
    })
    .await?;

    let router = Router::new(&container);
    let output = router.route(cli.command).await?;
    println!("{}", output);

    Ok(())
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use implindex::OutputFormat;

    #[test]
    fn implementors_accepts_format_and_timeout() {
        let cli = Cli::try_parse_from([
            "implindex",
            "implementors",
            "iron::middleware::Handler",
            "--format",
            "json",
            "--timeout-ms",
            "250",
        ])
        .expect("valid invocation");

        match cli.command {
            Commands::Implementors {
                interface,
                format,
                timeout_ms,
            } => {
                assert_eq!(interface, "iron::middleware::Handler");
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(timeout_ms, Some(250));
            }
            _ => panic!("expected the implementors command"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["implindex", "stats", "-d", "/tmp/frags", "--concurrency", "2"])
            .expect("valid invocation");
        assert_eq!(cli.fragments_dir, "/tmp/frags");
        assert_eq!(cli.concurrency, 2);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let res = Cli::try_parse_from(["implindex", "check", "--format", "yaml"]);
        assert!(res.is_err());
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = std::env::var_os("HOME") {
            let expanded = expand_tilde("~/docs");
            assert_eq!(expanded, format!("{}/docs", home.to_string_lossy()));
        }
        assert_eq!(expand_tilde("/abs/path"), "/abs/path");
    }
}
