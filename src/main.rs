//! commitscribe - CLI entry point.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commitscribe::{Config, Tools};

/// Conventional commits with a co-committed changelog.
#[derive(Parser, Debug)]
#[command(name = "commitscribe")]
#[command(about = "Generate conventional commit messages, commit with a changelog entry, and push")]
#[command(version)]
struct Cli {
    /// Changelog path relative to the repository root
    #[arg(long, global = true)]
    changelog: Option<String>,

    /// Ignore untracked files
    #[arg(long, global = true)]
    no_untracked: bool,

    /// Ask the Claude CLI for the message before falling back to heuristics
    #[arg(long, global = true)]
    ai: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the commit message for pending changes without committing
    Preview {
        /// Repository path or remote URL
        path: Option<String>,
    },
    /// Commit pending changes with a changelog entry
    Commit {
        /// Repository path or remote URL
        path: Option<String>,

        /// Push after committing
        #[arg(long)]
        push: bool,
    },
    /// Answer JSON tool calls, one per stdin line, one result per stdout line
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let tools = Tools::new(config);

    match cli.command {
        Command::Preview { path } => {
            let result = tools.generate_commit_message(path.as_deref()).await;
            print_json(&result)?;
        }
        Command::Commit { path, push } => {
            let result = tools.git_commit_and_push(path.as_deref(), push).await;
            print_json(&result)?;
        }
        Command::Serve => serve(&tools).await?,
    }

    Ok(())
}

/// Logs go to stderr; stdout carries JSON results only.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("COMMITSCRIBE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().context("Invalid COMMITSCRIBE_* configuration")?;
    if let Some(changelog) = &cli.changelog {
        config.changelog_file = changelog.clone();
    }
    if cli.no_untracked {
        config.include_untracked = false;
    }
    if cli.ai {
        config.ai_enabled = true;
    }
    config.validate().context("Invalid command-line options")?;
    debug!(?config, "Loaded configuration");
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to encode result")?;
    println!("{text}");
    Ok(())
}

async fn serve(tools: &Tools) -> Result<()> {
    info!("Serving tool calls on stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = tools.dispatch(&line).await;
        let mut encoded = serde_json::to_string(&reply).context("Failed to encode result")?;
        encoded.push('\n');
        stdout
            .write_all(encoded.as_bytes())
            .await
            .context("Failed to write stdout")?;
        stdout.flush().await.context("Failed to flush stdout")?;
    }

    info!("stdin closed, exiting");
    Ok(())
}
