use clap::{Parser, Subcommand};

mod commands;
mod pipeline;

use commands::{CheckArgs, EvaluateArgs};

#[derive(Parser)]
#[command(name = "parity-check")]
#[command(about = "Put-call parity checker for listed option chains", long_about = None)]
struct Cli {
    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a ticker's option chains and report parity gaps per expiry
    Check(CheckArgs),
    /// Evaluate a chain CSV against a market context given on the command line
    Evaluate(EvaluateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .init();
        }
    }

    match cli.command {
        Commands::Check(args) => {
            commands::run_check(args).await?;
        }
        Commands::Evaluate(args) => {
            commands::run_evaluate(args)?;
        }
    }

    Ok(())
}
