use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tandem_interface::ProviderStream;
use tandem_server::{AppConfig, build_providers, dry_run, init_observability, serve};

#[derive(Parser, Debug)]
#[command(author, version, about = "Tandem: side-by-side LLM streaming relay", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "TANDEM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding configuration
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Keep runs in memory instead of PostgreSQL
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Stream a prompt through each provider and print chunks and metrics
    DryRun {
        /// Prompt to send
        #[arg(default_value = "hello world")]
        prompt: String,

        /// Number of leading chunks to print per provider
        #[arg(long, default_value_t = 5)]
        chunks: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    init_observability(&config.logging)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, cli.in_memory).await?,
        Command::DryRun { prompt, chunks } => {
            let (openai, gemini) = build_providers(&config.providers)?;
            let providers: [Arc<dyn ProviderStream>; 2] = [openai, gemini];
            for report in dry_run(&providers, &prompt, chunks).await? {
                println!("--- First {} {} chunks ---", chunks, report.provider);
                for chunk in &report.first_chunks {
                    println!("{}", chunk);
                }
                println!();
                println!(
                    "{} metrics: {}",
                    report.model,
                    serde_json::to_string_pretty(&report.run)?
                );
                println!();
            }
        }
    }

    Ok(())
}
