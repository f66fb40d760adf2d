//! deskagent binary: CLI entry points and the HTTP server.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use deskagent::agent::Agent;
use deskagent::backend::OpenAiCompatBackend;
use deskagent::config::Config;
use deskagent::server;
use deskagent::tools::document_create::DocumentCreateArgs;
use deskagent::tools::file_search::FileSearchArgs;

#[derive(Parser)]
#[command(name = "deskagent", version, about = "Document & file-search agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one planned agent turn for a prompt.
    Chat {
        prompt: String,
    },
    /// Create a document directly, bypassing planning.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "md")]
        format: String,
        /// Sub directory under the allowed output root.
        #[arg(long)]
        output_dir: Option<String>,
    },
    /// Search files directly, bypassing planning.
    Search {
        #[arg(long, default_value = ".")]
        root_path: String,
        #[arg(long, default_value = "*.md")]
        pattern: String,
        #[arg(long, default_value_t = 20)]
        max_results: usize,
    },
    /// Serve the HTTP API.
    Serve {
        /// Override the configured bind address.
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deskagent=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let backend = Arc::new(OpenAiCompatBackend::new(&config.backend));
    let agent = Agent::new(backend, &config.output_root);

    match run(cli.command, agent, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Command,
    agent: Agent,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Chat { prompt } => {
            let result = agent.run_prompt(&prompt).await?;
            println!("{}", result.message);
        }
        Command::Create {
            title,
            content,
            format,
            output_dir,
        } => {
            let result = agent.create_document(&DocumentCreateArgs {
                title,
                content,
                format,
                output_dir,
            })?;
            println!("{}", result.message);
        }
        Command::Search {
            root_path,
            pattern,
            max_results,
        } => {
            let result = agent.search_files(&FileSearchArgs {
                root_path,
                pattern,
                max_results: max_results.clamp(1, 200),
            });
            println!("{}", result.message);
            if let Some(data) = result.data {
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
        }
        Command::Serve { bind } => {
            let addr = bind.unwrap_or(config.bind_addr);
            server::serve(Arc::new(agent), &addr).await?;
        }
    }
    Ok(())
}
