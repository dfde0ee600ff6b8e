use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use todo_cli::app::{self, Command};
use todo_cli::client::HttpTodoApi;
use todo_cli::config::Config;
use todo_cli::state::{ClientState, DEFAULT_STATE_FILE};
use tracing_subscriber::EnvFilter;

/// Terminal client for the todo server
#[derive(Parser, Debug)]
#[command(name = "todo", version)]
struct Cli {
    /// File holding theme, filters, page and local categories between runs
    #[arg(long, global = true, default_value = DEFAULT_STATE_FILE)]
    state_file: PathBuf,

    /// Base URL of the todo server, overrides TODO_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let api = HttpTodoApi::new(cli.api_url.unwrap_or(config.api_url));

    let mut state = ClientState::load(&cli.state_file)?;
    let output = app::execute(&api, &mut state, cli.command).await;
    state.save(&cli.state_file)?;

    if state.has_error() {
        eprintln!("{output}");
        return Ok(ExitCode::FAILURE);
    }
    println!("{output}");
    Ok(ExitCode::SUCCESS)
}
