// ABOUTME: Entry point for threadchat — a terminal client for hosted assistant threads.
// ABOUTME: Parses CLI args, loads config and secrets, gates on login, and launches the app.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use threadchat::app::{self, App};
use threadchat::auth::{self, LoginOutcome};
use threadchat::config::{Config, process_env};
use threadchat::logging;

const LOGIN_ATTEMPTS: u32 = 3;

#[derive(Debug, Parser)]
#[command(
    name = "threadchat",
    version,
    about = "Chat with a hosted assistant and keep your threads"
)]
struct Cli {
    /// Assistant profile from the config file.
    #[arg(short, long)]
    assistant: Option<String>,

    /// Config file (default: ~/.threadchat/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat (the default).
    Chat,
    /// Inspect saved threads.
    Threads {
        #[command(subcommand)]
        action: ThreadsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ThreadsCommand {
    /// List saved threads, newest first.
    List,
    /// Print a saved thread.
    Show { filename: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    // Local .env first, then the per-user secrets file.
    let _ = dotenvy::dotenv();
    let _ = dotenvy::from_path(Config::secrets_env_path());

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command.unwrap_or(Command::Chat) {
        Command::Threads { action } => match action {
            ThreadsCommand::List => app::list_threads(&config),
            ThreadsCommand::Show { filename } => app::show_thread(&config, &filename),
        },
        Command::Chat => {
            let credentials = config.credentials(process_env);
            let outcome = auth::login(
                credentials.as_ref(),
                LOGIN_ATTEMPTS,
                auth::prompt_credentials,
            );
            if outcome == LoginOutcome::Denied {
                anyhow::bail!("Incorrect username or password");
            }

            let profile = config.profile_name(cli.assistant.as_deref()).to_string();
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(App::new(config, profile).run())
        }
    }
}
