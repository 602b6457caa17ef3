// ABOUTME: App orchestrator — wires config, gateway, store, and session into a chat loop.
// ABOUTME: Also hosts the non-interactive saved-thread listing and viewing commands.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::chat::{self, Reporter};
use crate::config::{Config, process_env};
use crate::gateway::Gateway;
use crate::session::{Message, Role, Session, ThreadStore};

const HELP: &str = "\
Commands:
  /reset            start a new conversation
  /save             save the current conversation
  /threads          list saved conversations (newest first)
  /load <n|file>    load a saved conversation by list number or filename
  /history          show the current transcript
  /help             show this help
  /quit             exit";

/// One parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Reset,
    Save,
    Threads,
    Load(String),
    History,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Send(line.trim_end_matches(['\r', '\n']).to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "reset" => Command::Reset,
            "save" => Command::Save,
            "threads" | "list" => Command::Threads,
            "load" if !arg.is_empty() => Command::Load(arg.to_string()),
            "history" => Command::History,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(trimmed.to_string()),
        }
    }
}

/// Prints action outcomes to the terminal.
pub struct TerminalReporter;

impl Reporter for TerminalReporter {
    fn info(&mut self, message: &str) {
        println!("  {message}");
    }

    fn warn(&mut self, message: &str) {
        eprintln!("  warning: {message}");
    }

    fn error(&mut self, message: &str) {
        eprintln!("  error: {message}");
    }
}

/// Resolve `/load` input: a 1-based index into the last listing, or a filename.
pub fn resolve_selection(arg: &str, listing: &[String]) -> String {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 && n <= listing.len() => listing[n - 1].clone(),
        _ => arg.to_string(),
    }
}

fn render_message(message: &Message) -> String {
    let label = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    format!("{label}> {}", message.content)
}

fn print_transcript(messages: &[Message]) {
    for message in messages {
        println!("{}", render_message(message));
    }
}

fn print_listing(names: &[String]) {
    if names.is_empty() {
        println!("  No saved threads yet.");
        return;
    }
    for (i, name) in names.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, name);
    }
}

/// Top-level application for the interactive chat.
pub struct App {
    config: Config,
    profile: String,
}

impl App {
    pub fn new(config: Config, profile: impl Into<String>) -> Self {
        Self {
            config,
            profile: profile.into(),
        }
    }

    /// Run the chat loop until `/quit` or end of input.
    pub async fn run(self) -> anyhow::Result<()> {
        let gateway_config = self.config.gateway_config(&self.profile, process_env)?;
        tracing::info!(profile = %self.profile, config = ?gateway_config, "starting chat");
        let gateway = Gateway::new(gateway_config)?;
        let store = ThreadStore::new(self.config.threads_dir());

        let title = self
            .config
            .profile(&self.profile)?
            .title
            .clone()
            .unwrap_or_else(|| "Assistant".to_string());
        println!("{title}");
        println!("Type a message, or /help for commands.");

        let mut session = Session::new();
        let mut reporter = TerminalReporter;
        let mut listing: Vec<String> = Vec::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            match Command::parse(&line) {
                Command::Empty => {}
                Command::Send(text) => {
                    println!("  Thinking...");
                    let reply = chat::send(&gateway, &mut session, &text, &mut reporter).await;
                    if let Some(reply) = reply {
                        println!("{}", render_message(&reply));
                    }
                }
                Command::Reset => chat::reset(&mut session, &mut reporter),
                Command::Save => {
                    chat::save(&store, &session, &mut reporter);
                }
                Command::Threads => {
                    listing = chat::list(&store, &mut reporter);
                    print_listing(&listing);
                }
                Command::Load(arg) => {
                    if listing.is_empty() {
                        listing = chat::list(&store, &mut reporter);
                    }
                    let filename = resolve_selection(&arg, &listing);
                    if chat::load(&store, &mut session, &filename, &mut reporter) {
                        print_transcript(&session.messages);
                    }
                }
                Command::History => print_transcript(&session.messages),
                Command::Help => println!("{HELP}"),
                Command::Quit => break,
                Command::Unknown(input) => {
                    reporter.warn(&format!("unknown command: {input} (try /help)"));
                }
            }
        }

        tracing::info!(messages = session.messages.len(), "chat ended");
        Ok(())
    }
}

/// Print saved thread filenames, newest first.
pub fn list_threads(config: &Config) -> anyhow::Result<()> {
    let store = ThreadStore::new(config.threads_dir());
    print_listing(&store.list()?);
    Ok(())
}

/// Print one saved thread's transcript.
pub fn show_thread(config: &Config, filename: &str) -> anyhow::Result<()> {
    let store = ThreadStore::new(config.threads_dir());
    let saved = store.load(filename)?;
    if saved.thread_id.is_empty() {
        println!("saved {}", saved.timestamp);
    } else {
        println!("thread {} saved {}", saved.thread_id, saved.timestamp);
    }
    print_transcript(&saved.messages);
    Ok(())
}
