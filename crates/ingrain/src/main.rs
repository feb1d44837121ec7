//! ingrain - quiz yourself on the notes you have looked at least recently.
//!
//! Reads answers and `:commands` from stdin, writes the quiz transcript to
//! stdout and logs to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ingrain::commands::{self, Command};
use ingrain::VaultDirectory;
use ingrain_core::session::{Inbound, Phase, ReviewSession};
use ingrain_core::{
    DocumentSource, IngrainConfig, JsonFileBackend, LlmProvider, LlmQuizClient, QuizGenerator,
    ReviewRecordStore, SystemClock,
};
use ingrain_llm::LlmFactory;

const EVENT_WAIT: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "ingrain")]
#[command(about = "Review stale notes with generated quizzes")]
#[command(version)]
struct Args {
    /// Config file (.toml, .json or .yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of markdown notes
    #[arg(long)]
    vault: Option<PathBuf>,

    /// Review data file
    #[arg(long)]
    data: Option<PathBuf>,

    /// Text-generation provider: openai, anthropic or ollama
    #[arg(long)]
    provider: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,
}

enum Input {
    Line(std::io::Result<Option<String>>),
    Session(Inbound),
    DisplayChanged,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the transcript.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let store = Arc::new(
        ReviewRecordStore::load(
            Arc::new(JsonFileBackend::new(&config.data_path)),
            Arc::new(SystemClock),
        )
        .await,
    );
    tracing::info!(path = %config.data_path.display(), "Review data");

    let vault = Arc::new(VaultDirectory::new(&config.vault_dir));
    let source: Arc<dyn DocumentSource> = vault.clone();
    let generator = build_generator(&config)?;

    let mut session = ReviewSession::open(source, store, generator)
        .await
        .with_context(|| format!("failed to open vault {}", config.vault_dir.display()))?;
    let mut display = session.subscribe_display();

    println!("{}", commands::HELP);
    session.initialize();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line),
            inbound = session.recv_inbound() => Input::Session(inbound),
            changed = display.changed() => match changed {
                Ok(()) => Input::DisplayChanged,
                Err(_) => break,
            },
        };

        match input {
            Input::Line(Ok(Some(line))) => {
                if !handle_command(&mut session, &vault, Command::parse(&line)).await {
                    break;
                }
            }
            Input::Line(Ok(None)) => break,
            Input::Line(Err(e)) => {
                tracing::error!("Failed to read stdin: {}", e);
                break;
            }
            Input::Session(inbound) => {
                session.apply(inbound).await;
            }
            Input::DisplayChanged => {
                let text = commands::render(&display.borrow_and_update());
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
        }
    }

    session.abort();
    tracing::info!("Session closed");
    Ok(())
}

// Returns false to quit.
async fn handle_command(session: &mut ReviewSession, vault: &VaultDirectory, command: Command) -> bool {
    let accepted = match command {
        Command::Quit => return false,
        Command::Empty => return true,
        Command::Help => {
            println!("{}", commands::HELP);
            return true;
        }
        Command::Unknown(text) => {
            println!("Unknown command {}. Type :help for the list.", text);
            return true;
        }
        Command::Rescan => {
            match vault.rescan().await {
                Ok(summary) => {
                    println!("{} note(s) added, {} removed.", summary.created, summary.deleted);
                    apply_document_events(session, summary.created + summary.deleted).await;
                    session.initialize();
                }
                Err(e) => println!("Error: {}", e),
            }
            return true;
        }
        Command::Answer(answer) => session.submit(&answer),
        Command::Skip => session.skip(),
        Command::Next => session.next(),
        Command::Retry => session.retry(),
        Command::Abort => session.abort(),
    };

    if !accepted {
        if session.phase() == Phase::AwaitingAnswer && !session.display().can_submit {
            println!("No quiz loaded. Use :retry or :skip.");
        } else {
            println!("Not now ({}).", session.phase());
        }
    }
    true
}

// Feeds `count` pending document events to the session. Request completions
// arriving meanwhile are applied as usual.
async fn apply_document_events(session: &mut ReviewSession, mut count: usize) {
    while count > 0 {
        let inbound = match tokio::time::timeout(EVENT_WAIT, session.recv_inbound()).await {
            Ok(inbound) => inbound,
            Err(_) => {
                tracing::warn!(missing = count, "Timed out waiting for document events");
                return;
            }
        };
        if matches!(inbound, Inbound::Document(_)) {
            count -= 1;
        }
        session.apply(inbound).await;
    }
}

fn load_config(args: &Args) -> Result<IngrainConfig> {
    let mut config = match &args.config {
        Some(path) => IngrainConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => IngrainConfig::default(),
    };
    config.apply_env().context("invalid environment configuration")?;

    if let Some(vault) = &args.vault {
        config.vault_dir = vault.clone();
    }
    if let Some(data) = &args.data {
        config.data_path = data.clone();
    }
    if let Some(provider) = &args.provider {
        config.llm.provider = provider.parse::<LlmProvider>()?;
    }
    if let Some(model) = &args.model {
        config.llm.config.model = model.clone();
    }
    config.load_api_key_from_env();
    Ok(config)
}

// A missing key is not fatal: the session shows the error in place of quizzes.
fn build_generator(config: &IngrainConfig) -> Result<Arc<dyn QuizGenerator>> {
    let client = match LlmFactory::from_config(&config.llm) {
        Ok(llm) => LlmQuizClient::new(llm).with_options(config.generation_options()),
        Err(e) if e.is_configuration() => {
            tracing::warn!("Quiz generation unavailable: {}", e);
            LlmQuizClient::unconfigured(e.to_string())
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Arc::new(client.with_prompts(config.quiz_prompts())))
}
