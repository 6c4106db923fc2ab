//! Parley CLI - chat with rolling memory and extract contact details

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parley_core::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a friendly assistant. Use the conversation context to answer the user's latest message.";

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Chat with rolling conversation memory and extract contact details", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to parley.toml lookup and PARLEY_* env vars)
    #[arg(short, long, global = true, env = "PARLEY_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat on stdin; /stats, /context and /quit are commands
    Chat {
        /// System prompt for assistant replies
        #[arg(short, long, default_value = DEFAULT_SYSTEM_PROMPT)]
        system: String,

        /// Skip extraction when the session ends
        #[arg(long)]
        no_extract: bool,
    },
    /// Extract contact details from a transcript file ("-" for stdin)
    Extract {
        /// Transcript path
        input: PathBuf,
    },
    /// Version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("parley {}", env!("CARGO_PKG_VERSION"));
            println!("parley-core {}", parley_core::VERSION);
        }
        Commands::Chat { system, no_extract } => {
            let config = load_config(cli.config.as_ref())?;
            let llm = build_provider(&config)?;
            run_chat(llm, config, &system, !no_extract).await?;
        }
        Commands::Extract { input } => {
            let config = load_config(cli.config.as_ref())?;
            let llm = build_provider(&config)?;
            let text = read_input(&input).await?;

            let extractor = InformationExtractor::with_config(llm, config.extraction);
            print_extraction(&extractor, &text).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<ParleyConfig> {
    let config = match path {
        Some(path) => ParleyConfig::from_file(path),
        None => ParleyConfig::load(),
    };
    config.context("Failed to load configuration")
}

fn build_provider(config: &ParleyConfig) -> Result<Arc<dyn LLMProvider>> {
    let llm_config = config.llm.clone().unwrap_or_else(LLMProviderConfig::groq);
    let provider =
        LLMProviderFactory::create(&llm_config).context("Failed to create LLM provider")?;

    let info = provider.model_info();
    tracing::info!(provider = %info.provider, model = %info.model_name, "Completion service ready");
    Ok(provider)
}

async fn read_input(input: &PathBuf) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))
    }
}

async fn run_chat(
    llm: Arc<dyn LLMProvider>,
    config: ParleyConfig,
    system_prompt: &str,
    extract_on_exit: bool,
) -> Result<()> {
    let mut conversation = ConversationManager::new(Arc::clone(&llm), config.conversation.clone());
    // Full transcript for extraction; the manager only keeps a bounded window
    let mut transcript: Vec<String> = Vec::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {
                prompt()?;
                continue;
            }
            "/quit" | "/exit" => break,
            "/stats" => {
                println!("{}", serde_json::to_string_pretty(&conversation.get_stats())?);
                prompt()?;
                continue;
            }
            "/context" => {
                println!("{}", conversation.get_context());
                prompt()?;
                continue;
            }
            _ => {}
        }

        let turn = conversation.add_user_message(input).await;
        if let SummarizationStatus::Failed { error } = &turn.summarization {
            tracing::warn!(turn = turn.turn_count, %error, "Continuing without a fresh summary");
        }
        transcript.push(format!("USER: {}", input));

        let request = LLMRequest {
            messages: conversation.context_messages(system_prompt),
            temperature: Some(0.7),
            max_tokens: Some(500),
            stop_sequences: Vec::new(),
        };

        match llm.generate_request(&request).await {
            Ok(response) => {
                let reply = response.content.trim().to_string();
                println!("assistant> {}", reply);
                transcript.push(format!("ASSISTANT: {}", reply));
                conversation.add_assistant_message(reply).await;
            }
            Err(e) => {
                eprintln!("error: {}", e);
            }
        }

        prompt()?;
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&conversation.get_stats())?);

    if extract_on_exit && !transcript.is_empty() {
        let extractor = InformationExtractor::with_config(llm, config.extraction);
        print_extraction(&extractor, &transcript.join("\n")).await?;
    }

    Ok(())
}

async fn print_extraction(extractor: &InformationExtractor, text: &str) -> Result<()> {
    let record = extractor.extract_information(text).await;
    let report = extractor.validate_extraction(&record);

    let output = serde_json::json!({
        "record": record,
        "validation": report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn prompt() -> Result<()> {
    print!("you> ");
    std::io::stdout().flush()?;
    Ok(())
}
