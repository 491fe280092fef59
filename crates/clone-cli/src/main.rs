// ============================================================================
// clone — Chat with a memory-augmented clone from the terminal
// ============================================================================
// Usage:
//   clone                                   Start chatting (same as `clone chat`)
//   clone chat [--self-aware] [--clear-messages] [--top-k N] [--model NAME]
//   clone memories [--limit N]              Summarize the loaded memory table
//
// Global flags:
//   --config PATH     YAML config file (default: config.yml, or $CLONE_CONFIG)
//   --memories PATH   Memory table CSV (overrides memory.path)
//   --verbose         Log progress to stderr
// ============================================================================

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clone_core::config::DEFAULT_CONFIG_PATH;
use clone_core::{
    CloneConfig, EmbeddingService, MemoryTable, OpenAiChatClient, PromptDispatcher, ReplDriver,
    SemanticMemoryStore, TurnOptions,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Memory-augmented chat in the terminal
#[derive(Parser)]
#[command(name = "clone", version, about = "Chat with a clone that remembers what you told it")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, global = true, env = "CLONE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Memory table CSV (overrides memory.path from the config)
    #[arg(long, global = true)]
    memories: Option<PathBuf>,

    /// Log progress to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat loop
    Chat(ChatArgs),

    /// Show a summary of the memory table
    Memories {
        /// Number of memory texts to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Args, Default)]
struct ChatArgs {
    /// Forget earlier turns before every question
    #[arg(long)]
    clear_messages: bool,

    /// Prepend the self-aware persona to every request
    #[arg(long)]
    self_aware: bool,

    /// Memories injected per question (overrides memory.top_k)
    #[arg(long)]
    top_k: Option<usize>,

    /// Chat model (overrides openai.model)
    #[arg(long)]
    model: Option<String>,
}

fn init_logging(verbose: bool) {
    let default_directives = if verbose {
        "clone_core=debug,clone=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    let dotenv = dotenvy::dotenv();
    init_logging(cli.verbose);
    if let Err(e) = dotenv {
        debug!("No .env file loaded: {}", e);
    }

    match cli.command.unwrap_or(Commands::Chat(ChatArgs::default())) {
        Commands::Chat(args) => cmd_chat(cli.config, cli.memories, args).await,
        Commands::Memories { limit } => cmd_memories(cli.config, cli.memories, limit),
    }
}

/// Command-line flags take precedence over the config file
fn apply_overrides(config: &mut CloneConfig, memories: Option<PathBuf>, args: &ChatArgs) {
    if let Some(path) = memories {
        config.memory.path = path;
    }
    if let Some(top_k) = args.top_k {
        config.memory.top_k = top_k;
    }
    if let Some(model) = &args.model {
        config.openai.model = model.clone();
    }
}

async fn cmd_chat(config_path: PathBuf, memories: Option<PathBuf>, args: ChatArgs) -> Result<()> {
    let mut config = CloneConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    apply_overrides(&mut config, memories, &args);

    let table = MemoryTable::load(&config.memory.path).with_context(|| {
        format!("Failed to load memories from {}", config.memory.path.display())
    })?;

    let embeddings = EmbeddingService::from_config(&config.openai)?;
    let store = SemanticMemoryStore::new(Arc::new(table), embeddings);
    let completion = OpenAiChatClient::new(&config.openai)?;
    let dispatcher = PromptDispatcher::from_config(&config);

    info!(
        "Chat ready: model {}, top_k {}, self_aware={}, clear_messages={}",
        completion.model(),
        dispatcher.top_k(),
        args.self_aware,
        args.clear_messages
    );

    let mut driver = ReplDriver::new(dispatcher, store, completion).with_options(TurnOptions {
        clear_messages: args.clear_messages,
        self_aware: args.self_aware,
    });

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let summary = driver.run(stdin, &mut stdout).await?;

    info!(
        "Session ended ({:?}): {} turns, {} failed",
        summary.exit, summary.turns, summary.failed_turns
    );
    Ok(())
}

fn cmd_memories(config_path: PathBuf, memories: Option<PathBuf>, limit: usize) -> Result<()> {
    let path = match memories {
        Some(path) => path,
        None => {
            CloneConfig::read(&config_path)
                .with_context(|| format!("Failed to load config from {}", config_path.display()))?
                .memory
                .path
        }
    };

    let table = MemoryTable::load(&path)
        .with_context(|| format!("Failed to load memories from {}", path.display()))?;
    let stats = table.stats();

    println!("=== Memory Table ===");
    println!("File:       {}", path.display());
    println!("Memories:   {}", stats.total);
    println!("Embedded:   {}", stats.embedded);
    match stats.dimension {
        Some(dim) => println!("Dimension:  {}", dim),
        None => println!("Dimension:  -"),
    }

    if table.is_empty() || limit == 0 {
        return Ok(());
    }

    println!();
    println!("{:<10}  {}", "ID", "TEXT");
    println!("{}", "-".repeat(70));
    for record in table.records().iter().take(limit) {
        let text: String = record.text.chars().take(58).collect();
        println!("{:<10}  {}", record.id, text);
    }
    if table.len() > limit {
        println!("... and {} more", table.len() - limit);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_chat_is_default() {
        let cli = Cli::try_parse_from(["clone", "--memories", "data.csv"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.memories, Some(PathBuf::from("data.csv")));
    }

    #[test]
    fn test_chat_flags() {
        let cli = Cli::try_parse_from([
            "clone",
            "chat",
            "--self-aware",
            "--clear-messages",
            "--top-k",
            "3",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Chat(args)) => {
                assert!(args.self_aware);
                assert!(args.clear_messages);
                assert_eq!(args.top_k, Some(3));
                assert!(args.model.is_none());
            }
            _ => panic!("expected chat subcommand"),
        }
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "clone",
            "--memories",
            "other.csv",
            "chat",
            "--top-k",
            "0",
            "--model",
            "gpt-4o-mini",
        ])
        .unwrap();
        let args = match cli.command {
            Some(Commands::Chat(args)) => args,
            _ => panic!("expected chat subcommand"),
        };

        let mut config = CloneConfig::default();
        apply_overrides(&mut config, cli.memories, &args);

        assert_eq!(config.memory.path, PathBuf::from("other.csv"));
        assert_eq!(config.memory.top_k, 0);
        assert_eq!(config.openai.model, "gpt-4o-mini");
    }

    #[test]
    fn test_absent_flags_keep_config_values() {
        let mut config = CloneConfig::default();
        config.memory.top_k = 7;
        config.openai.model = "from-file".to_string();

        apply_overrides(&mut config, None, &ChatArgs::default());

        assert_eq!(config.memory.path, PathBuf::from(clone_core::config::DEFAULT_MEMORY_PATH));
        assert_eq!(config.memory.top_k, 7);
        assert_eq!(config.openai.model, "from-file");
    }
}
