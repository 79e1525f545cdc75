//! toolrouter — semantic prompt routing and validated tool dispatch.
//!
//! Usage:
//!   toolrouter init                 Write default config and routes
//!   toolrouter route <QUERY>        Pick the closest prompt template
//!   toolrouter dispatch <RESPONSE>  Dispatch a model response to a tool
//!   toolrouter ask <QUERY>          Let the model pick a tool, then run it
//!   toolrouter tools                Print tool definitions as JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use toolrouter::config::{self, EmbeddingBackend, ToolrouterConfig};
use toolrouter::embedding::{Embedder, HashingEmbedder, HttpEmbedder};
use toolrouter::llm::CompletionClient;
use toolrouter::router::PromptRouter;
use toolrouter::tools::{builtin_registry, DispatchResult, Dispatcher};
use toolrouter::types::*;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "toolrouter")]
#[command(version)]
#[command(about = "Semantic prompt routing and validated tool dispatch")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to toolrouter home directory (default: ~/.toolrouter).
    #[arg(long)]
    home: Option<String>,

    /// Log level (debug, info, warn, error); overrides `log_level` in the config.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config and routes file.
    Init {
        /// Overwrite existing files.
        #[arg(long)]
        force: bool,
    },

    /// Route a query to the closest prompt template.
    Route {
        /// The user query.
        query: String,

        /// Send the rendered prompt to the completion model.
        #[arg(long)]
        complete: bool,
    },

    /// Dispatch a raw model response against the built-in tools.
    Dispatch {
        /// The model response; `-` reads it from stdin.
        response: String,
    },

    /// Offer the built-in tools to the model and dispatch its answer.
    Ask {
        /// The user query.
        query: String,
    },

    /// Print the built-in tool definitions as JSON.
    Tools,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let home_dir = match &cli.home {
        Some(home) => PathBuf::from(shellexpand::tilde(home).into_owned()),
        None => config::default_home_dir(),
    };

    // Initialize logging; a broken config is reported by the command itself
    let file_config = config::load_config(&home_dir.join(config::CONFIG_FILE)).unwrap_or_default();
    let log_level = file_config.effective_log_level(cli.log_level.as_deref());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { force } => cmd_init(&home_dir, force),
        Commands::Route { query, complete } => cmd_route(&home_dir, &query, complete).await,
        Commands::Dispatch { response } => cmd_dispatch(&response),
        Commands::Ask { query } => cmd_ask(&home_dir, &query).await,
        Commands::Tools => cmd_tools(),
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_init(home_dir: &Path, force: bool) -> Result<()> {
    let config_path = home_dir.join(config::CONFIG_FILE);
    let routes_path = home_dir.join("routes.yml");

    if config_path.exists() && !force {
        println!(
            "{} Config already exists at {} (use --force to overwrite)",
            "!!!".yellow().bold(),
            config_path.display()
        );
        return Ok(());
    }

    let cfg = ToolrouterConfig {
        routes_path: routes_path.to_string_lossy().into_owned(),
        ..Default::default()
    };
    config::save_config(&cfg, &config_path)?;
    config::save_routes(&config::default_routes(), &routes_path)?;

    println!(
        "{} Wrote {} and {}",
        ">>>".green().bold(),
        config_path.display(),
        routes_path.display()
    );
    Ok(())
}

async fn cmd_route(home_dir: &Path, query: &str, complete: bool) -> Result<()> {
    let cfg = load(home_dir)?;
    let routes = config::load_routes(Path::new(&cfg.resolved_routes_path()))?;
    let embedder = build_embedder(&cfg);

    let router = PromptRouter::from_templates(embedder.as_ref(), &routes).await?;
    let decision = router.route(embedder.as_ref(), &Query::new(query)).await?;

    println!(
        "{} {} (similarity {:.3})",
        "Route:".bold(),
        decision.label.green().bold(),
        decision.score
    );
    println!();
    println!("{}", decision.prompt);

    if complete {
        let client = CompletionClient::new(&cfg.api_base_url, &cfg.effective_api_key());
        let answer = client
            .complete(
                &cfg.completion_model,
                &[ChatMessage::user(decision.prompt)],
                &[],
                cfg.max_tokens,
            )
            .await?;
        println!();
        println!("{}", answer);
    }

    Ok(())
}

fn cmd_dispatch(response: &str) -> Result<()> {
    let raw = if response == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read response from stdin")?;
        buf
    } else {
        response.to_string()
    };

    let dispatcher = Dispatcher::new(builtin_registry()?);
    let result = dispatcher.dispatch(&raw);
    print_result(&result)
}

async fn cmd_ask(home_dir: &Path, query: &str) -> Result<()> {
    let cfg = load(home_dir)?;
    let dispatcher = Dispatcher::new(builtin_registry()?);
    let client = CompletionClient::new(&cfg.api_base_url, &cfg.effective_api_key());
    let definitions = dispatcher.tool_definitions();

    let mut messages = vec![
        ChatMessage::system(cfg.system_prompt.clone()),
        ChatMessage::user(query),
    ];

    let raw = client
        .complete(&cfg.completion_model, &messages, &definitions, cfg.max_tokens)
        .await?;
    let result = dispatcher.dispatch(&raw);

    if let Some(trace) = &result.trace {
        eprintln!("{}", trace.to_string().dimmed());
    }

    // Feed a successful, non-final tool result back for a final answer
    let needs_followup = result.trace.is_some() && result.is_success() && !result.direct_return;
    if !needs_followup {
        return print_answer(&result);
    }

    info!("Sending tool result back to the model");
    let (Some(trace), Some(output)) = (&result.trace, result.output_text()) else {
        return print_answer(&result);
    };
    messages.push(ChatMessage {
        role: ChatRole::Assistant,
        content: trace.to_string(),
    });
    messages.push(ChatMessage::user(format!(
        "The tool returned: {}\nUse it to answer the original question.",
        output
    )));

    let answer = client
        .complete(&cfg.completion_model, &messages, &[], cfg.max_tokens)
        .await?;
    println!("{}", answer);
    Ok(())
}

fn cmd_tools() -> Result<()> {
    let dispatcher = Dispatcher::new(builtin_registry()?);
    let json = serde_json::to_string_pretty(&dispatcher.tool_definitions())?;
    println!("{}", json);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load config from the home directory (defaults if absent).
fn load(home_dir: &Path) -> Result<ToolrouterConfig> {
    let config_path = home_dir.join(config::CONFIG_FILE);
    config::load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))
}

fn build_embedder(cfg: &ToolrouterConfig) -> Box<dyn Embedder> {
    match cfg.embedding_backend {
        EmbeddingBackend::Http => Box::new(HttpEmbedder::new(
            &cfg.api_base_url,
            &cfg.effective_api_key(),
            &cfg.embedding_model,
            0,
        )),
        EmbeddingBackend::Hashing => Box::new(HashingEmbedder::new(cfg.hashing_dimensions)),
    }
}

fn print_result(result: &DispatchResult) -> Result<()> {
    if let Some(error) = &result.error {
        warn!("Dispatch rejected: {}", error);
    }
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

fn print_answer(result: &DispatchResult) -> Result<()> {
    match (&result.error, result.output_text()) {
        (Some(error), _) => println!("{} {}", "Error:".red().bold(), error),
        (None, Some(text)) => println!("{}", text),
        (None, None) => {}
    }
    Ok(())
}
