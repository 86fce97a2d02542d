//! 🧠 Brain Service - wallet activity triage and research
//!
//! `run` streams watched wallets through the classifier and research agent
//! with a JSONL audit trail. `replay` pushes a wallet's recent history
//! through the same path and prints every step.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use entity_memory::EntityMemory;
use log::info;

use brain::config::Config;
use brain::llm::{AnthropicClient, LlmClient};
use brain::orchestrator::{BatchProcessor, Orchestrator};
use brain::replay::{print_step, replay, ReplayOptions, ReplayPrinter};
use brain::research::{JupiterTokensClient, ResearchAgent};
use brain::{AuditLogger, ClassifierBrain};
use tx_parser::{LedgerClient, SolanaLedgerClient};

#[derive(Parser, Debug)]
#[command(name = "brain", about = "Classify and research watched Solana wallet activity")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream watched wallets through classification and research
    Run,
    /// Replay a wallet's recent history through classification and research
    Replay {
        #[arg(long, env = "EXAMPLE_WALLET")]
        wallet: String,
        #[arg(long, default_value_t = 20)]
        count: usize,
        #[arg(long, default_value_t = 5)]
        batch_size: usize,
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
        /// Start from an empty entity memory
        #[arg(long)]
        no_seed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("✅ Configuration: Loaded");

    let ledger: Arc<dyn LedgerClient> = Arc::new(SolanaLedgerClient::new(
        &config.app.rpc.rpc_url,
        &config.app.rpc.ws_url,
        &config.app.rpc.commitment,
    ));

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(ledger, &config).await,
        Command::Replay {
            wallet,
            count,
            batch_size,
            delay_ms,
            no_seed,
        } => {
            let memory = build_memory(config.seed_entities && !no_seed)?;
            let agent = build_agent(&config, memory.clone())?
                .map(|agent| agent.with_step_observer(Arc::new(print_step)));
            let mut processor =
                BatchProcessor::new(build_classifier(&config)?, memory).with_hooks(Arc::new(ReplayPrinter));
            if let Some(agent) = agent {
                processor = processor.with_research(agent);
            }

            let options = ReplayOptions {
                wallet,
                count,
                batch_size,
                delay: Duration::from_millis(delay_ms),
            };
            replay(ledger.as_ref(), &processor, &options).await?;
            Ok(())
        }
    }
}

async fn run(ledger: Arc<dyn LedgerClient>, config: &Config) -> Result<()> {
    print_banner(config);

    let memory = build_memory(config.seed_entities)?;
    let mut processor = BatchProcessor::new(build_classifier(config)?, memory.clone());
    if let Some(agent) = build_agent(config, memory)? {
        processor = processor.with_research(agent);
    }
    if config.audit.enabled {
        processor = processor.with_audit(Arc::new(AuditLogger::new(&config.audit.path)?));
    }

    let mut orchestrator = Orchestrator::new(ledger, config.app.stream.pipeline_config(), processor);
    orchestrator.start().await?;
    info!("Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;
    info!("🛑 Shutting down...");
    orchestrator.stop().await?;
    info!("📡 Stream stats: {:?}", orchestrator.pipeline_stats());
    Ok(())
}

fn build_memory(seed: bool) -> Result<EntityMemory> {
    let memory = if seed { EntityMemory::with_seeds()? } else { EntityMemory::new() };
    Ok(memory)
}

fn build_llm(config: &Config, model: &str) -> Result<Arc<dyn LlmClient>> {
    let client = AnthropicClient::new(
        config.llm.api_key.clone(),
        model.to_string(),
        config.llm.base_url.clone(),
        config.llm.timeout(),
    )?;
    Ok(Arc::new(client))
}

fn build_classifier(config: &Config) -> Result<ClassifierBrain> {
    let llm = build_llm(config, &config.llm.classifier_model)?;
    Ok(ClassifierBrain::new(llm).with_temperature(config.llm.classifier_temperature))
}

fn build_agent(config: &Config, memory: EntityMemory) -> Result<Option<ResearchAgent>> {
    if !config.research.enabled {
        info!("🔬 Research: disabled");
        return Ok(None);
    }

    let llm = build_llm(config, &config.llm.researcher_model)?;
    let metadata = JupiterTokensClient::new(config.research.jupiter_api_key.clone(), config.llm.timeout())?;
    Ok(Some(ResearchAgent::new(
        llm,
        memory,
        Arc::new(metadata),
        config.research.agent_config(),
    )))
}

fn print_banner(config: &Config) {
    println!("\n======================================================================");
    println!("🧠 BRAIN SERVICE - WALLET ACTIVITY TRIAGE");
    println!("======================================================================");
    println!("⏰ {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("👛 Watched wallets: {}", config.app.stream.wallets.len());
    println!("🤖 Classifier: {}", config.llm.classifier_model);
    if config.research.enabled {
        println!(
            "🔬 Research: {} (concurrency {})",
            config.llm.researcher_model, config.research.concurrency
        );
    }
    if config.audit.enabled {
        println!("💾 Audit: {}", config.audit.path.display());
    }
    println!("======================================================================\n");
}
