use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tx_parser::history::{analyze_wallet, parse_transaction_by_signature};
use tx_parser::{AppConfig, LedgerClient, SolanaLedgerClient, StreamPipeline};

#[derive(Parser, Debug)]
#[command(name = "tx-parser", about = "Classify and stream Solana wallet activity")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream watched wallets and print summary batches
    Stream,
    /// Fetch a wallet's recent history and report how much of it classifies
    Analyze {
        #[arg(long, env = "EXAMPLE_WALLET")]
        wallet: String,
        #[arg(long)]
        count: Option<i64>,
    },
    /// Parse a single transaction by signature
    Parse {
        #[arg(long)]
        signature: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let ledger = Arc::new(SolanaLedgerClient::new(
        &config.rpc.rpc_url,
        &config.rpc.ws_url,
        &config.rpc.commitment,
    ));

    match cli.command {
        Command::Stream => run_stream(ledger, &config).await,
        Command::Analyze { wallet, count } => {
            let count = count.or(Some(config.default_tx_count as i64));
            let analysis = analyze_wallet(ledger.as_ref(), &wallet, count).await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            Ok(())
        }
        Command::Parse { signature } => {
            match parse_transaction_by_signature(ledger.as_ref(), &signature).await? {
                Some(parsed) => println!("{}", serde_json::to_string_pretty(&parsed)?),
                None => println!("Transaction {} not found", signature.trim()),
            }
            Ok(())
        }
    }
}

async fn run_stream(ledger: Arc<dyn LedgerClient>, config: &AppConfig) -> Result<()> {
    let (batch_tx, mut batch_rx) = mpsc::unbounded_channel();
    let mut pipeline = StreamPipeline::new(ledger, config.stream.pipeline_config(), batch_tx);

    let printer = tokio::spawn(async move {
        while let Some(batch) = batch_rx.recv().await {
            println!("\n=== STREAM BATCH ({}) ===", batch.len());
            for summary in batch {
                println!("{}", summary);
            }
        }
    });

    pipeline.start().await?;
    info!("Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;
    info!("🛑 Shutting down stream...");
    pipeline.stop().await?;

    drop(pipeline);
    printer.await.context("batch printer panicked")?;
    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}
