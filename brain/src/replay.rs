//! Offline replay of a wallet's recent history through the brain.
//!
//! History is fetched once, filtered to relevant activity, formatted into
//! the same summary lines the live stream produces and fed to the batch
//! processor in fixed-size chunks.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use log::info;
use serde::Serialize;
use tx_parser::history::fetch_wallet_transactions;
use tx_parser::parse_transactions;
use tx_parser::rpc::LedgerClient;
use tx_parser::stream::{format_transaction_for_llm, is_relevant_transaction};

use crate::classifier::Classification;
use crate::orchestrator::{BatchProcessor, OrchestratorHooks};
use crate::outcome::Outcome;
use crate::research::{ResearchRunResult, ResearchStep};

/// Signatures fetched per wanted summary; most history is transfers and swaps.
const HISTORY_OVERFETCH: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOptions {
    pub wallet: String,
    pub count: usize,
    pub batch_size: usize,
    pub delay: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayTotals {
    pub batches: usize,
    pub failed_batches: usize,
    pub summaries: usize,
    pub interesting: usize,
    pub needs_research: usize,
    pub skipped_fresh: usize,
    pub research_results: usize,
}

/// Up to `count` relevant summaries, oldest first.
pub async fn load_summaries(ledger: &dyn LedgerClient, wallet: &str, count: usize) -> Result<Vec<String>> {
    if count == 0 {
        bail!("replay count must be > 0");
    }

    let fetch = (count * HISTORY_OVERFETCH) as i64;
    let transactions = fetch_wallet_transactions(ledger, wallet, Some(fetch)).await?;
    let parsed = parse_transactions(transactions.iter().map(Some));

    let mut relevant: Vec<_> = parsed
        .into_iter()
        .filter(|transaction| is_relevant_transaction(transaction))
        .take(count)
        .collect();
    relevant.reverse();

    info!(
        "📼 {} relevant of {} fetched transactions for {}",
        relevant.len(),
        transactions.len(),
        wallet
    );
    Ok(relevant
        .iter()
        .map(|transaction| format_transaction_for_llm(transaction, wallet))
        .collect())
}

pub async fn replay(ledger: &dyn LedgerClient, processor: &BatchProcessor, options: &ReplayOptions) -> Result<ReplayTotals> {
    if options.batch_size == 0 {
        bail!("replay batch size must be > 0");
    }

    let summaries = load_summaries(ledger, &options.wallet, options.count).await?;
    let mut totals = ReplayTotals {
        summaries: summaries.len(),
        ..ReplayTotals::default()
    };

    let chunks: Vec<&[String]> = summaries.chunks(options.batch_size).collect();
    for (index, chunk) in chunks.iter().enumerate() {
        println!("\n=== REPLAY BATCH {}/{} ({}) ===", index + 1, chunks.len(), chunk.len());
        for summary in chunk.iter() {
            println!("{}", summary);
        }

        totals.batches += 1;
        match processor.process_batch(chunk.to_vec()).await {
            Ok(report) => {
                let classification = report.classification.value();
                totals.interesting += classification.interesting.len();
                totals.needs_research += classification.needs_research.len();
                totals.skipped_fresh += report.skipped_fresh.len();
                totals.research_results += report.research.as_ref().map_or(0, |run| run.results.len());
            }
            Err(e) => {
                totals.failed_batches += 1;
                println!("❌ Batch failed: {:#}", e);
            }
        }

        if index + 1 < chunks.len() && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    println!("\n=== REPLAY TOTALS ===");
    println!("{}", serde_json::to_string_pretty(&totals)?);
    Ok(totals)
}

/// Prints each stage of a replayed batch.
pub struct ReplayPrinter;

#[async_trait]
impl OrchestratorHooks for ReplayPrinter {
    async fn on_classification(&self, _batch_id: i64, classification: &Outcome<Classification>) -> Result<()> {
        if let Some(reason) = classification.reason() {
            println!("⚠️ Classification degraded: {}", reason);
        }
        println!("🧠 Classification:\n{}", serde_json::to_string_pretty(classification.value())?);
        Ok(())
    }

    async fn on_research(&self, _batch_id: i64, research: &ResearchRunResult) -> Result<()> {
        println!("🔬 Research:\n{}", serde_json::to_string_pretty(research)?);
        Ok(())
    }
}

pub fn print_step(step: &ResearchStep) {
    let tools = if step.tool_calls.is_empty() {
        "none".to_string()
    } else {
        step.tool_calls.join(", ")
    };
    println!("🔎 [{}] step {} tools: {}", step.identifier, step.iteration, tools);
    if !step.assistant_text.is_empty() {
        println!("   {}", step.assistant_text);
    }
}
