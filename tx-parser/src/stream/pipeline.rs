//! Streaming ingestion: log subscription → dedup → fetch → classify → filter
//! → format → batch.
//!
//! Each watched wallet gets one log subscription. Notifications fan into a
//! single intake task, which spawns one job per new signature. A job that
//! fails is logged and skipped without touching its siblings.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::batcher::{spawn_batcher, Batch, BatcherConfig, BatcherHandle};
use super::dedup::SignatureDeduplicator;
use super::filter::is_relevant_transaction;
use super::formatter::format_transaction_for_llm;
use crate::error::{LedgerError, ParserError};
use crate::parser::parse_transaction;
use crate::rpc::{LedgerClient, LogNotification, SubscriptionId};

pub const DEFAULT_MAX_TRACKED_SIGNATURES: usize = 1000;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub wallets: Vec<String>,
    pub batcher: BatcherConfig,
    pub max_tracked_signatures: usize,
}

impl PipelineConfig {
    pub fn new(wallets: Vec<String>) -> Self {
        Self {
            wallets,
            batcher: BatcherConfig::default(),
            max_tracked_signatures: DEFAULT_MAX_TRACKED_SIGNATURES,
        }
    }
}

#[derive(Debug, Default)]
struct PipelineCounters {
    notifications: AtomicU64,
    failed_on_chain: AtomicU64,
    duplicates: AtomicU64,
    missing: AtomicU64,
    irrelevant: AtomicU64,
    summarized: AtomicU64,
    errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub notifications: u64,
    pub failed_on_chain: u64,
    pub duplicates: u64,
    pub missing: u64,
    pub irrelevant: u64,
    pub summarized: u64,
    pub errors: u64,
}

impl PipelineCounters {
    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            notifications: self.notifications.load(Ordering::Relaxed),
            failed_on_chain: self.failed_on_chain.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            missing: self.missing.load(Ordering::Relaxed),
            irrelevant: self.irrelevant.load(Ordering::Relaxed),
            summarized: self.summarized.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

struct Running {
    subscriptions: Vec<SubscriptionId>,
    shutdown: oneshot::Sender<()>,
    intake: JoinHandle<()>,
}

pub struct StreamPipeline {
    ledger: Arc<dyn LedgerClient>,
    config: PipelineConfig,
    output: mpsc::UnboundedSender<Batch>,
    dedup: Arc<SignatureDeduplicator>,
    counters: Arc<PipelineCounters>,
    running: Option<Running>,
}

impl StreamPipeline {
    /// Batches are delivered on `output`.
    pub fn new(ledger: Arc<dyn LedgerClient>, config: PipelineConfig, output: mpsc::UnboundedSender<Batch>) -> Self {
        let dedup = Arc::new(SignatureDeduplicator::new(config.max_tracked_signatures));
        Self {
            ledger,
            config,
            output,
            dedup,
            counters: Arc::new(PipelineCounters::default()),
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot()
    }

    pub fn tracked_signatures(&self) -> usize {
        self.dedup.len()
    }

    /// Subscribes every wallet or none: on any failure the partial
    /// subscriptions are removed and the error is returned.
    pub async fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            warn!("⚠️ StreamPipeline already running");
            return Ok(());
        }

        for wallet in &self.config.wallets {
            Pubkey::from_str(wallet).map_err(|_| ParserError::InvalidAddress(wallet.clone()))?;
        }

        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let mut subscriptions = Vec::with_capacity(self.config.wallets.len());

        for wallet in &self.config.wallets {
            match self.ledger.on_logs(wallet, notify_tx.clone()).await {
                Ok(id) => subscriptions.push(id),
                Err(e) => {
                    unsubscribe_all(self.ledger.as_ref(), subscriptions).await;
                    return Err(e).with_context(|| format!("Failed to start stream for wallet {}", wallet));
                }
            }
        }
        // Only subscriptions keep the channel open from here on.
        drop(notify_tx);

        let batcher = spawn_batcher(self.config.batcher, self.output.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let intake = Intake {
            ledger: self.ledger.clone(),
            dedup: self.dedup.clone(),
            counters: self.counters.clone(),
        };
        let intake = tokio::spawn(intake.run(notify_rx, shutdown_rx, batcher));

        info!(
            "📡 Stream running for {} wallets (batch_size={}, flush_interval={}ms)",
            self.config.wallets.len(),
            self.config.batcher.batch_size,
            self.config.batcher.flush_interval.as_millis()
        );

        self.running = Some(Running {
            subscriptions,
            shutdown: shutdown_tx,
            intake,
        });
        Ok(())
    }

    /// Idempotent. Unsubscribes, finishes in-flight signatures, flushes the
    /// batcher and clears the dedup window before returning.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        unsubscribe_all(self.ledger.as_ref(), running.subscriptions).await;
        let _ = running.shutdown.send(());
        running.intake.await.context("stream intake task panicked")?;
        self.dedup.clear();

        info!("📡 Stream stopped ({:?})", self.counters.snapshot());
        Ok(())
    }
}

async fn unsubscribe_all(ledger: &dyn LedgerClient, subscriptions: Vec<SubscriptionId>) {
    let removals = subscriptions.into_iter().map(|id| async move {
        if let Err(e) = ledger.remove_on_logs_listener(id).await {
            warn!("⚠️ Failed to remove log listener {}: {}", id, e);
        }
    });
    futures::future::join_all(removals).await;
}

struct Intake {
    ledger: Arc<dyn LedgerClient>,
    dedup: Arc<SignatureDeduplicator>,
    counters: Arc<PipelineCounters>,
}

enum SignatureOutcome {
    Missing,
    Irrelevant,
    Summary(String),
}

type JobResult = (LogNotification, Result<SignatureOutcome, LedgerError>);

impl Intake {
    async fn run(
        self,
        mut notifications: mpsc::UnboundedReceiver<LogNotification>,
        mut shutdown: oneshot::Receiver<()>,
        batcher: BatcherHandle,
    ) {
        let mut jobs: JoinSet<JobResult> = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                notification = notifications.recv() => match notification {
                    Some(notification) => self.dispatch(notification, &mut jobs),
                    None => break,
                },
                Some(done) = jobs.join_next(), if !jobs.is_empty() => self.complete(done, &batcher),
            }
        }

        // Anything queued before the subscriptions were removed is still processed.
        while let Ok(notification) = notifications.try_recv() {
            self.dispatch(notification, &mut jobs);
        }
        while let Some(done) = jobs.join_next().await {
            self.complete(done, &batcher);
        }

        if let Err(e) = batcher.stop().await {
            warn!("⚠️ Batcher did not stop cleanly: {}", e);
        }
    }

    fn dispatch(&self, notification: LogNotification, jobs: &mut JoinSet<JobResult>) {
        self.counters.notifications.fetch_add(1, Ordering::Relaxed);

        if notification.failed() {
            self.counters.failed_on_chain.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if !self.dedup.remember(&notification.signature) {
            self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let ledger = self.ledger.clone();
        jobs.spawn(async move {
            let result = summarize_signature(ledger.as_ref(), &notification).await;
            (notification, result)
        });
    }

    fn complete(&self, done: Result<JobResult, JoinError>, batcher: &BatcherHandle) {
        let (notification, result) = match done {
            Ok(done) => done,
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                warn!("⚠️ Signature job aborted: {}", e);
                return;
            }
        };

        match result {
            Ok(SignatureOutcome::Summary(summary)) => {
                self.counters.summarized.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = batcher.add(summary) {
                    warn!("⚠️ Dropping summary for {}: {}", notification.signature, e);
                }
            }
            Ok(SignatureOutcome::Missing) => {
                self.counters.missing.fetch_add(1, Ordering::Relaxed);
            }
            Ok(SignatureOutcome::Irrelevant) => {
                self.counters.irrelevant.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "⚠️ Failed processing signature {} for wallet {}: {}",
                    notification.signature, notification.address, e
                );
            }
        }
    }
}

async fn summarize_signature(
    ledger: &dyn LedgerClient,
    notification: &LogNotification,
) -> Result<SignatureOutcome, LedgerError> {
    let Some(raw) = ledger.get_parsed_transaction(&notification.signature).await? else {
        debug!("Transaction {} not available yet", notification.signature);
        return Ok(SignatureOutcome::Missing);
    };

    let parsed = parse_transaction(&raw, Some(&notification.signature));
    if !is_relevant_transaction(&parsed) {
        debug!(
            "Dropping {} ({}:{})",
            notification.signature,
            parsed.tx_type.as_str(),
            parsed.protocol.as_str()
        );
        return Ok(SignatureOutcome::Irrelevant);
    }

    Ok(SignatureOutcome::Summary(format_transaction_for_llm(
        &parsed,
        &notification.address,
    )))
}
