//! 🎯 Orchestrator: stream batches → classifier → research → audit
//!
//! Batches from the ingestion pipeline land on a single queue that one
//! worker task drains in arrival order. Research inside a batch runs
//! concurrently through the agent; batches never overlap. A failing batch
//! is logged and the worker moves on to the next one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use entity_memory::ids::now_millis;
use entity_memory::EntityMemory;
use log::{debug, error, info, warn};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tx_parser::rpc::LedgerClient;
use tx_parser::stream::{Batch, PipelineConfig, PipelineStats, StreamPipeline};

use crate::audit::{AuditKind, AuditLogger};
use crate::classifier::{Classification, ClassifierBrain};
use crate::outcome::Outcome;
use crate::research::{ResearchAgent, ResearchRunResult};

/// Callbacks fired after each stage of a batch. An error counts as a batch
/// failure and is logged like any other.
#[async_trait]
pub trait OrchestratorHooks: Send + Sync {
    async fn on_classification(&self, _batch_id: i64, _classification: &Outcome<Classification>) -> Result<()> {
        Ok(())
    }

    async fn on_research(&self, _batch_id: i64, _research: &ResearchRunResult) -> Result<()> {
        Ok(())
    }
}

struct NoopHooks;

impl OrchestratorHooks for NoopHooks {}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub batch_id: i64,
    pub classification: Outcome<Classification>,
    /// Identifiers handed to the research agent after the freshness filter
    pub research_targets: Vec<String>,
    /// Identifiers skipped because their entity already has fresh research
    pub skipped_fresh: Vec<String>,
    pub research: Option<ResearchRunResult>,
}

/// Per-batch work, shared between the queue worker and direct callers.
pub struct BatchProcessor {
    classifier: ClassifierBrain,
    agent: Option<ResearchAgent>,
    memory: EntityMemory,
    audit: Option<Arc<AuditLogger>>,
    hooks: Arc<dyn OrchestratorHooks>,
    processed: AtomicU64,
    failed: AtomicU64,
}

impl BatchProcessor {
    pub fn new(classifier: ClassifierBrain, memory: EntityMemory) -> Self {
        Self {
            classifier,
            agent: None,
            memory,
            audit: None,
            hooks: Arc::new(NoopHooks),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn with_research(mut self, agent: ResearchAgent) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn OrchestratorHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn memory(&self) -> &EntityMemory {
        &self.memory
    }

    pub fn batches_processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn batches_failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Never fails: errors are logged and counted.
    pub async fn handle(&self, batch: Batch) {
        let size = batch.len();
        match self.process_batch(batch).await {
            Ok(report) => {
                self.processed.fetch_add(1, Ordering::Relaxed);
                debug!("✅ Batch {} done ({} summaries)", report.batch_id, size);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!("❌ Batch processing failed ({} summaries): {:#}", size, e);
            }
        }
    }

    pub async fn process_batch(&self, batch: Batch) -> Result<BatchReport> {
        let batch_id = now_millis();

        self.record(AuditKind::Batch, json!({ "batchId": batch_id, "summaries": &batch }))?;

        let classification = self.classifier.classify(&batch).await;
        let value = classification.value();
        info!(
            "📦 Batch {}: {} interesting, {} need research",
            batch_id,
            value.interesting.len(),
            value.needs_research.len()
        );

        let mut classification_record = json!({ "batchId": batch_id, "classification": value });
        if let Some(reason) = classification.reason() {
            classification_record["degraded"] = json!(reason);
        }
        self.record(AuditKind::Classification, classification_record)?;

        self.hooks
            .on_classification(batch_id, &classification)
            .await
            .context("classification hook failed")?;

        let Some(agent) = &self.agent else {
            return Ok(BatchReport {
                batch_id,
                classification,
                research_targets: Vec::new(),
                skipped_fresh: Vec::new(),
                research: None,
            });
        };

        let (targets, skipped_fresh) = self.research_targets(&value.needs_research, agent.config().freshness_window_ms);
        if !skipped_fresh.is_empty() {
            info!("💾 Batch {}: {} targets already fresh, skipped", batch_id, skipped_fresh.len());
        }
        if targets.is_empty() {
            return Ok(BatchReport {
                batch_id,
                classification,
                research_targets: targets,
                skipped_fresh,
                research: None,
            });
        }

        let research = agent.enrich(&targets).await;
        info!(
            "🔬 Batch {}: {} research results for {} targets",
            batch_id,
            research.results.len(),
            targets.len()
        );

        self.record(
            AuditKind::Research,
            json!({ "batchId": batch_id, "results": research.results, "audit": research.audit }),
        )?;

        self.hooks
            .on_research(batch_id, &research)
            .await
            .context("research hook failed")?;

        Ok(BatchReport {
            batch_id,
            classification,
            research_targets: targets,
            skipped_fresh,
            research: Some(research),
        })
    }

    /// Distinct non-empty targets split into (to research, already fresh).
    fn research_targets(&self, candidates: &[String], window_ms: i64) -> (Vec<String>, Vec<String>) {
        let mut targets: Vec<String> = Vec::new();
        let mut fresh: Vec<String> = Vec::new();

        for candidate in candidates.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
            if targets.iter().chain(fresh.iter()).any(|seen| seen == candidate) {
                continue;
            }
            let is_fresh = self
                .memory
                .entities
                .resolve_identifier(candidate)
                .entity()
                .is_some_and(|entity| self.memory.cache.is_fresh(&entity.id, window_ms));

            if is_fresh {
                fresh.push(candidate.to_string());
            } else {
                targets.push(candidate.to_string());
            }
        }

        (targets, fresh)
    }

    fn record(&self, kind: AuditKind, payload: serde_json::Value) -> Result<()> {
        match &self.audit {
            Some(audit) => audit
                .record(kind, &payload)
                .with_context(|| format!("Failed to write {} audit record", kind.as_str())),
            None => Ok(()),
        }
    }
}

struct Worker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<mpsc::UnboundedReceiver<Batch>>,
}

pub struct Orchestrator {
    pipeline: StreamPipeline,
    processor: Arc<BatchProcessor>,
    queue: Option<mpsc::UnboundedReceiver<Batch>>,
    worker: Option<Worker>,
}

impl Orchestrator {
    pub fn new(ledger: Arc<dyn LedgerClient>, config: PipelineConfig, processor: BatchProcessor) -> Self {
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        Self {
            pipeline: StreamPipeline::new(ledger, config, batch_tx),
            processor: Arc::new(processor),
            queue: Some(batch_rx),
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn pipeline_stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    pub fn processor(&self) -> &BatchProcessor {
        &self.processor
    }

    /// Runs one batch outside the queue (replay, tests).
    pub async fn process_batch(&self, batch: Batch) -> Result<BatchReport> {
        self.processor.process_batch(batch).await
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            warn!("⚠️ Orchestrator already running");
            return Ok(());
        }
        let Some(queue) = self.queue.take() else {
            bail!("batch queue is unavailable, orchestrator cannot start");
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_worker(self.processor.clone(), queue, shutdown_rx));
        self.worker = Some(Worker {
            shutdown: shutdown_tx,
            handle,
        });

        if let Err(e) = self.pipeline.start().await {
            self.stop_worker().await?;
            return Err(e).context("Failed to start ingestion pipeline");
        }

        info!("🎯 Orchestrator running");
        Ok(())
    }

    /// Idempotent. Batches flushed by the pipeline on stop are processed
    /// before this returns.
    pub async fn stop(&mut self) -> Result<()> {
        if self.worker.is_none() {
            return Ok(());
        }

        let pipeline_result = self.pipeline.stop().await;
        self.stop_worker().await?;
        pipeline_result?;

        info!(
            "🎯 Orchestrator stopped ({} batches processed, {} failed)",
            self.processor.batches_processed(),
            self.processor.batches_failed()
        );
        Ok(())
    }

    async fn stop_worker(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let _ = worker.shutdown.send(());
        let queue = worker.handle.await.context("orchestrator worker panicked")?;
        self.queue = Some(queue);
        Ok(())
    }
}

async fn run_worker(
    processor: Arc<BatchProcessor>,
    mut batches: mpsc::UnboundedReceiver<Batch>,
    mut shutdown: oneshot::Receiver<()>,
) -> mpsc::UnboundedReceiver<Batch> {
    loop {
        tokio::select! {
            biased;
            batch = batches.recv() => match batch {
                Some(batch) => processor.handle(batch).await,
                None => break,
            },
            _ = &mut shutdown => break,
        }
    }

    while let Ok(batch) = batches.try_recv() {
        processor.handle(batch).await;
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;
    use crate::research::{ResearchAgentConfig, StaticTokenMetadata};
    use entity_memory::{ResearchFindings, ResearchSource};
    use parking_lot::Mutex;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn trade_summary(mint: &str) -> String {
        format!(
            "[unknown-time] Wallet:🎤 Ansem bought 1000 {}(needsResearch) (mint:{}) for 1 SOL via Jupiter | sig:aaaaaaaa",
            &mint[..8],
            mint
        )
    }

    fn processor(llm: Arc<ScriptedLlm>, memory: EntityMemory) -> BatchProcessor {
        let agent = ResearchAgent::new(
            llm.clone(),
            memory.clone(),
            Arc::new(StaticTokenMetadata::new()),
            ResearchAgentConfig::default(),
        );
        BatchProcessor::new(ClassifierBrain::new(llm), memory).with_research(agent)
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OrchestratorHooks for Recorder {
        async fn on_classification(&self, _batch_id: i64, classification: &Outcome<Classification>) -> Result<()> {
            self.events
                .lock()
                .push(format!("classification:{}", classification.value().interesting.len()));
            Ok(())
        }

        async fn on_research(&self, _batch_id: i64, research: &ResearchRunResult) -> Result<()> {
            self.events.lock().push(format!("research:{}", research.audit.len()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fresh_targets_are_skipped() {
        let memory = EntityMemory::new();
        let llm = Arc::new(ScriptedLlm::new());
        let processor = processor(llm.clone(), memory.clone());

        // Research an entity first so the cache is warm.
        let entity = memory
            .entities
            .create_entity(entity_memory::CreateEntityInput::new("Bonk", entity_memory::EntityType::CryptoToken))
            .unwrap();
        memory
            .entities
            .add_representation(
                serde_json::from_value(json!({
                    "entityId": entity.id,
                    "type": "spot-token",
                    "protocol": "unknown",
                    "chain": "solana",
                    "context": { "mint": BONK }
                }))
                .unwrap(),
            )
            .unwrap();
        memory
            .research
            .complete_research(
                &entity.id,
                ResearchFindings {
                    summary: "cached".to_string(),
                    sentiment: None,
                    confidence: 80,
                    risks: Vec::new(),
                    opportunities: Vec::new(),
                    metadata: serde_json::Map::new(),
                },
                vec![ResearchSource::succeeded("get_token_metadata", now_millis())],
                None,
            )
            .unwrap();

        llm.push_text(json!({ "interesting": [trade_summary(BONK)], "needsResearch": [BONK] }).to_string());

        let report = processor.process_batch(vec![trade_summary(BONK)]).await.unwrap();
        assert_eq!(report.skipped_fresh, vec![BONK.to_string()]);
        assert!(report.research_targets.is_empty());
        assert!(report.research.is_none());
        assert_eq!(llm.request_count(), 1);
    }

    #[tokio::test]
    async fn test_hooks_fire_in_order() {
        let memory = EntityMemory::new();
        let llm = Arc::new(ScriptedLlm::new());
        let recorder = Arc::new(Recorder::default());
        let processor = processor(llm.clone(), memory).with_hooks(recorder.clone());

        llm.push_text(json!({ "interesting": [], "needsResearch": [] }).to_string());
        llm.push_text("not json");

        let summary = trade_summary(BONK);
        // Marked summaries are researched even when the model names none.
        processor.handle(vec![summary.clone()]).await;

        let events = recorder.events.lock().clone();
        assert_eq!(events, vec!["classification:0".to_string(), "research:1".to_string()]);
        assert_eq!(processor.batches_processed(), 1);
        assert_eq!(processor.batches_failed(), 0);
    }

    #[tokio::test]
    async fn test_without_research_agent() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_error(crate::error::LlmError::Unavailable("down".to_string()));
        let processor = BatchProcessor::new(ClassifierBrain::new(llm), EntityMemory::new());

        let report = processor.process_batch(vec!["a".to_string(), "b".to_string()]).await.unwrap();
        assert!(report.classification.is_degraded());
        assert_eq!(report.classification.value().interesting.len(), 2);
        assert!(report.research.is_none());
    }
}
