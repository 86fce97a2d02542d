//! 📦 Summary batcher: size- or time-triggered flushing
//!
//! A batch fires when `batch_size` summaries have accumulated or when the
//! flush interval elapses after the first unflushed summary, whichever comes
//! first. At most one deadline is armed at a time, and stop flushes the
//! remainder exactly once.

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info};

pub type Batch = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatcherConfig {
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            flush_interval: Duration::from_millis(60_000),
        }
    }
}

#[derive(Debug)]
pub enum BatcherCommand {
    Add(String),
    Flush,
    Stop(oneshot::Sender<()>),
}

pub struct TransactionBatcher {
    config: BatcherConfig,
    buffer: Vec<String>,
    deadline: Option<Instant>,
    output: mpsc::UnboundedSender<Batch>,
    batches_flushed: u64,
}

impl TransactionBatcher {
    pub fn new(config: BatcherConfig, output: mpsc::UnboundedSender<Batch>) -> Self {
        Self {
            config: BatcherConfig {
                batch_size: config.batch_size.max(1),
                ..config
            },
            buffer: Vec::with_capacity(config.batch_size.max(1)),
            deadline: None,
            output,
            batches_flushed: 0,
        }
    }

    pub fn add(&mut self, summary: String) {
        self.buffer.push(summary);

        if self.buffer.len() >= self.config.batch_size {
            self.flush();
            return;
        }

        if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.config.flush_interval);
        }
    }

    pub fn flush(&mut self) {
        self.deadline = None;
        if self.buffer.is_empty() {
            return;
        }

        let batch = std::mem::take(&mut self.buffer);
        let size = batch.len();
        self.batches_flushed += 1;

        if self.output.send(batch).is_err() {
            debug!("📦 Batch receiver dropped, discarding {} summaries", size);
            return;
        }
        debug!("📦 Flushed batch #{} ({} summaries)", self.batches_flushed, size);
    }

    pub fn stop(&mut self) {
        self.flush();
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Event loop: commands and the flush deadline, no polling.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<BatcherCommand>) {
        info!(
            "📦 Batcher started (batch_size={}, flush_interval={}ms)",
            self.config.batch_size,
            self.config.flush_interval.as_millis()
        );

        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(BatcherCommand::Add(summary)) => self.add(summary),
                    Some(BatcherCommand::Flush) => self.flush(),
                    Some(BatcherCommand::Stop(ack)) => {
                        self.stop();
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        self.stop();
                        break;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush();
                }
            }
        }

        debug!("📦 Batcher stopped after {} batches", self.batches_flushed);
    }
}

/// Handle to a batcher running on its own task.
pub struct BatcherHandle {
    commands: mpsc::UnboundedSender<BatcherCommand>,
    join: JoinHandle<()>,
}

pub fn spawn_batcher(config: BatcherConfig, output: mpsc::UnboundedSender<Batch>) -> BatcherHandle {
    let (commands, rx) = mpsc::unbounded_channel();
    let join = tokio::spawn(TransactionBatcher::new(config, output).run(rx));
    BatcherHandle { commands, join }
}

impl BatcherHandle {
    pub fn add(&self, summary: String) -> Result<()> {
        self.commands
            .send(BatcherCommand::Add(summary))
            .map_err(|_| anyhow::anyhow!("batcher task has stopped"))
    }

    pub fn flush(&self) -> Result<()> {
        self.commands
            .send(BatcherCommand::Flush)
            .map_err(|_| anyhow::anyhow!("batcher task has stopped"))
    }

    /// Flushes any remainder and waits for the task to exit.
    pub async fn stop(self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(BatcherCommand::Stop(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
        self.join.await.context("batcher task panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(batch_size: usize, flush_ms: u64) -> BatcherConfig {
        BatcherConfig {
            batch_size,
            flush_interval: Duration::from_millis(flush_ms),
        }
    }

    #[tokio::test]
    async fn test_size_trigger_flushes_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut batcher = TransactionBatcher::new(config(3, 60_000), tx);

        batcher.add("a".into());
        batcher.add("b".into());
        assert!(rx.try_recv().is_err());
        batcher.add("c".into());

        assert_eq!(rx.try_recv().unwrap(), vec!["a", "b", "c"]);
        assert!(rx.try_recv().is_err());
        assert_eq!(batcher.pending(), 0);
        assert!(batcher.deadline().is_none());
    }

    #[tokio::test]
    async fn test_stop_flushes_remainder_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut batcher = TransactionBatcher::new(config(10, 60_000), tx);

        batcher.add("a".into());
        batcher.stop();
        batcher.stop();

        assert_eq!(rx.try_recv().unwrap(), vec!["a"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_single_deadline_is_armed_by_first_item() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut batcher = TransactionBatcher::new(config(10, 1_000), tx);

        batcher.add("a".into());
        let first = batcher.deadline();
        batcher.add("b".into());

        assert!(first.is_some());
        assert_eq!(batcher.deadline(), first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lone_item_flushes_after_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_batcher(config(10, 60_000), tx);

        handle.add("lonely".into()).unwrap();
        tokio::time::sleep(Duration::from_millis(30_000)).await;
        handle.add("second".into()).unwrap();
        tokio::time::sleep(Duration::from_millis(29_000)).await;
        assert!(rx.try_recv().is_err());

        // The deadline was armed by the first item and is not pushed back.
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(rx.recv().await.unwrap(), vec!["lonely", "second"]);

        handle.stop().await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_stop_flushes_partial_batch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_batcher(config(5, 60_000), tx);

        handle.add("a".into()).unwrap();
        handle.add("b".into()).unwrap();
        handle.stop().await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), vec!["a", "b"]);
        assert!(rx.recv().await.is_none());
    }
}
