pub mod batcher;
pub mod dedup;
pub mod filter;
pub mod formatter;
pub mod pipeline;

pub use batcher::{spawn_batcher, Batch, BatcherConfig, BatcherHandle, TransactionBatcher};
pub use dedup::{DeduplicationStats, SignatureDeduplicator};
pub use filter::{is_relevant_transaction, RELEVANT_TYPES};
pub use formatter::{format_transaction_for_llm, NEEDS_RESEARCH_MARKER};
pub use pipeline::{PipelineConfig, PipelineStats, StreamPipeline};
