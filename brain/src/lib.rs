//! Brain: triage of wallet activity summaries, tool-driven research and the
//! orchestration that ties them to the ingestion stream.

pub mod audit;
pub mod classifier;
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod outcome;
pub mod prompts;
pub mod replay;
pub mod research;

pub use audit::{AuditKind, AuditLogger};
pub use classifier::{Classification, ClassifierBrain};
pub use config::Config;
pub use error::{LlmError, MetadataError, ToolError};
pub use llm::{AnthropicClient, LlmClient, ScriptedLlm};
pub use orchestrator::{BatchProcessor, BatchReport, Orchestrator, OrchestratorHooks};
pub use outcome::Outcome;
pub use research::{ResearchAgent, ResearchAgentConfig, ResearchRunResult};
