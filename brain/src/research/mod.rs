pub mod agent;
pub mod token_metadata;
pub mod tools;

pub use agent::{ResearchAgent, ResearchAgentConfig, ResearchAudit, ResearchRunResult, ResearchStep, StepObserver};
pub use token_metadata::{JupiterTokensClient, StaticTokenMetadata, TokenMetadata, TokenMetadataSource};
pub use tools::{ResearchTool, ToolRegistry};
