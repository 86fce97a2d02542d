use thiserror::Error;

/// Failures talking to the LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM API {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode LLM response: {0}")]
    Decode(String),

    #[error("Empty response from LLM")]
    EmptyResponse,

    #[error("LLM unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LlmError::Decode(e.to_string())
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Invalid mint address: {0}")]
    InvalidMint(String),

    #[error("Token metadata request failed: {0}")]
    Request(String),

    #[error("Jupiter Tokens API {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        MetadataError::Request(e.to_string())
    }
}

/// Failures of a single research tool call. These are reported back to the
/// model as `is_error` tool results and never abort the research loop.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid input for {tool}: {reason}")]
    InvalidInput { tool: &'static str, reason: String },

    #[error(transparent)]
    Memory(#[from] entity_memory::MemoryError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}
