//! Per-identifier research runs.
//!
//! Each identifier goes resolve → (create if missing) → freshness check →
//! cached result, or a bounded tool-calling loop followed by a store. Runs
//! for distinct identifiers overlap up to `concurrency`; the loop for one
//! identifier is strictly sequential.

use std::sync::Arc;

use anyhow::{Context, Result};
use entity_memory::ids::{is_mint_shaped, now_millis};
use entity_memory::{EntityMemory, ResearchFindings, ResearchResult, Sentiment};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::token_metadata::{TokenMetadata, TokenMetadataSource};
use super::tools::{clamp_confidence, ResearchTool, ToolRegistry};
use crate::llm::{strip_code_fence, tool_result_message, LlmClient, Message, MessageRequest};
use crate::outcome::Outcome;
use crate::prompts::{research_user_prompt, RESEARCH_SYSTEM_PROMPT};

const LLM_TOOL: &str = "research_llm";
const AGENT_TOOL: &str = "research_agent";
const DEFAULT_CONFIDENCE: f64 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchAgentConfig {
    pub max_iterations: usize,
    pub concurrency: usize,
    pub freshness_window_ms: i64,
    pub temperature: f32,
}

impl Default for ResearchAgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            concurrency: 3,
            freshness_window_ms: 10 * 60 * 1000,
            temperature: 0.2,
        }
    }
}

/// One LLM round-trip, reported to the step observer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchStep {
    pub identifier: String,
    /// 1-based.
    pub iteration: usize,
    pub assistant_text: String,
    pub tool_calls: Vec<String>,
}

pub type StepObserver = Arc<dyn Fn(&ResearchStep) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchAudit {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub tools_used: Vec<String>,
    pub tools_succeeded: Vec<String>,
    pub tools_failed: Vec<String>,
    pub confidence: u8,
    pub sentiment: Sentiment,
    pub data_completeness: u8,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResearchRunResult {
    pub results: Vec<ResearchResult>,
    pub audit: Vec<ResearchAudit>,
}

#[derive(Debug, Clone, PartialEq)]
struct SourceStatus {
    tool: String,
    success: bool,
    error: Option<String>,
}

/// Tool bookkeeping for one identifier. `sources` keeps first-seen order
/// with the latest status per tool.
#[derive(Debug, Default)]
struct ToolTracking {
    used: Vec<String>,
    succeeded: Vec<String>,
    failed: Vec<String>,
    sources: Vec<SourceStatus>,
}

impl ToolTracking {
    fn record(&mut self, tool: &str, error: Option<String>) {
        if error.is_none() {
            self.succeeded.push(tool.to_string());
        } else {
            self.failed.push(tool.to_string());
        }

        let status = SourceStatus {
            tool: tool.to_string(),
            success: error.is_none(),
            error,
        };
        match self.sources.iter_mut().find(|source| source.tool == tool) {
            Some(existing) => *existing = status,
            None => self.sources.push(status),
        }
    }

    fn source_list(&self) -> Vec<Value> {
        let now = now_millis();
        self.sources
            .iter()
            .map(|source| {
                let mut entry = json!({
                    "tool": source.tool,
                    "success": source.success,
                    "timestamp": now,
                });
                if let Some(error) = &source.error {
                    entry["error"] = json!(error);
                }
                entry
            })
            .collect()
    }

    fn audit(&self, identifier: &str, entity_id: Option<&str>, result: Option<&ResearchResult>) -> ResearchAudit {
        ResearchAudit {
            identifier: identifier.to_string(),
            entity_id: entity_id.map(String::from),
            tools_used: self.used.clone(),
            tools_succeeded: self.succeeded.clone(),
            tools_failed: self.failed.clone(),
            confidence: result.map_or(0, |r| r.confidence),
            sentiment: result.map_or(Sentiment::Unknown, |r| r.sentiment),
            data_completeness: result.map_or(0, |r| r.data_completeness),
            timestamp: now_millis(),
        }
    }
}

struct ToolOutput {
    content: Value,
    is_error: bool,
}

struct LoopOutput {
    store_called: bool,
    findings: Outcome<ResearchFindings>,
}

pub struct ResearchAgent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    memory: EntityMemory,
    config: ResearchAgentConfig,
    observer: Option<StepObserver>,
}

impl ResearchAgent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        memory: EntityMemory,
        metadata: Arc<dyn TokenMetadataSource>,
        config: ResearchAgentConfig,
    ) -> Self {
        Self {
            llm,
            tools: ToolRegistry::new(memory.clone(), metadata),
            memory,
            config,
            observer: None,
        }
    }

    pub fn with_step_observer(mut self, observer: StepObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &ResearchAgentConfig {
        &self.config
    }

    /// Researches every distinct identifier. Results and audit entries come
    /// back in input order; identifiers without a result still get an audit
    /// entry.
    pub async fn enrich(&self, identifiers: &[String]) -> ResearchRunResult {
        let mut unique: Vec<&str> = Vec::new();
        for identifier in identifiers.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
            if !unique.contains(&identifier) {
                unique.push(identifier);
            }
        }
        if unique.is_empty() {
            return ResearchRunResult::default();
        }

        info!("🔬 Researching {} identifiers", unique.len());
        // Boxed as `dyn Future + Send` to work around rustc's higher-ranked
        // `Send` inference bug with `stream::map(closure).buffered(..)`.
        let runs_fut: std::pin::Pin<
            Box<dyn std::future::Future<Output = Vec<(Option<ResearchResult>, ResearchAudit)>> + Send + '_>,
        > = Box::pin(
            stream::iter(unique)
                .map(|identifier| self.research_identifier(identifier))
                .buffered(self.config.concurrency.max(1))
                .collect(),
        );
        let runs: Vec<(Option<ResearchResult>, ResearchAudit)> = runs_fut.await;

        let mut run = ResearchRunResult::default();
        for (result, audit) in runs {
            run.results.extend(result);
            run.audit.push(audit);
        }
        run
    }

    async fn research_identifier(&self, identifier: &str) -> (Option<ResearchResult>, ResearchAudit) {
        let mut tracking = ToolTracking::default();
        match self.run_identifier(identifier, &mut tracking).await {
            Ok((entity_id, result)) => {
                let audit = tracking.audit(identifier, entity_id.as_deref(), result.as_ref());
                (result, audit)
            }
            Err(e) => {
                warn!("❌ Research for {} failed: {:#}", identifier, e);
                tracking.used.push(AGENT_TOOL.to_string());
                tracking.record(AGENT_TOOL, Some(format!("{:#}", e)));
                (None, tracking.audit(identifier, None, None))
            }
        }
    }

    async fn run_identifier(
        &self,
        identifier: &str,
        tracking: &mut ToolTracking,
    ) -> Result<(Option<String>, Option<ResearchResult>)> {
        let resolved = self
            .execute_tool(ResearchTool::ResolveEntity.name(), &object(json!({ "identifier": identifier })), tracking)
            .await;

        let mut token_metadata = None;
        let mut prefetched = false;
        let entity_id = match entity_id_of(&resolved) {
            Some(id) => id,
            None => {
                token_metadata = self.prefetch_token_metadata(identifier, tracking).await;
                prefetched = true;
                match self.create_missing_entity(identifier, token_metadata.as_ref(), tracking).await? {
                    Some(id) => id,
                    None => return Ok((None, None)),
                }
            }
        };

        let freshness = self
            .execute_tool(
                ResearchTool::CheckResearchFreshness.name(),
                &object(json!({ "entityId": entity_id, "maxAgeMs": self.config.freshness_window_ms })),
                tracking,
            )
            .await;

        if !freshness.is_error && freshness.content["fresh"] == Value::Bool(true) {
            debug!("🔬 {} has fresh research, using cache", identifier);
            self.execute_tool(
                ResearchTool::GetCachedResearch.name(),
                &object(json!({ "entityId": entity_id })),
                tracking,
            )
            .await;
            let result = self.memory.research.to_research_result(&entity_id);
            return Ok((Some(entity_id), result));
        }

        if !prefetched {
            token_metadata = self.prefetch_token_metadata(identifier, tracking).await;
        }

        let output = self
            .run_research_loop(&entity_id, identifier, token_metadata.as_ref(), tracking)
            .await;
        if let Some(reason) = output.findings.reason() {
            warn!("⚠️ Research for {} fell back to default findings: {}", identifier, reason);
        }

        if !output.store_called {
            let sources = tracking.source_list();
            let mut findings = output.findings.into_value();
            if let Some(token) = &token_metadata {
                findings
                    .metadata
                    .insert("tokenMetadata".to_string(), serde_json::to_value(token)?);
            }
            let findings = serde_json::to_value(&findings).context("Failed to encode research findings")?;

            self.execute_tool(
                ResearchTool::StoreResearchResults.name(),
                &object(json!({ "entityId": entity_id, "findings": findings, "sources": sources })),
                tracking,
            )
            .await;
        }

        let result = self.memory.research.to_research_result(&entity_id);
        Ok((Some(entity_id), result))
    }

    async fn prefetch_token_metadata(&self, identifier: &str, tracking: &mut ToolTracking) -> Option<TokenMetadata> {
        if !is_mint_shaped(identifier) {
            return None;
        }
        let output = self
            .execute_tool(ResearchTool::GetTokenMetadata.name(), &object(json!({ "mint": identifier })), tracking)
            .await;
        if output.is_error || output.content["found"] != Value::Bool(true) {
            return None;
        }
        serde_json::from_value(output.content["token"].clone()).ok()
    }

    async fn create_missing_entity(
        &self,
        identifier: &str,
        token_metadata: Option<&TokenMetadata>,
        tracking: &mut ToolTracking,
    ) -> Result<Option<String>> {
        let is_mint = is_mint_shaped(identifier);
        let name = match token_metadata.and_then(|token| token.name.clone()) {
            Some(name) => name,
            None if is_mint => format!("Token {}", identifier.chars().take(6).collect::<String>()),
            None => identifier.to_string(),
        };

        let mut metadata = json!({
            "category": ["unverified"],
            "tags": ["pending-verification"],
        });
        if let Some(token) = token_metadata {
            metadata["tokenMetadata"] = serde_json::to_value(token).context("Failed to encode token metadata")?;
        }

        let mut args = object(json!({ "name": name, "type": "crypto-token", "metadata": metadata }));
        if let Some(symbol) = token_metadata.and_then(|token| token.symbol.clone()) {
            args.insert("symbol".to_string(), Value::String(symbol));
        }

        let created = self
            .execute_tool(ResearchTool::CreateEntity.name(), &args, tracking)
            .await;
        let Some(entity_id) = entity_id_of(&created) else {
            return Ok(None);
        };
        info!("🆕 Created unverified entity {} for {}", entity_id, identifier);

        if is_mint {
            self.execute_tool(
                ResearchTool::AddRepresentation.name(),
                &object(json!({
                    "entityId": entity_id,
                    "type": "spot-token",
                    "protocol": "unknown",
                    "chain": "solana",
                    "context": { "mint": identifier },
                })),
                tracking,
            )
            .await;
        }

        Ok(Some(entity_id))
    }

    async fn run_research_loop(
        &self,
        entity_id: &str,
        identifier: &str,
        token_metadata: Option<&TokenMetadata>,
        tracking: &mut ToolTracking,
    ) -> LoopOutput {
        let metadata_value = token_metadata.and_then(|token| serde_json::to_value(token).ok());
        let mut messages = vec![Message::user(research_user_prompt(
            identifier,
            entity_id,
            metadata_value.as_ref(),
        ))];
        let mut store_called = false;

        for iteration in 1..=self.config.max_iterations {
            tracking.used.push(LLM_TOOL.to_string());
            let request = MessageRequest::new(RESEARCH_SYSTEM_PROMPT, messages.clone())
                .with_tools(self.tools.definitions())
                .with_temperature(self.config.temperature);

            let response = match self.llm.create_message(request).await {
                Ok(response) => {
                    tracking.record(LLM_TOOL, None);
                    self.observe(ResearchStep {
                        identifier: identifier.to_string(),
                        iteration,
                        assistant_text: response.text.clone(),
                        tool_calls: response.tool_calls.iter().map(|call| call.name.clone()).collect(),
                    });
                    response
                }
                Err(e) => {
                    let message = e.to_string();
                    tracking.record(LLM_TOOL, Some(message.clone()));
                    self.observe(ResearchStep {
                        identifier: identifier.to_string(),
                        iteration,
                        assistant_text: format!("[error] {}", message),
                        tool_calls: Vec::new(),
                    });
                    return LoopOutput {
                        store_called,
                        findings: Outcome::degraded(
                            default_findings(identifier, token_metadata),
                            format!("LLM failure: {}", message),
                        ),
                    };
                }
            };

            if !response.assistant_content.is_empty() {
                messages.push(Message::assistant_blocks(response.assistant_content.clone()));
            }

            if response.tool_calls.is_empty() {
                return LoopOutput {
                    store_called,
                    findings: parse_findings(&response.text, identifier, token_metadata),
                };
            }

            for call in &response.tool_calls {
                let output = self.execute_tool(&call.name, &call.input, tracking).await;
                if call.name == ResearchTool::StoreResearchResults.name() && !output.is_error {
                    store_called = true;
                }
                messages.push(tool_result_message(&call.id, &output.content, output.is_error));
            }
        }

        LoopOutput {
            store_called,
            findings: Outcome::degraded(
                default_findings(identifier, token_metadata),
                format!("No final answer after {} iterations", self.config.max_iterations),
            ),
        }
    }

    /// Runs one tool and records it. Failures become `{error}` payloads.
    async fn execute_tool(&self, name: &str, input: &Map<String, Value>, tracking: &mut ToolTracking) -> ToolOutput {
        tracking.used.push(name.to_string());
        match self.tools.execute(name, input).await {
            Ok(content) => {
                tracking.record(name, None);
                ToolOutput {
                    content,
                    is_error: false,
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!("⚠️ Tool {} failed: {}", name, message);
                tracking.record(name, Some(message.clone()));
                ToolOutput {
                    content: json!({ "error": message }),
                    is_error: true,
                }
            }
        }
    }

    fn observe(&self, step: ResearchStep) {
        if let Some(observer) = &self.observer {
            observer(&step);
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn entity_id_of(output: &ToolOutput) -> Option<String> {
    if output.is_error {
        return None;
    }
    output.content["entity"]["id"].as_str().map(String::from)
}

fn token_metadata_map(token_metadata: Option<&TokenMetadata>) -> Map<String, Value> {
    let mut metadata = Map::new();
    if let Some(value) = token_metadata.and_then(|token| serde_json::to_value(token).ok()) {
        metadata.insert("tokenMetadata".to_string(), value);
    }
    metadata
}

pub fn default_findings(identifier: &str, token_metadata: Option<&TokenMetadata>) -> ResearchFindings {
    ResearchFindings {
        summary: format!(
            "Baseline research completed for {}. Metadata coverage is limited to Jupiter token data in current milestone.",
            identifier
        ),
        sentiment: Some(Sentiment::Unknown),
        confidence: DEFAULT_CONFIDENCE as u8,
        risks: vec!["Incomplete source coverage (market/news/sentiment tools deferred)".to_string()],
        opportunities: vec!["Entity captured for iterative enrichment".to_string()],
        metadata: token_metadata_map(token_metadata),
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default()
}

/// Final model text → findings. Anything that is not a JSON object falls
/// back to [`default_findings`].
pub fn parse_findings(
    text: &str,
    identifier: &str,
    token_metadata: Option<&TokenMetadata>,
) -> Outcome<ResearchFindings> {
    let parsed = match serde_json::from_str::<Value>(strip_code_fence(text)) {
        Ok(Value::Object(parsed)) => parsed,
        _ => {
            return Outcome::degraded(
                default_findings(identifier, token_metadata),
                "Final answer was not a JSON object",
            )
        }
    };

    let summary = parsed
        .get("summary")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| default_findings(identifier, token_metadata).summary);
    let sentiment = parsed
        .get("sentiment")
        .and_then(|value| serde_json::from_value::<Sentiment>(value.clone()).ok())
        .unwrap_or(Sentiment::Unknown);
    let confidence = parsed
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_CONFIDENCE);
    let metadata = match parsed.get("metadata") {
        Some(Value::Object(metadata)) => metadata.clone(),
        _ => token_metadata_map(token_metadata),
    };

    Outcome::Ok(ResearchFindings {
        summary,
        sentiment: Some(sentiment),
        confidence: clamp_confidence(confidence),
        risks: parsed.get("risks").map(string_list).unwrap_or_default(),
        opportunities: parsed.get("opportunities").map(string_list).unwrap_or_default(),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{MessageResponse, ScriptedLlm};
    use crate::research::token_metadata::StaticTokenMetadata;
    use entity_memory::Urgency;
    use parking_lot::Mutex;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const POPCAT: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";

    struct Harness {
        agent: ResearchAgent,
        llm: Arc<ScriptedLlm>,
        memory: EntityMemory,
        metadata: Arc<StaticTokenMetadata>,
    }

    fn harness(config: ResearchAgentConfig) -> Harness {
        let llm = Arc::new(ScriptedLlm::new());
        let memory = EntityMemory::with_seeds().unwrap();
        let metadata = Arc::new(StaticTokenMetadata::new());
        let agent = ResearchAgent::new(llm.clone(), memory.clone(), metadata.clone(), config);
        Harness {
            agent,
            llm,
            memory,
            metadata,
        }
    }

    fn bonk_metadata() -> TokenMetadata {
        let mut token = TokenMetadata::new(BONK);
        token.name = Some("Bonk".to_string());
        token.symbol = Some("Bonk".to_string());
        token
    }

    fn tool_call(id: &str, name: &str, input: Value) -> MessageResponse {
        MessageResponse::tool_calls(vec![(id.to_string(), name.to_string(), input)])
    }

    #[tokio::test]
    async fn test_unknown_mint_is_created_and_researched() {
        let h = harness(ResearchAgentConfig::default());
        h.metadata.insert(bonk_metadata());
        h.llm.push_text(
            json!({
                "summary": "Dog coin with deep liquidity",
                "sentiment": "bullish",
                "confidence": 82.4,
                "risks": ["memecoin volatility"],
                "opportunities": "not a list",
            })
            .to_string(),
        );

        let run = h.agent.enrich(&[format!(" {} ", BONK), BONK.to_string(), "  ".to_string()]).await;
        assert_eq!(run.results.len(), 1);
        assert_eq!(run.audit.len(), 1);

        let result = &run.results[0];
        assert_eq!(result.slug, "bonk");
        assert_eq!(result.symbol.as_deref(), Some("BONK"));
        assert_eq!(result.confidence, 82);
        assert_eq!(result.sentiment, Sentiment::Bullish);
        assert!(result.opportunities.is_empty());
        assert_eq!(result.representations.len(), 1);
        assert_eq!(result.representations[0].context.mint.as_deref(), Some(BONK));

        let audit = &run.audit[0];
        assert_eq!(audit.identifier, BONK);
        assert_eq!(audit.entity_id.as_deref(), Some(result.entity_id.as_str()));
        assert_eq!(
            audit.tools_used,
            vec![
                "resolve_entity",
                "get_token_metadata",
                "create_entity",
                "add_representation",
                "check_research_freshness",
                "research_llm",
                "store_research_results",
            ]
        );
        assert!(audit.tools_failed.is_empty());
        assert_eq!(audit.data_completeness, 100);

        let research = h.memory.research.get_cached_research(&result.entity_id).unwrap();
        assert_eq!(research.findings.metadata["tokenMetadata"]["symbol"], "Bonk");
        let tools: Vec<_> = research.sources.iter().map(|s| s.tool.as_str()).collect();
        assert_eq!(
            tools,
            vec![
                "resolve_entity",
                "get_token_metadata",
                "create_entity",
                "add_representation",
                "check_research_freshness",
                "research_llm",
            ]
        );

        let request = &h.llm.requests()[0];
        assert_eq!(request.tools.len(), 7);
        assert_eq!(request.temperature, 0.2);
        let Value::String(prompt) = &request.messages[0].content else {
            panic!("first message should be text");
        };
        assert!(prompt.contains("Prefetched token metadata:"));
    }

    #[tokio::test]
    async fn test_fresh_research_skips_llm() {
        let h = harness(ResearchAgentConfig::default());
        let sol = h.memory.entities.resolve_identifier("solana").into_entity().unwrap();
        h.memory
            .research
            .complete_research(
                &sol.id,
                ResearchFindings {
                    summary: "cached".to_string(),
                    sentiment: Some(Sentiment::Neutral),
                    confidence: 90,
                    risks: Vec::new(),
                    opportunities: Vec::new(),
                    metadata: Map::new(),
                },
                vec![
                    entity_memory::ResearchSource::succeeded("a", now_millis()),
                    entity_memory::ResearchSource::succeeded("b", now_millis()),
                ],
                None,
            )
            .unwrap();

        let run = h.agent.enrich(&["SOL".to_string()]).await;
        assert_eq!(h.llm.request_count(), 0);
        assert_eq!(run.results[0].summary, "cached");
        assert_eq!(run.results[0].urgency, Urgency::High);
        assert_eq!(
            run.audit[0].tools_used,
            vec!["resolve_entity", "check_research_freshness", "get_cached_research"]
        );
        assert_eq!(run.audit[0].confidence, 90);
    }

    #[tokio::test]
    async fn test_tool_loop_with_model_store_and_failures() {
        let steps = Arc::new(Mutex::new(Vec::new()));
        let recorded = steps.clone();
        let h = harness(ResearchAgentConfig::default());
        let agent = h.agent.with_step_observer(Arc::new(move |step: &ResearchStep| {
            recorded.lock().push(step.clone());
        }));
        let jup = h.memory.entities.resolve_identifier("jupiter").into_entity().unwrap();

        h.llm
            .push(tool_call("tu_1", "fetch_news", json!({ "q": "JUP" })))
            .push(tool_call(
                "tu_2",
                "store_research_results",
                json!({
                    "entityId": jup.id,
                    "findings": { "summary": "Top Solana aggregator", "sentiment": "bullish", "confidence": 75 },
                    "sources": [
                        { "tool": "resolve_entity", "success": true },
                        { "tool": "research_llm", "success": true },
                    ],
                }),
            ))
            .push_text("done");

        let run = agent.enrich(&["jupiter".to_string()]).await;
        let result = &run.results[0];
        assert_eq!(result.summary, "Top Solana aggregator");
        assert_eq!(h.memory.repositories.research.count(&jup.id), 1);

        let audit = &run.audit[0];
        assert_eq!(audit.tools_failed, vec!["fetch_news"]);
        assert!(!audit.tools_used.contains(&"get_token_metadata".to_string()));
        assert_eq!(audit.tools_used.iter().filter(|t| *t == "research_llm").count(), 3);

        let steps = steps.lock();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].iteration, 1);
        assert_eq!(steps[0].tool_calls, vec!["fetch_news"]);
        assert_eq!(steps[2].assistant_text, "done");

        // second request carries the assistant turn and the error tool result
        let second = &h.llm.requests()[1];
        assert_eq!(second.messages.len(), 3);
        assert_eq!(second.messages[2].content[0]["is_error"], true);
        assert_eq!(second.messages[2].content[0]["tool_use_id"], "tu_1");
    }

    #[tokio::test]
    async fn test_llm_failure_stores_insufficient_default() {
        let steps = Arc::new(Mutex::new(Vec::new()));
        let recorded = steps.clone();
        let h = harness(ResearchAgentConfig::default());
        let agent = h.agent.with_step_observer(Arc::new(move |step: &ResearchStep| {
            recorded.lock().push(step.assistant_text.clone());
        }));
        h.llm.push_error(LlmError::Request("connection reset".to_string()));

        let run = agent.enrich(&["Gold".to_string()]).await;
        assert_eq!(h.llm.request_count(), 1);
        assert_eq!(steps.lock()[0], "[error] LLM request failed: connection reset");

        let audit = &run.audit[0];
        assert_eq!(audit.tools_failed, vec!["research_llm"]);
        // resolve + freshness succeeded, llm failed: 2 of 3
        assert_eq!(audit.data_completeness, 67);
        assert_eq!(audit.confidence, 40);
        assert_eq!(run.results[0].risks[0], "Incomplete source coverage (market/news/sentiment tools deferred)");
    }

    #[tokio::test]
    async fn test_max_iterations_bounds_the_loop() {
        let h = harness(ResearchAgentConfig {
            max_iterations: 2,
            ..ResearchAgentConfig::default()
        });
        for i in 0..5 {
            h.llm.push(tool_call(&format!("tu_{}", i), "resolve_entity", json!({ "identifier": "BTC" })));
        }

        let run = h.agent.enrich(&["bitcoin".to_string()]).await;
        assert_eq!(h.llm.request_count(), 2);
        assert_eq!(h.llm.remaining(), 3);
        assert_eq!(run.results[0].confidence, 40);
        assert!(run.results[0].summary.starts_with("Baseline research completed for bitcoin."));
    }

    #[tokio::test]
    async fn test_results_keep_input_order_under_concurrency() {
        let h = harness(ResearchAgentConfig {
            concurrency: 2,
            ..ResearchAgentConfig::default()
        });
        h.metadata.fail(POPCAT);
        for _ in 0..3 {
            h.llm.push_text("not json");
        }

        let identifiers = vec!["bitcoin".to_string(), POPCAT.to_string(), "Gold".to_string()];
        let run = h.agent.enrich(&identifiers).await;

        let audited: Vec<_> = run.audit.iter().map(|a| a.identifier.as_str()).collect();
        assert_eq!(audited, vec!["bitcoin", POPCAT, "Gold"]);
        assert_eq!(run.results.len(), 3);
        assert!(run.audit[1].tools_failed.contains(&"get_token_metadata".to_string()));

        let popcat = h.memory.entities.resolve_identifier(POPCAT).into_entity().unwrap();
        assert_eq!(popcat.name, "Token 7GCihg");
        assert_eq!(popcat.metadata.category, vec!["unverified".to_string()]);
    }

    #[test]
    fn test_parse_findings() {
        let parsed = parse_findings(
            "```json\n{\"confidence\": 140, \"sentiment\": \"euphoric\", \"risks\": [\"a\", 3]}\n```",
            "X",
            None,
        );
        assert!(!parsed.is_degraded());
        let findings = parsed.into_value();
        assert_eq!(findings.confidence, 100);
        assert_eq!(findings.sentiment, Some(Sentiment::Unknown));
        assert_eq!(findings.risks, vec!["a".to_string()]);
        assert!(findings.summary.starts_with("Baseline research completed for X."));

        let degraded = parse_findings("plain prose", "X", Some(&bonk_metadata()));
        assert!(degraded.is_degraded());
        assert_eq!(degraded.value().metadata["tokenMetadata"]["mint"], BONK);
    }
}
