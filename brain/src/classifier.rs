//! Triage of summary batches.
//!
//! Fails open: any LLM or parse failure returns every input summary as
//! interesting so nothing is dropped on the floor.

use std::sync::Arc;

use entity_memory::ids::is_mint_shaped;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::{strip_code_fence, LlmClient, Message, MessageRequest};
use crate::outcome::Outcome;
use crate::prompts::{classifier_user_prompt, CLASSIFIER_SYSTEM_PROMPT};

pub const LLM_FAILURE_REASON: &str = "LLM failure - defaulted to all interesting";
pub const PARSE_FAILURE_REASON: &str = "Parse error - defaulted to all interesting";
const NEEDS_RESEARCH_MARKER: &str = "(needsResearch)";

static MINT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(mint:([1-9A-HJ-NP-Za-km-z]{32,44})\)").expect("mint marker pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub interesting: Vec<String>,
    pub needs_research: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Classification {
    fn pass_through(summaries: &[String], reason: &str) -> Self {
        Self {
            interesting: summaries.to_vec(),
            needs_research: Vec::new(),
            reasoning: Some(reason.to_string()),
        }
    }
}

pub struct ClassifierBrain {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    temperature: f32,
}

impl ClassifierBrain {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            system_prompt: CLASSIFIER_SYSTEM_PROMPT.to_string(),
            temperature: 0.1,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn classify(&self, summaries: &[String]) -> Outcome<Classification> {
        if summaries.is_empty() {
            return Outcome::Ok(Classification::default());
        }

        let request = MessageRequest::new(
            self.system_prompt.clone(),
            vec![Message::user(classifier_user_prompt(summaries))],
        )
        .with_temperature(self.temperature);

        let text = match self.llm.create_message(request).await {
            Ok(response) if !response.text.is_empty() => response.text,
            Ok(_) => {
                error!("❌ Classifier returned an empty response, passing batch through");
                return Outcome::degraded(
                    Classification::pass_through(summaries, LLM_FAILURE_REASON),
                    LLM_FAILURE_REASON,
                );
            }
            Err(e) => {
                error!("❌ Classifier call failed, passing batch through: {}", e);
                return Outcome::degraded(
                    Classification::pass_through(summaries, LLM_FAILURE_REASON),
                    LLM_FAILURE_REASON,
                );
            }
        };

        match parse_classification(&text, summaries) {
            Some(classification) => {
                debug!(
                    "🧠 {} interesting, {} need research",
                    classification.interesting.len(),
                    classification.needs_research.len()
                );
                Outcome::Ok(classification)
            }
            None => {
                error!("❌ Classifier response did not parse, passing batch through. Raw: {}", text);
                Outcome::degraded(
                    Classification::pass_through(summaries, PARSE_FAILURE_REASON),
                    PARSE_FAILURE_REASON,
                )
            }
        }
    }
}

fn string_items(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect()
    })
}

pub fn parse_classification(text: &str, summaries: &[String]) -> Option<Classification> {
    let parsed: Value = serde_json::from_str(strip_code_fence(text)).ok()?;
    let interesting = string_items(parsed.get("interesting")?)?;
    let signals = string_items(parsed.get("needsResearch")?)?;

    Some(Classification {
        interesting: interesting
            .into_iter()
            .filter(|summary| summaries.contains(summary))
            .collect(),
        needs_research: extract_mints(&signals, summaries),
        reasoning: parsed.get("reasoning").and_then(Value::as_str).map(String::from),
    })
}

pub fn mint_from_summary(summary: &str) -> Option<&str> {
    MINT_MARKER
        .captures(summary)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Research targets from the model's signals plus every summary carrying
/// the needs-research marker. Insertion ordered, no duplicates.
pub fn extract_mints(signals: &[String], summaries: &[String]) -> Vec<String> {
    let mut mints: Vec<String> = Vec::new();
    let mut add = |mint: &str| {
        if !mints.iter().any(|existing| existing == mint) {
            mints.push(mint.to_string());
        }
    };

    for signal in signals {
        if is_mint_shaped(signal) {
            add(signal);
        }
        if signal.is_empty() {
            continue;
        }
        for summary in summaries.iter().filter(|summary| summary.contains(signal.as_str())) {
            if let Some(mint) = mint_from_summary(summary) {
                add(mint);
            }
        }
    }

    for summary in summaries.iter().filter(|summary| summary.contains(NEEDS_RESEARCH_MARKER)) {
        if let Some(mint) = mint_from_summary(summary) {
            add(mint);
        }
    }

    mints
}
