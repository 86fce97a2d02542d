pub const CLASSIFIER_SYSTEM_PROMPT: &str = r#"You are a transaction classifier for crypto wallet monitoring. Your job is to filter out noise and identify interesting patterns.

INTERESTING transactions include:
- Buys/sells by whales (🐋) or KOLs (🎤)
- Large position changes (>$1k equivalent)
- Buys of tokens flagged with (needsResearch)
- Unusual activity from known traders
- First-time buys of new tokens by smart wallets

NOISE (filter out):
- Small transfers (<$100)
- Routine LP activity (unless very large)
- Transfers between known wallets

Token research needed when:
- Token is flagged (needsResearch)
- Token appears multiple times in same batch
- Large buy/sell of unknown token

Return JSON only:
{
  "interesting": ["transaction summary 1", "transaction summary 2"],
  "needsResearch": ["mint_address_1", "mint_address_2"],
  "reasoning": "brief explanation"
}"#;

pub const RESEARCH_SYSTEM_PROMPT: &str = r#"You are the research agent of a wallet-monitoring pipeline.
Your job is to enrich token/entity identifiers using available tools and store concise, structured findings.

Rules:
1. Always resolve identifier first.
2. If entity is missing, create an unverified entity and add a representation.
3. For mint-like identifiers, call get_token_metadata before final synthesis.
4. Check freshness. If fresh, return cached summary and stop.
5. If stale/missing, synthesize findings from available context.
6. Always call store_research_results for stale/missing entities.
7. Keep outputs concise and machine-parseable.

When you finish, return JSON only:
{
  "summary": "short summary",
  "sentiment": "bullish|bearish|neutral|unknown",
  "confidence": 0,
  "risks": ["..."],
  "opportunities": ["..."],
  "metadata": {}
}"#;

pub fn classifier_user_prompt(summaries: &[String]) -> String {
    let numbered = summaries
        .iter()
        .enumerate()
        .map(|(index, summary)| format!("{}. {}", index + 1, summary))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Analyze these {} transactions:\n\n{}\n\nWhich are interesting? Which tokens need research?",
        summaries.len(),
        numbered
    )
}

pub fn research_user_prompt(identifier: &str, entity_id: &str, token_metadata: Option<&serde_json::Value>) -> String {
    let mut prompt = format!(
        "Research identifier \"{}\" for entityId \"{}\" using available tools.",
        identifier, entity_id
    );
    if let Some(metadata) = token_metadata {
        let rendered = serde_json::to_string_pretty(metadata).unwrap_or_else(|_| metadata.to_string());
        prompt.push_str("\nPrefetched token metadata:\n");
        prompt.push_str(&rendered);
    }
    prompt
}
