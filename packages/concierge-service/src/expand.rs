use serde_json::Value;
use tracing::warn;

use concierge_domain::{MultiQuery, QueryIntent, normalize_rewrites};

use crate::ConciergeService;

#[derive(Debug, serde::Deserialize)]
struct ExpansionOutput {
	queries: Vec<String>,
	#[serde(default)]
	strategy: Option<String>,
}

impl ConciergeService {
	/// One call producing paraphrase rewrites biased by the intent's
	/// expected/avoid entities. The original question is always element 0,
	/// so recall never drops below the unexpanded baseline.
	pub(crate) async fn expand_queries(&self, question: &str, intent: &QueryIntent) -> MultiQuery {
		let max_queries = self.cfg.expansion.max_queries;
		let messages = build_expansion_messages(question, intent, max_queries);
		let raw = match self.providers.chat.complete(&self.cfg.providers.llm, &messages).await {
			Ok(value) => value,
			Err(err) => {
				warn!(error = %err, "Query expansion failed; falling back to original query.");
				return MultiQuery::original_only(question);
			},
		};

		let parsed: ExpansionOutput = match serde_json::from_value(raw) {
			Ok(value) => value,
			Err(err) => {
				warn!(error = %err, "Query expansion returned invalid JSON; falling back to original query.");
				return MultiQuery::original_only(question);
			},
		};

		let queries = normalize_rewrites(question, parsed.queries, max_queries);
		if queries.len() < 2 {
			return MultiQuery::original_only(question);
		}

		MultiQuery {
			queries,
			strategy: parsed
				.strategy
				.filter(|s| !s.trim().is_empty())
				.unwrap_or_else(|| "multi_facet".to_string()),
		}
	}
}

fn build_expansion_messages(question: &str, intent: &QueryIntent, max_queries: u32) -> Vec<Value> {
	let schema = serde_json::json!({
		"queries": ["string"],
		"strategy": "string"
	});
	let schema_text = serde_json::to_string_pretty(&schema).unwrap_or_default();
	let system_prompt = "You are a query expansion engine for a hospitality retrieval system. \
Output must be valid JSON only and must match the provided schema exactly. \
Generate short descriptive search phrases (not questions) that rewrite the original query from \
different angles: literal, experiential, and situational. Stay close to the expected entities \
and away from the entities to avoid. Do not add explanations or extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nConstraints:\n\
- MAX_REWRITES = {max}\n\
- Detected intent: {kind} ({reasoning})\n\
- Expected entities: {expected}\n\
- Avoid entities: {avoid}\n\
Original query:\n{question}",
		schema = schema_text,
		max = max_queries.saturating_sub(1),
		kind = intent.kind.as_str(),
		reasoning = intent.reasoning,
		expected = intent.expected_entities.join(", "),
		avoid = intent.avoid_entities.join(", "),
	);
	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}
