use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use concierge_domain::{IntentKind, QueryIntent};

use crate::ConciergeService;

impl ConciergeService {
	/// One structured-output call. Never errors: malformed output or a
	/// provider failure falls back to a low-confidence general intent and
	/// the pipeline proceeds with a broad search.
	pub(crate) async fn classify_intent(&self, question: &str) -> QueryIntent {
		let messages = build_intent_messages(question);
		let raw = match self.providers.chat.complete(&self.cfg.providers.llm, &messages).await {
			Ok(value) => value,
			Err(err) => {
				warn!(error = %err, "Intent classification failed; using general intent.");
				return QueryIntent::fallback();
			},
		};

		let Some(intent) = parse_intent(raw) else {
			warn!("Intent classification returned invalid JSON; using general intent.");
			return QueryIntent::fallback();
		};

		intent.apply_confidence_floor(self.cfg.intent.confidence_floor)
	}
}

fn build_intent_messages(question: &str) -> Vec<Value> {
	let schema = serde_json::json!({
		"kind": "inventory_complete | specific_unit | feature_inquiry | pricing_inquiry | tourism | general",
		"confidence": 0.0,
		"reasoning": "string",
		"expected_entities": ["string"],
		"avoid_entities": ["string"],
		"metadata_filters": { "category": ["string"] }
	});
	let schema_text = serde_json::to_string_pretty(&schema).unwrap_or_default();
	let system_prompt = "You classify guest questions for a hospitality assistant. \
Output must be valid JSON only and must match the provided schema exactly. \
Kinds: inventory_complete (list every available unit), specific_unit (one named room or \
apartment), feature_inquiry (amenities, appliances, WiFi, services), pricing_inquiry (rates, \
costs, booking), tourism (restaurants, beaches, activities, transport), general (anything \
else or mixed). expected_entities are the kinds of places or services the guest expects; \
avoid_entities are kinds that would be false positives; metadata_filters constrain catalog \
categories when the question clearly implies them. Use high confidence (0.9+) for clear \
questions and low (0.5-0.7) for ambiguous ones. Do not add explanations or extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema_text}\nQuestion:\n{question}"
	);
	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn parse_intent(raw: Value) -> Option<QueryIntent> {
	let kind = IntentKind::parse(raw.get("kind")?.as_str()?)?;
	let confidence = raw.get("confidence").and_then(Value::as_f64).unwrap_or(0.5) as f32;
	let reasoning = raw
		.get("reasoning")
		.and_then(Value::as_str)
		.unwrap_or("No reasoning provided.")
		.to_string();

	Some(QueryIntent {
		kind,
		confidence: confidence.clamp(0.0, 1.0),
		reasoning,
		expected_entities: string_list(raw.get("expected_entities")),
		avoid_entities: string_list(raw.get("avoid_entities")),
		metadata_filters: filter_map(raw.get("metadata_filters")),
	})
}

fn string_list(value: Option<&Value>) -> Vec<String> {
	value
		.and_then(Value::as_array)
		.map(|items| {
			items
				.iter()
				.filter_map(Value::as_str)
				.filter(|item| !item.trim().is_empty())
				.map(str::to_string)
				.collect()
		})
		.unwrap_or_default()
}

fn filter_map(value: Option<&Value>) -> BTreeMap<String, Vec<String>> {
	let mut out = BTreeMap::new();
	let Some(object) = value.and_then(Value::as_object) else {
		return out;
	};

	for (key, entry) in object {
		let values = string_list(Some(entry));
		if !values.is_empty() {
			out.insert(key.clone(), values);
		}
	}

	out
}
