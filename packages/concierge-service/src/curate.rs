use serde_json::Value;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

use concierge_domain::{CandidateResult, CuratedResult, CurationOutput, QueryIntent, RejectedResult};

use crate::ConciergeService;

pub(crate) struct CurationOutcome {
	pub(crate) output: CurationOutput,
	/// True when the model call happened (counts against llm_calls).
	pub(crate) invoked_model: bool,
	/// True when the similarity fallback replaced the model's judgement.
	pub(crate) fallback_used: bool,
}

impl ConciergeService {
	/// Semantic reranking, distinct from vector similarity: a
	/// high-similarity candidate can be rejected for the wrong category and
	/// a lower one retained. Empty input short-circuits without a model
	/// call; a model failure degrades to the similarity-ordered fallback.
	pub(crate) async fn curate_results(
		&self,
		question: &str,
		intent: &QueryIntent,
		candidates: &[CandidateResult],
		max_context_chunks: u32,
	) -> CurationOutcome {
		if candidates.is_empty() {
			return CurationOutcome {
				output: CurationOutput::empty(),
				invoked_model: false,
				fallback_used: false,
			};
		}

		let messages = build_curation_messages(
			question,
			intent,
			candidates,
			max_context_chunks,
			self.cfg.curation.max_snippet_chars as usize,
		);
		let raw = match self.providers.chat.complete(&self.cfg.providers.llm, &messages).await {
			Ok(value) => value,
			Err(err) => {
				warn!(error = %err, "Curation failed; falling back to similarity order.");
				return CurationOutcome {
					output: CurationOutput::fallback_by_similarity(candidates, max_context_chunks),
					invoked_model: true,
					fallback_used: true,
				};
			},
		};

		match parse_curation(raw, candidates, max_context_chunks) {
			Some(output) => CurationOutcome { output, invoked_model: true, fallback_used: false },
			None => {
				warn!("Curation returned invalid JSON; falling back to similarity order.");
				CurationOutcome {
					output: CurationOutput::fallback_by_similarity(candidates, max_context_chunks),
					invoked_model: true,
					fallback_used: true,
				}
			},
		}
	}
}

fn build_curation_messages(
	question: &str,
	intent: &QueryIntent,
	candidates: &[CandidateResult],
	max_context_chunks: u32,
	max_snippet_chars: usize,
) -> Vec<Value> {
	let schema = serde_json::json!({
		"top_results": [
			{ "index": 1, "score": 0.0, "reasoning": "string", "why_relevant": "string" }
		],
		"rejected": [
			{ "index": 1, "reasoning": "string" }
		]
	});
	let schema_text = serde_json::to_string_pretty(&schema).unwrap_or_default();
	let candidate_list = candidates
		.iter()
		.enumerate()
		.map(|(idx, candidate)| {
			format!(
				"{}. [{}] {} (similarity: {:.3})\n{}",
				idx + 1,
				candidate.domain,
				candidate.identity,
				candidate.similarity,
				truncate_graphemes(&candidate.content, max_snippet_chars),
			)
		})
		.collect::<Vec<_>>()
		.join("\n\n");

	let system_prompt = "You curate retrieval results for a hospitality assistant. \
Output must be valid JSON only and must match the provided schema exactly. \
Select the most relevant candidates for the guest's real intent, ordered best first. \
Judge by intent fit, expected entities, and avoid-entities; similarity is a hint, not the \
verdict. Every selected item needs a short reasoning and a why_relevant explanation; every \
rejected item needs a one-line reason. Indices are 1-based into the candidate list. \
Do not add explanations or extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nConstraints:\n\
- MAX_RESULTS = {max}\n\
- Question: {question}\n\
- Detected intent: {kind} ({reasoning})\n\
- Expected entities: {expected}\n\
- Avoid entities: {avoid}\n\
Candidates ({count}):\n\n{candidates}",
		schema = schema_text,
		max = max_context_chunks,
		kind = intent.kind.as_str(),
		reasoning = intent.reasoning,
		expected = intent.expected_entities.join(", "),
		avoid = intent.avoid_entities.join(", "),
		count = candidates.len(),
		candidates = candidate_list,
	);
	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

/// Maps 1-based model indices back onto candidates. Entries with an
/// out-of-range index or an empty justification are malformed and dropped;
/// `None` only when the payload itself is not the expected shape.
fn parse_curation(
	raw: Value,
	candidates: &[CandidateResult],
	max_context_chunks: u32,
) -> Option<CurationOutput> {
	let top_raw = raw.get("top_results")?.as_array()?;
	let rejected_raw = raw.get("rejected").and_then(Value::as_array);

	let mut top_results = Vec::new();
	for entry in top_raw {
		if top_results.len() >= max_context_chunks as usize {
			break;
		}
		let Some(candidate) = entry
			.get("index")
			.and_then(Value::as_u64)
			.and_then(|index| index.checked_sub(1))
			.and_then(|index| candidates.get(index as usize))
		else {
			continue;
		};
		let reasoning = entry.get("reasoning").and_then(Value::as_str).unwrap_or("").trim();
		let why_relevant =
			entry.get("why_relevant").and_then(Value::as_str).unwrap_or("").trim();
		if reasoning.is_empty() || why_relevant.is_empty() {
			continue;
		}
		let score = entry.get("score").and_then(Value::as_f64).unwrap_or(0.5) as f32;

		top_results.push(CuratedResult {
			result: candidate.clone(),
			score: score.clamp(0.0, 1.0),
			reasoning: reasoning.to_string(),
			why_relevant: why_relevant.to_string(),
		});
	}

	let mut rejected = Vec::new();
	for entry in rejected_raw.into_iter().flatten() {
		let Some(candidate) = entry
			.get("index")
			.and_then(Value::as_u64)
			.and_then(|index| index.checked_sub(1))
			.and_then(|index| candidates.get(index as usize))
		else {
			continue;
		};
		let reasoning =
			entry.get("reasoning").and_then(Value::as_str).unwrap_or("Not specified.").trim();

		rejected.push(RejectedResult {
			name: candidate.identity.clone(),
			reasoning: if reasoning.is_empty() { "Not specified.".to_string() } else {
				reasoning.to_string()
			},
		});
	}

	Some(CurationOutput { top_results, rejected })
}

fn truncate_graphemes(content: &str, max_chars: usize) -> String {
	let mut out: String = content.graphemes(true).take(max_chars).collect();
	if out.len() < content.len() {
		out.push_str("...");
	}
	out
}
