use serde::{Deserialize, Serialize};

/// Semantically distinct rewrites of one question, original first. Order is
/// insertion order and is preserved for deterministic logging and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiQuery {
	pub queries: Vec<String>,
	pub strategy: String,
}

impl MultiQuery {
	/// Baseline shape when expansion fails: the original question alone
	/// still guarantees recall.
	pub fn original_only(question: &str) -> Self {
		Self {
			queries: vec![question.to_string()],
			strategy: "original_only".to_string(),
		}
	}
}

/// Folds model rewrites into the final query sequence: original question at
/// index 0, case-insensitive dedup, capped at `max_queries` total.
pub fn normalize_rewrites(original: &str, rewrites: Vec<String>, max_queries: u32) -> Vec<String> {
	let mut out = Vec::new();
	let mut seen = Vec::new();

	push_query(&mut out, &mut seen, original);
	for rewrite in rewrites {
		if out.len() >= max_queries as usize {
			break;
		}
		push_query(&mut out, &mut seen, &rewrite);
	}

	out
}

fn push_query(out: &mut Vec<String>, seen: &mut Vec<String>, value: &str) {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return;
	}
	let key = trimmed.to_lowercase();
	if seen.contains(&key) {
		return;
	}
	seen.push(key);
	out.push(trimmed.to_string());
}
