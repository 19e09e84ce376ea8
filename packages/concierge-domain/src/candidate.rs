use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// An independently searchable content collection with its own identity
/// scheme and similarity-search procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainId {
	Accommodation,
	Tourism,
	Regulatory,
}

impl DomainId {
	pub const ALL: [Self; 3] = [Self::Accommodation, Self::Tourism, Self::Regulatory];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Accommodation => "accommodation",
			Self::Tourism => "tourism",
			Self::Regulatory => "regulatory",
		}
	}
}

impl std::fmt::Display for DomainId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One retrieved item from one domain, before curation. `identity` is the
/// domain-specific dedup key (unit name, source file, or title).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
	pub domain: DomainId,
	pub identity: String,
	pub content: String,
	pub metadata: serde_json::Value,
	pub similarity: f32,
}

/// Collapses candidates that share an identity, keeping the highest
/// similarity seen across query rewrites. Insertion order is irrelevant;
/// callers sort the merged set afterwards.
pub fn dedup_by_identity(candidates: Vec<CandidateResult>) -> Vec<CandidateResult> {
	let mut best: HashMap<String, CandidateResult> = HashMap::new();

	for candidate in candidates {
		match best.get(&candidate.identity) {
			Some(existing) if existing.similarity >= candidate.similarity => {},
			_ => {
				best.insert(candidate.identity.clone(), candidate);
			},
		}
	}

	best.into_values().collect()
}

/// Deterministic merge order: similarity descending, identity ascending on
/// ties. Reproducible regardless of which search call finished first.
pub fn sort_candidates(candidates: &mut [CandidateResult]) {
	candidates.sort_by(|a, b| {
		b.similarity
			.partial_cmp(&a.similarity)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then_with(|| a.identity.cmp(&b.identity))
	});
}

/// Applies the intent's metadata allow-lists to one domain's candidates.
/// Only the keys in `filter_fields` are consulted; a candidate passes when
/// its metadata value for each constrained key intersects the allow-list.
/// Candidates with no value for a constrained key are dropped.
pub fn apply_metadata_filters(
	candidates: Vec<CandidateResult>,
	filters: &BTreeMap<String, Vec<String>>,
	filter_fields: &[String],
) -> Vec<CandidateResult> {
	let active: Vec<(&String, &Vec<String>)> = filter_fields
		.iter()
		.filter_map(|field| filters.get(field).map(|allowed| (field, allowed)))
		.filter(|(_, allowed)| !allowed.is_empty())
		.collect();

	if active.is_empty() {
		return candidates;
	}

	candidates
		.into_iter()
		.filter(|candidate| {
			active.iter().all(|(field, allowed)| {
				metadata_values(&candidate.metadata, field.as_str())
					.iter()
					.any(|value| allowed.iter().any(|choice| choice.eq_ignore_ascii_case(value)))
			})
		})
		.collect()
}

fn metadata_values(metadata: &serde_json::Value, field: &str) -> Vec<String> {
	match metadata.get(field) {
		Some(serde_json::Value::String(value)) => vec![value.clone()],
		Some(serde_json::Value::Array(values)) =>
			values.iter().filter_map(|value| value.as_str().map(str::to_string)).collect(),
		_ => Vec::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn candidate(identity: &str, similarity: f32) -> CandidateResult {
		CandidateResult {
			domain: DomainId::Tourism,
			identity: identity.to_string(),
			content: String::new(),
			metadata: serde_json::json!({}),
			similarity,
		}
	}

	#[test]
	fn dedup_keeps_max_similarity() {
		let merged = dedup_by_identity(vec![
			candidate("Blue Reef Dive", 0.61),
			candidate("Blue Reef Dive", 0.83),
			candidate("Blue Reef Dive", 0.47),
			candidate("Coco Beach Bar", 0.52),
		]);

		assert_eq!(merged.len(), 2);
		let reef = merged.iter().find(|c| c.identity == "Blue Reef Dive").unwrap();
		assert_eq!(reef.similarity, 0.83);
	}

	#[test]
	fn sort_is_deterministic_on_ties() {
		let mut candidates =
			vec![candidate("b", 0.5), candidate("a", 0.5), candidate("c", 0.9)];
		sort_candidates(&mut candidates);

		let identities: Vec<&str> =
			candidates.iter().map(|c| c.identity.as_str()).collect();
		assert_eq!(identities, vec!["c", "a", "b"]);
	}

	#[test]
	fn metadata_filter_matches_string_and_array_values() {
		let mut filters = BTreeMap::new();
		filters.insert("category".to_string(), vec!["Restaurant".to_string()]);
		let fields = vec!["category".to_string()];

		let mut kept = candidate("La Regatta", 0.7);
		kept.metadata = serde_json::json!({ "category": "restaurant" });
		let mut kept_array = candidate("Aqua Beach Club", 0.6);
		kept_array.metadata = serde_json::json!({ "category": ["Bar", "Restaurant"] });
		let mut dropped = candidate("West View", 0.8);
		dropped.metadata = serde_json::json!({ "category": "Activity" });
		let missing = candidate("No Metadata", 0.9);

		let filtered =
			apply_metadata_filters(vec![kept, kept_array, dropped, missing], &filters, &fields);

		let identities: Vec<&str> = filtered.iter().map(|c| c.identity.as_str()).collect();
		assert_eq!(identities, vec!["La Regatta", "Aqua Beach Club"]);
	}

	#[test]
	fn metadata_filter_ignores_unconfigured_fields() {
		let mut filters = BTreeMap::new();
		filters.insert("zone".to_string(), vec!["north".to_string()]);

		let filtered = apply_metadata_filters(
			vec![candidate("Anywhere", 0.5)],
			&filters,
			&["category".to_string()],
		);

		assert_eq!(filtered.len(), 1);
	}
}
