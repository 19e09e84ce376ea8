use std::{collections::HashMap, sync::Mutex};

use time::{Duration, OffsetDateTime};
use tracing::debug;

use concierge_domain::normalize_question;

use crate::answer::AnswerResponse;

/// In-process response cache keyed by semantic phrase-group first, exact
/// normalized hash second. Constructed once at process start and injected
/// into the service; entries are evicted lazily on read and nothing
/// survives a restart.
pub struct SemanticCache {
	enabled: bool,
	ttl: Duration,
	groups: Vec<Group>,
	entries: Mutex<HashMap<String, Entry>>,
}

struct Group {
	name: String,
	phrases: Vec<String>,
}

struct Entry {
	payload: AnswerResponse,
	expires_at: OffsetDateTime,
}

impl SemanticCache {
	pub fn new(cfg: &concierge_config::Cache) -> Self {
		let groups = cfg
			.groups
			.iter()
			.map(|group| Group { name: group.name.clone(), phrases: group.phrases.clone() })
			.collect();

		Self {
			enabled: cfg.enabled,
			ttl: Duration::seconds(cfg.ttl_secs as i64),
			groups,
			entries: Mutex::new(HashMap::new()),
		}
	}

	pub fn enabled(&self) -> bool {
		self.enabled
	}

	/// Paraphrases sharing a configured phrase group collapse onto one key,
	/// so differently-worded repeats of a common question hit one answer.
	pub fn cache_key(&self, question: &str) -> String {
		let normalized = normalize_question(question);

		for group in &self.groups {
			if group.phrases.iter().any(|phrase| normalized.contains(phrase.as_str())) {
				return format!("semantic:{}", group.name);
			}
		}

		format!("exact:{}", blake3::hash(normalized.as_bytes()).to_hex())
	}

	pub fn lookup(&self, question: &str, now: OffsetDateTime) -> Option<AnswerResponse> {
		if !self.enabled {
			return None;
		}

		let key = self.cache_key(question);
		let mut entries = self.entries.lock().expect("cache mutex poisoned");
		match entries.get(&key) {
			Some(entry) if entry.expires_at > now => {
				debug!(cache_key = %key, hit = true, "Response cache hit.");
				Some(entry.payload.clone())
			},
			Some(_) => {
				entries.remove(&key);
				debug!(cache_key = %key, hit = false, "Response cache entry expired.");
				None
			},
			None => {
				debug!(cache_key = %key, hit = false, "Response cache miss.");
				None
			},
		}
	}

	pub fn store(&self, question: &str, payload: AnswerResponse, now: OffsetDateTime) {
		if !self.enabled {
			return;
		}

		let key = self.cache_key(question);
		let entry = Entry { payload, expires_at: now + self.ttl };
		self.entries.lock().expect("cache mutex poisoned").insert(key, entry);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;

	use concierge_domain::{CurationOutput, QueryIntent};

	fn cache(ttl_secs: u64) -> SemanticCache {
		let cfg = concierge_config::Cache {
			enabled: true,
			ttl_secs,
			groups: vec![concierge_config::CacheGroup {
				name: "wifi_access".to_string(),
				phrases: vec!["wifi password".to_string(), "wifi key".to_string()],
			}],
		};

		SemanticCache::new(&cfg)
	}

	fn payload() -> AnswerResponse {
		AnswerResponse {
			curation: CurationOutput::empty(),
			intent: QueryIntent::fallback(),
			session_id: uuid::Uuid::new_v4(),
			performance_metrics: BTreeMap::new(),
		}
	}

	fn now() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_754_000_000).unwrap()
	}

	#[test]
	fn paraphrases_share_a_group_key() {
		let cache = cache(3600);

		let a = cache.cache_key("What is the WiFi password?");
		let b = cache.cache_key("could you tell me the wifi key please");

		assert_eq!(a, "semantic:wifi_access");
		assert_eq!(a, b);
	}

	#[test]
	fn ungrouped_questions_get_distinct_exact_keys() {
		let cache = cache(3600);

		let a = cache.cache_key("best beaches nearby");
		let b = cache.cache_key("late checkout policy");

		assert!(a.starts_with("exact:"));
		assert!(b.starts_with("exact:"));
		assert_ne!(a, b);
		// Whitespace and case differences normalize onto the same key.
		assert_eq!(a, cache.cache_key("  Best   BEACHES nearby "));
	}

	#[test]
	fn lookup_returns_stored_payload_for_paraphrase() {
		let cache = cache(3600);
		cache.store("What is the WiFi password?", payload(), now());

		assert!(cache.lookup("wifi key for my room", now()).is_some());
		assert!(cache.lookup("best beaches nearby", now()).is_none());
	}

	#[test]
	fn expired_entries_are_lazily_evicted() {
		let cache = cache(60);
		cache.store("best beaches nearby", payload(), now());

		let later = now() + Duration::seconds(61);

		assert!(cache.lookup("best beaches nearby", later).is_none());
		// Second lookup confirms the entry was removed, not just skipped.
		assert!(cache.lookup("best beaches nearby", later).is_none());
	}

	#[test]
	fn disabled_cache_never_hits() {
		let cfg = concierge_config::Cache { enabled: false, ttl_secs: 3600, groups: Vec::new() };
		let cache = SemanticCache::new(&cfg);
		cache.store("anything", payload(), now());

		assert!(cache.lookup("anything", now()).is_none());
	}
}
