use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub intent: Intent,
	pub expansion: Expansion,
	pub retrieval: Retrieval,
	pub curation: Curation,
	pub session: Session,
	pub cache: Cache,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Intent {
	/// Classifications below this confidence degrade to the general kind.
	pub confidence_floor: f32,
}

#[derive(Debug, Deserialize)]
pub struct Expansion {
	/// Total query count including the original question.
	pub max_queries: u32,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	/// Cap on the merged candidate list handed to curation.
	pub max_candidates: u32,
	/// Overrides the short-circuit that skips the secondary domain once the
	/// primary fills the chunk budget.
	#[serde(default)]
	pub always_include_secondary: bool,
	pub domains: Domains,
}

#[derive(Debug, Deserialize)]
pub struct Domains {
	pub accommodation: DomainConfig,
	pub tourism: DomainConfig,
	pub regulatory: DomainConfig,
}

#[derive(Debug, Deserialize)]
pub struct DomainConfig {
	/// Stored procedure exposed by the datastore for this domain.
	pub procedure: String,
	/// Embedding dimensionality requested for this domain's tier.
	pub dimensions: u32,
	/// 0.0 means no similarity floor; curation filters quality.
	#[serde(default)]
	pub match_threshold: f32,
	/// Entity words that pull this domain into a tier plan.
	#[serde(default)]
	pub vocabulary: Vec<String>,
	/// Metadata keys that intent filters may constrain for this domain.
	#[serde(default)]
	pub filter_fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Curation {
	/// Snippet length per candidate in the curation prompt.
	pub max_snippet_chars: u32,
}

#[derive(Debug, Deserialize)]
pub struct Session {
	/// Oldest turns beyond this count are trimmed on append.
	pub max_stored_turns: u32,
	/// Bounded history window handed to the language model.
	pub context_window_turns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
	pub enabled: bool,
	pub ttl_secs: u64,
	#[serde(default)]
	pub groups: Vec<CacheGroup>,
}

#[derive(Debug, Deserialize)]
pub struct CacheGroup {
	pub name: String,
	pub phrases: Vec<String>,
}
