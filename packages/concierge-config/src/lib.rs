mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, CacheGroup, Config, Curation, DomainConfig, Domains, EmbeddingProviderConfig, Expansion,
	Intent, LlmProviderConfig, Postgres, Providers, Retrieval, Service, Session, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if !(0.0..=1.0).contains(&cfg.intent.confidence_floor) {
		return Err(Error::Validation {
			message: "intent.confidence_floor must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !(3..=5).contains(&cfg.expansion.max_queries) {
		return Err(Error::Validation {
			message: "expansion.max_queries must be in the range 3-5.".to_string(),
		});
	}
	if cfg.retrieval.max_candidates == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_candidates must be greater than zero.".to_string(),
		});
	}

	for (label, domain) in [
		("accommodation", &cfg.retrieval.domains.accommodation),
		("tourism", &cfg.retrieval.domains.tourism),
		("regulatory", &cfg.retrieval.domains.regulatory),
	] {
		if domain.dimensions == 0 {
			return Err(Error::Validation {
				message: format!("retrieval.domains.{label}.dimensions must be greater than zero."),
			});
		}
		if !(0.0..=1.0).contains(&domain.match_threshold) {
			return Err(Error::Validation {
				message: format!(
					"retrieval.domains.{label}.match_threshold must be in the range 0.0-1.0."
				),
			});
		}
		if !is_sql_identifier(&domain.procedure) {
			return Err(Error::Validation {
				message: format!(
					"retrieval.domains.{label}.procedure must be a plain SQL identifier."
				),
			});
		}
	}

	if cfg.curation.max_snippet_chars == 0 {
		return Err(Error::Validation {
			message: "curation.max_snippet_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.session.max_stored_turns < 2 {
		return Err(Error::Validation {
			message: "session.max_stored_turns must be at least 2.".to_string(),
		});
	}
	if cfg.session.context_window_turns == 0 {
		return Err(Error::Validation {
			message: "session.context_window_turns must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.enabled && cfg.cache.ttl_secs == 0 {
		return Err(Error::Validation {
			message: "cache.ttl_secs must be greater than zero when the cache is enabled."
				.to_string(),
		});
	}

	for group in &cfg.cache.groups {
		if group.name.trim().is_empty() {
			return Err(Error::Validation {
				message: "cache.groups entries must have a non-empty name.".to_string(),
			});
		}
		if group.phrases.iter().all(|phrase| phrase.trim().is_empty()) {
			return Err(Error::Validation {
				message: format!("cache.groups.{} must list at least one phrase.", group.name),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for domain in [
		&mut cfg.retrieval.domains.accommodation,
		&mut cfg.retrieval.domains.tourism,
		&mut cfg.retrieval.domains.regulatory,
	] {
		domain.vocabulary.retain(|word| !word.trim().is_empty());
		for word in &mut domain.vocabulary {
			*word = word.trim().to_lowercase();
		}
	}
	for group in &mut cfg.cache.groups {
		group.phrases.retain(|phrase| !phrase.trim().is_empty());
		for phrase in &mut group.phrases {
			*phrase = phrase.trim().to_lowercase();
		}
	}
}

fn is_sql_identifier(value: &str) -> bool {
	let mut chars = value.chars();
	let Some(first) = chars.next() else {
		return false;
	};
	if !(first.is_ascii_lowercase() || first == '_') {
		return false;
	}
	chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}
