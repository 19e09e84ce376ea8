pub mod answer;
pub mod cache;
pub mod curate;
pub mod expand;
pub mod intent;
pub mod retrieve;
pub mod session;
pub mod stores;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use uuid::Uuid;

pub use answer::{AnswerRequest, AnswerResponse};
pub use cache::SemanticCache;
use concierge_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use concierge_domain::{CandidateResult, ConversationSession, DomainId};
use concierge_providers::{chat, embedding};
use concierge_storage::db::Db;
pub use stores::PgStores;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}

impl From<concierge_storage::Error> for ServiceError {
	fn from(err: concierge_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
		dimensions: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait ChatProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>>;
}

/// One similarity-search procedure per content domain, exposed by the
/// external datastore.
pub trait SearchGateway
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		domain: DomainId,
		embedding: &'a [f32],
		match_threshold: f32,
		match_count: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateResult>>>;
}

pub trait SessionStore
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		session_id: Uuid,
	) -> BoxFuture<'a, color_eyre::Result<Option<ConversationSession>>>;
	fn create<'a>(&'a self, session: &'a ConversationSession) -> BoxFuture<'a, color_eyre::Result<()>>;
	fn append_turn<'a>(
		&'a self,
		session_id: Uuid,
		user_text: &'a str,
		assistant_text: &'a str,
		max_stored_turns: u32,
	) -> BoxFuture<'a, color_eyre::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub chat: Arc<dyn ChatProvider>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
		dimensions: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts, dimensions))
	}
}

impl ChatProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(chat::complete(cfg, messages))
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, chat: Arc<dyn ChatProvider>) -> Self {
		Self { embedding, chat }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { embedding: provider.clone(), chat: provider }
	}
}

/// The pipeline. One instance per process; the semantic cache and session
/// store are the only mutable state and both are keyed, so concurrent
/// requests for different keys never contend.
pub struct ConciergeService {
	pub cfg: Config,
	pub providers: Providers,
	pub search: Arc<dyn SearchGateway>,
	pub sessions: Arc<dyn SessionStore>,
	pub cache: Arc<SemanticCache>,
}

impl ConciergeService {
	pub fn new(cfg: Config, db: Arc<Db>) -> Self {
		let cache = Arc::new(SemanticCache::new(&cfg.cache));
		let stores = Arc::new(PgStores::new(db, &cfg));

		Self {
			cfg,
			providers: Providers::default(),
			search: stores.clone(),
			sessions: stores,
			cache,
		}
	}

	pub fn with_components(
		cfg: Config,
		providers: Providers,
		search: Arc<dyn SearchGateway>,
		sessions: Arc<dyn SessionStore>,
		cache: Arc<SemanticCache>,
	) -> Self {
		Self { cfg, providers, search, sessions, cache }
	}
}
