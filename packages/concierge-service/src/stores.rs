use std::{collections::BTreeMap, sync::Arc};

use color_eyre::{Result, eyre};
use time::OffsetDateTime;
use uuid::Uuid;

use concierge_config::Config;
use concierge_domain::{CandidateResult, ConversationSession, DomainId, Turn, domain_config};
use concierge_storage::{db::Db, models::SessionRow, search, sessions};

use crate::{BoxFuture, SearchGateway, SessionStore};

/// Postgres-backed gateway and session store. The per-domain similarity
/// procedures live in the datastore; this adapter only knows their names.
pub struct PgStores {
	db: Arc<Db>,
	procedures: BTreeMap<DomainId, String>,
}

impl PgStores {
	pub fn new(db: Arc<Db>, cfg: &Config) -> Self {
		let procedures = DomainId::ALL
			.iter()
			.map(|domain| (*domain, domain_config(&cfg.retrieval, *domain).procedure.clone()))
			.collect();

		Self { db, procedures }
	}
}

impl SearchGateway for PgStores {
	fn search<'a>(
		&'a self,
		domain: DomainId,
		embedding: &'a [f32],
		match_threshold: f32,
		match_count: u32,
	) -> BoxFuture<'a, Result<Vec<CandidateResult>>> {
		Box::pin(async move {
			let procedure = self
				.procedures
				.get(&domain)
				.ok_or_else(|| eyre::eyre!("No procedure configured for domain {domain}."))?;
			let rows = search::run_domain_search(
				&self.db.pool,
				procedure,
				embedding,
				match_threshold,
				match_count,
			)
			.await?;

			Ok(rows
				.into_iter()
				.map(|row| CandidateResult {
					domain,
					identity: row.identity,
					content: row.content,
					metadata: row.metadata,
					similarity: row.similarity,
				})
				.collect())
		})
	}
}

impl SessionStore for PgStores {
	fn fetch<'a>(&'a self, session_id: Uuid) -> BoxFuture<'a, Result<Option<ConversationSession>>> {
		Box::pin(async move {
			let Some(row) = sessions::fetch_session(&self.db.pool, session_id).await? else {
				return Ok(None);
			};

			Ok(Some(session_from_row(row)?))
		})
	}

	fn create<'a>(&'a self, session: &'a ConversationSession) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			sessions::insert_session(&self.db.pool, session.session_id, session.created_at)
				.await?;

			Ok(())
		})
	}

	fn append_turn<'a>(
		&'a self,
		session_id: Uuid,
		user_text: &'a str,
		assistant_text: &'a str,
		max_stored_turns: u32,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let Some(row) = sessions::fetch_session(&self.db.pool, session_id).await? else {
				return Err(eyre::eyre!("Unknown session {session_id}."));
			};
			let mut session = session_from_row(row)?;
			let now = OffsetDateTime::now_utc();
			session.append_exchange(user_text, assistant_text, max_stored_turns, now);

			let history = serde_json::to_value(&session.history)?;
			sessions::update_history(&self.db.pool, session_id, &history, now).await?;

			Ok(())
		})
	}
}

fn session_from_row(row: SessionRow) -> Result<ConversationSession> {
	let history: Vec<Turn> = serde_json::from_value(row.history)
		.map_err(|err| eyre::eyre!("Corrupt session history for {}: {err}", row.session_id))?;

	Ok(ConversationSession {
		session_id: row.session_id,
		history,
		created_at: row.created_at,
		last_activity_at: row.last_activity_at,
	})
}
