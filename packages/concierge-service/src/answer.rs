use std::{collections::BTreeMap, time::Instant};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use concierge_domain::{CurationOutput, QueryIntent, build_tier_plan};

use crate::{ConciergeService, ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
	pub question: String,
	pub session_id: Option<Uuid>,
	pub max_context_chunks: u32,
}

/// The pipeline's output contract: the curated, justified result set plus
/// the resolved session id. Rendering the natural-language reply is the
/// transport layer's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
	pub curation: CurationOutput,
	pub intent: QueryIntent,
	pub session_id: Uuid,
	pub performance_metrics: BTreeMap<String, i64>,
}

impl ConciergeService {
	/// Single entry point: semantic cache, then the five sequential stages
	/// (intent, tier selection, expansion, retrieval, curation). Only
	/// retrieval fans out internally. Every stage owns its fallback, so a
	/// degraded answer beats a failed request. Dropping the returned future
	/// cancels any in-flight provider and search calls; partial results are
	/// discarded, never returned.
	pub async fn answer(&self, req: AnswerRequest) -> ServiceResult<AnswerResponse> {
		let question = req.question.trim();
		if question.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "question must be non-empty.".to_string(),
			});
		}
		if req.max_context_chunks == 0 {
			return Err(ServiceError::InvalidRequest {
				message: "max_context_chunks must be greater than zero.".to_string(),
			});
		}

		let started = Instant::now();
		let session = self.resolve_session(req.session_id).await;

		if let Some(mut cached) = self.cache.lookup(question, OffsetDateTime::now_utc()) {
			cached.session_id = session.session_id;
			cached.performance_metrics.insert("cache_hit".to_string(), 1);
			cached
				.performance_metrics
				.insert("total_ms".to_string(), started.elapsed().as_millis() as i64);
			info!(session_id = %session.session_id, "Answer served from semantic cache.");

			return Ok(cached);
		}

		let mut metrics = BTreeMap::new();
		let mut llm_calls = 0_i64;

		let stage = Instant::now();
		let intent = self.classify_intent(question).await;
		llm_calls += 1;
		metrics.insert("intent_ms".to_string(), stage.elapsed().as_millis() as i64);

		let plan = build_tier_plan(&self.cfg.retrieval, &intent, req.max_context_chunks);
		tracing::debug!(
			domains = ?plan.domains,
			budget = req.max_context_chunks,
			allocated = plan.total_count(),
			"Tier plan built."
		);

		let stage = Instant::now();
		let multi = self.expand_queries(question, &intent).await;
		llm_calls += 1;
		metrics.insert("expand_ms".to_string(), stage.elapsed().as_millis() as i64);

		let stage = Instant::now();
		let candidates = self.retrieve_candidates(&plan, &multi, &intent).await;
		metrics.insert("retrieve_ms".to_string(), stage.elapsed().as_millis() as i64);
		metrics.insert("candidate_count".to_string(), candidates.len() as i64);

		let stage = Instant::now();
		let outcome =
			self.curate_results(question, &intent, &candidates, req.max_context_chunks).await;
		if outcome.invoked_model {
			llm_calls += 1;
		}
		metrics.insert("curate_ms".to_string(), stage.elapsed().as_millis() as i64);
		metrics.insert("curation_fallback".to_string(), i64::from(outcome.fallback_used));
		metrics.insert("llm_calls".to_string(), llm_calls);
		metrics.insert("cache_hit".to_string(), 0);
		metrics.insert("total_ms".to_string(), started.elapsed().as_millis() as i64);

		info!(
			session_id = %session.session_id,
			intent = intent.kind.as_str(),
			candidates = candidates.len(),
			selected = outcome.output.top_results.len(),
			"Answer pipeline complete."
		);

		let response = AnswerResponse {
			curation: outcome.output,
			intent,
			session_id: session.session_id,
			performance_metrics: metrics,
		};

		self.cache.store(question, response.clone(), OffsetDateTime::now_utc());

		Ok(response)
	}
}
